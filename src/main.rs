use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use foglio::application::accounts::AccountService;
use foglio::application::error::AppError;
use foglio::application::feed::FeedService;
use foglio::application::follows::FollowService;
use foglio::application::posts::PostService;
use foglio::application::repos::{
    CommentsRepo, CreateGroupParams, FollowsRepo, GroupsRepo, HealthRepo, PostsRepo,
    PostsWriteRepo, UsersRepo,
};
use foglio::cache::{PageStore, SystemClock};
use foglio::config::{
    Cli, Command, CreateGroupArgs, LoadError, ServeArgs, Settings, load, load_raw,
};
use foglio::domain::slug::{derive_slug, validate_slug};
use foglio::infra::db::PostgresRepositories;
use foglio::infra::error::InfraError;
use foglio::infra::http::{HttpState, build_router};
use foglio::infra::telemetry;
use axum_extra::extract::cookie::Key;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("foglio failed: {}", err.chain().join(": "));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::CreateGroup(args)) => create_group(cli.config_file.as_ref(), args).await,
        Some(Command::Serve(args)) => serve(cli.config_file.as_ref(), args).await,
        None => serve(cli.config_file.as_ref(), ServeArgs::default()).await,
    }
}

async fn serve(config_file: Option<&PathBuf>, args: ServeArgs) -> Result<(), AppError> {
    let settings = load(config_file, &args)?;
    telemetry::init(&settings.logging)?;

    let db = Arc::new(PostgresRepositories::connect(&settings.database).await?);
    db.run_migrations().await?;
    info!(target = "foglio::startup", "migrations applied");

    let state = build_application_context(db, &settings);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.listen)
        .await
        .map_err(InfraError::Io)?;
    info!(target = "foglio::startup", addr = %settings.listen, "listening");
    axum::serve(listener, router).await.map_err(InfraError::Io)?;
    Ok(())
}

fn build_application_context(db: Arc<PostgresRepositories>, settings: &Settings) -> HttpState {
    let users: Arc<dyn UsersRepo> = db.clone();
    let groups: Arc<dyn GroupsRepo> = db.clone();
    let posts_read: Arc<dyn PostsRepo> = db.clone();
    let posts_write: Arc<dyn PostsWriteRepo> = db.clone();
    let comments: Arc<dyn CommentsRepo> = db.clone();
    let follows_repo: Arc<dyn FollowsRepo> = db.clone();
    let health: Arc<dyn HealthRepo> = db;

    let feed = Arc::new(FeedService::new(
        posts_read.clone(),
        groups.clone(),
        users.clone(),
        settings.page_size,
    ));
    let posts = Arc::new(PostService::new(
        posts_read,
        posts_write,
        comments,
        groups.clone(),
    ));
    let follows = Arc::new(FollowService::new(users.clone(), follows_repo));
    let accounts = Arc::new(AccountService::new(users));

    let page_cache = settings
        .cache
        .enabled
        .then(|| Arc::new(PageStore::new(&settings.cache, Arc::new(SystemClock))));

    HttpState {
        feed,
        posts,
        follows,
        accounts,
        groups,
        health,
        page_cache,
        session_key: Key::derive_from(settings.session_secret.as_bytes()),
    }
}

async fn create_group(
    config_file: Option<&PathBuf>,
    args: CreateGroupArgs,
) -> Result<(), AppError> {
    let mut raw = load_raw(config_file)?;
    if let Some(url) = &args.database_url {
        raw.database.url = url.clone();
    }
    if raw.database.url.is_empty() {
        return Err(LoadError::invalid("database.url", "must be set").into());
    }
    telemetry::init(&foglio::config::LoggingSettings {
        filter: raw.logging.filter.clone(),
        json: raw.logging.json,
    })?;

    let db = PostgresRepositories::connect(&foglio::config::DatabaseSettings {
        url: raw.database.url.clone(),
        max_connections: raw.database.max_connections.max(1),
    })
    .await?;
    db.run_migrations().await?;

    let slug = match args.slug {
        Some(slug) => {
            validate_slug(&slug)?;
            slug
        }
        None => derive_slug(&args.title)?,
    };
    let group = db
        .create_group(CreateGroupParams {
            slug,
            title: args.title,
            description: args.description,
        })
        .await?;
    info!(target = "foglio::startup", slug = %group.slug, "group created");
    Ok(())
}
