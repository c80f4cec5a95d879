//! Layered configuration: `config/default.toml`, then `foglio.toml` in the
//! working directory, then `FOGLIO__`-prefixed environment variables, then
//! CLI flags. Raw values deserialize loosely and validate into [`Settings`].

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::CacheConfig;

pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
pub const LOCAL_CONFIG_FILE: &str = "foglio";
const DEFAULT_PAGE_SIZE: u32 = 10;
const MIN_SESSION_SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read configuration")]
    Source(#[from] config::ConfigError),

    #[error("invalid configuration: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl LoadError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        LoadError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "foglio", version, about)]
pub struct Cli {
    /// Extra configuration file layered over the defaults.
    #[arg(long = "config", env = "FOGLIO_CONFIG", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (the default).
    Serve(ServeArgs),
    /// Create a topic group.
    CreateGroup(CreateGroupArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen address, e.g. 127.0.0.1:8080.
    #[arg(long)]
    pub listen: Option<String>,

    /// Postgres connection string.
    #[arg(long, env = "FOGLIO_DATABASE_URL")]
    pub database_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateGroupArgs {
    /// Slug for the group URL; derived from the title when omitted.
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Postgres connection string.
    #[arg(long, env = "FOGLIO_DATABASE_URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub server: RawServerSettings,
    pub logging: RawLoggingSettings,
    pub database: RawDatabaseSettings,
    pub feed: RawFeedSettings,
    pub cache: CacheConfig,
    pub session: RawSessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawServerSettings {
    pub listen: String,
}

impl Default for RawServerSettings {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawLoggingSettings {
    pub filter: String,
    pub json: bool,
}

impl Default for RawLoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,foglio=debug".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawDatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for RawDatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawFeedSettings {
    pub page_size: u32,
}

impl Default for RawFeedSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSessionSettings {
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub listen: SocketAddr,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub page_size: NonZeroU32,
    pub cache: CacheConfig,
    pub session_secret: String,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Settings {
    pub fn validate(raw: RawSettings) -> Result<Self, LoadError> {
        let listen = raw
            .server
            .listen
            .parse::<SocketAddr>()
            .map_err(|err| LoadError::invalid("server.listen", err.to_string()))?;

        if raw.database.url.is_empty() {
            return Err(LoadError::invalid("database.url", "must be set"));
        }
        if raw.database.max_connections == 0 {
            return Err(LoadError::invalid("database.max_connections", "must be > 0"));
        }

        let page_size = NonZeroU32::new(raw.feed.page_size)
            .ok_or_else(|| LoadError::invalid("feed.page_size", "must be > 0"))?;

        if raw.session.secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(LoadError::invalid(
                "session.secret",
                format!("must be at least {MIN_SESSION_SECRET_BYTES} bytes"),
            ));
        }

        Ok(Settings {
            listen,
            logging: LoggingSettings {
                filter: raw.logging.filter,
                json: raw.logging.json,
            },
            database: DatabaseSettings {
                url: raw.database.url,
                max_connections: raw.database.max_connections,
            },
            page_size,
            cache: raw.cache,
            session_secret: raw.session.secret,
        })
    }
}

/// Reads the file/env layers into raw settings, without CLI overrides.
pub fn load_raw(extra_file: Option<&PathBuf>) -> Result<RawSettings, LoadError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
        .add_source(config::File::with_name(LOCAL_CONFIG_FILE).required(false));
    if let Some(path) = extra_file {
        builder = builder.add_source(config::File::from(path.clone()));
    }
    let raw = builder
        .add_source(
            config::Environment::with_prefix("FOGLIO")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?
        .try_deserialize::<RawSettings>()?;
    Ok(raw)
}

/// Full load for `serve`: layers CLI flags over the file/env settings.
pub fn load(extra_file: Option<&PathBuf>, args: &ServeArgs) -> Result<Settings, LoadError> {
    let mut raw = load_raw(extra_file)?;
    if let Some(listen) = &args.listen {
        raw.server.listen = listen.clone();
    }
    if let Some(url) = &args.database_url {
        raw.database.url = url.clone();
    }
    Settings::validate(raw)
}
