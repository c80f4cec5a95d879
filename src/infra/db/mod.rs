//! Postgres-backed repositories. One pool wrapper implements every
//! repository trait; the trait impls live in per-aggregate modules.

mod comments;
mod follows;
mod groups;
mod posts;
mod users;
pub mod util;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::application::repos::{HealthRepo, RepoError};
use crate::config::DatabaseSettings;
use crate::infra::error::InfraError;

use util::map_sqlx_error;

pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, InfraError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn run_migrations(&self) -> Result<(), InfraError> {
        sqlx::migrate!("./migrations").run(self.pool()).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
