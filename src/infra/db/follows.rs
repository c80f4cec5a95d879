use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError};

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[async_trait]
impl FollowsRepo for PostgresRepositories {
    async fn insert_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        // The pair is the primary key; a repeated follow is a no-op.
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, author_id, created_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (follower_id, author_id) DO NOTHING",
        )
        .bind(follower_id)
        .bind(author_id)
        .bind(OffsetDateTime::now_utc())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "DELETE FROM follows WHERE follower_id = $1 AND author_id = $2",
        )
        .bind(follower_id)
        .bind(author_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND author_id = $2)",
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(exists)
    }
}
