use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CommentWithAuthor, CommentsRepo, CreateCommentParams, RepoError,
};
use crate::domain::entities::CommentRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        CommentRecord {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct CommentWithAuthorRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: OffsetDateTime,
    author_username: String,
}

impl From<CommentWithAuthorRow> for CommentWithAuthor {
    fn from(row: CommentWithAuthorRow) -> Self {
        CommentWithAuthor {
            comment: CommentRecord {
                id: row.id,
                post_id: row.post_id,
                author_id: row.author_id,
                text: row.text,
                created_at: row.created_at,
            },
            author_username: row.author_username,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let CreateCommentParams {
            post_id,
            author_id,
            text,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, CommentRow>(
            "INSERT INTO comments (id, post_id, author_id, text, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, post_id, author_id, text, created_at",
        )
        .bind(id)
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(CommentRecord::from(row))
    }

    async fn list_comments_for_post(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = sqlx::query_as::<_, CommentWithAuthorRow>(
            "SELECT c.id, c.post_id, c.author_id, c.text, c.created_at, \
                    u.username AS author_username \
               FROM comments c \
               JOIN users u ON u.id = c.author_id \
              WHERE c.post_id = $1 \
              ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }
}
