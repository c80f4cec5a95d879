use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, FeedScope, GroupRef, PostFeedItem, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::util::{count_to_u64, map_sqlx_error};

#[derive(FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    group_id: Option<Uuid>,
    text: String,
    image_url: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        PostRecord {
            id: row.id,
            author_id: row.author_id,
            group_id: row.group_id,
            text: row.text,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

/// A post joined with its author's username and group badge fields.
#[derive(FromRow)]
struct PostFeedRow {
    id: Uuid,
    author_id: Uuid,
    group_id: Option<Uuid>,
    text: String,
    image_url: Option<String>,
    created_at: OffsetDateTime,
    author_username: String,
    group_slug: Option<String>,
    group_title: Option<String>,
}

impl From<PostFeedRow> for PostFeedItem {
    fn from(row: PostFeedRow) -> Self {
        let group = match (row.group_slug, row.group_title) {
            (Some(slug), Some(title)) => Some(GroupRef { slug, title }),
            _ => None,
        };
        PostFeedItem {
            post: PostRecord {
                id: row.id,
                author_id: row.author_id,
                group_id: row.group_id,
                text: row.text,
                image_url: row.image_url,
                created_at: row.created_at,
            },
            author_username: row.author_username,
            group,
        }
    }
}

const POST_COLUMNS: &str = "id, author_id, group_id, text, image_url, created_at";

fn feed_query_base() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(
        "SELECT p.id, p.author_id, p.group_id, p.text, p.image_url, p.created_at, \
                u.username AS author_username, g.slug AS group_slug, g.title AS group_title \
           FROM posts p \
           JOIN users u ON u.id = p.author_id \
           LEFT JOIN groups g ON g.id = p.group_id",
    )
}

fn push_scope(builder: &mut QueryBuilder<'static, Postgres>, scope: FeedScope) {
    match scope {
        FeedScope::Global => {}
        FeedScope::Group(group_id) => {
            builder.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        FeedScope::Author(author_id) => {
            builder.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        FeedScope::FollowedBy(viewer_id) => {
            builder
                .push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE follower_id = ")
                .push_bind(viewer_id)
                .push(")");
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_feed(
        &self,
        scope: FeedScope,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostFeedItem>, RepoError> {
        let mut builder = feed_query_base();
        push_scope(&mut builder, scope);
        builder
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows: Vec<PostFeedRow> = builder
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PostFeedItem::from).collect())
    }

    async fn count_feed(&self, scope: FeedScope) -> Result<u64, RepoError> {
        let mut builder: QueryBuilder<'static, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        push_scope(&mut builder, scope);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(count_to_u64(count))
    }

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<PostFeedItem>, RepoError> {
        let mut builder = feed_query_base();
        builder.push(" WHERE p.id = ").push_bind(id);

        let row: Option<PostFeedRow> = builder
            .build_query_as()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PostFeedItem::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            author_id,
            group_id,
            text,
            image_url,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "INSERT INTO posts (id, author_id, group_id, text, image_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(author_id)
        .bind(group_id)
        .bind(text)
        .bind(image_url)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            group_id,
            text,
            image_url,
        } = params;

        let row = sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts \
                SET group_id = $2, text = $3, image_url = $4 \
              WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(group_id)
        .bind(text)
        .bind(image_url)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }
}
