use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::GroupRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(FromRow)]
struct GroupRow {
    id: Uuid,
    slug: String,
    title: String,
    description: String,
    created_at: OffsetDateTime,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        GroupRecord {
            id: row.id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

const GROUP_COLUMNS: &str = "id, slug, title, description, created_at";

#[async_trait]
impl GroupsRepo for PostgresRepositories {
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(GroupRecord::from))
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups ORDER BY title ASC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(GroupRecord::from).collect())
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let CreateGroupParams {
            slug,
            title,
            description,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "INSERT INTO groups (id, slug, title, description, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(id)
        .bind(slug)
        .bind(title)
        .bind(description)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(GroupRecord::from(row))
    }
}
