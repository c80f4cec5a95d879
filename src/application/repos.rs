//! Repository traits decoupling services from Postgres. The production
//! implementations live in `infra::db`; tests substitute in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("duplicate value for constraint {constraint}")]
    Duplicate { constraint: String },

    #[error("record not found")]
    NotFound,

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("integrity violation: {message}")]
    Integrity { message: String },

    #[error("statement timed out")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        RepoError::Persistence(err.to_string())
    }
}

/// Which slice of the post table a feed query covers. Ids are resolved
/// before the query is built, so unknown slugs and usernames never reach
/// the database layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    Group(Uuid),
    Author(Uuid),
    FollowedBy(Uuid),
}

/// A post joined with the display fields every feed needs.
#[derive(Debug, Clone)]
pub struct PostFeedItem {
    pub post: PostRecord,
    pub author_username: String,
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone)]
pub struct GroupRef {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: CommentRecord,
    pub author_username: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub password_digest: String,
    pub password_salt: String,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub slug: String,
    pub title: String,
    pub description: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// One page of a feed, ordered `created_at DESC, id DESC`.
    async fn list_feed(
        &self,
        scope: FeedScope,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostFeedItem>, RepoError>;

    async fn count_feed(&self, scope: FeedScope) -> Result<u64, RepoError>;

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<PostFeedItem>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError>;

    /// Comments for a post, oldest first.
    async fn list_comments_for_post(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Returns true when a new edge was created.
    async fn insert_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Returns true when an edge was removed.
    async fn remove_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    async fn follow_exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
