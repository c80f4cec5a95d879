//! The follow edge set. Following is idempotent, self-follow is a silent
//! no-op, and unfollowing an edge that does not exist succeeds quietly.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("no user named {username:?}")]
    UnknownUser { username: String },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    pub async fn follow(
        &self,
        viewer_id: Uuid,
        author_username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let author = self.resolve(author_username).await?;
        if author == viewer_id {
            return Ok(FollowOutcome::SelfFollow);
        }
        let created = self.follows.insert_follow(viewer_id, author).await?;
        Ok(if created {
            FollowOutcome::Created
        } else {
            FollowOutcome::AlreadyFollowing
        })
    }

    pub async fn unfollow(
        &self,
        viewer_id: Uuid,
        author_username: &str,
    ) -> Result<UnfollowOutcome, FollowError> {
        let author = self.resolve(author_username).await?;
        let removed = self.follows.remove_follow(viewer_id, author).await?;
        Ok(if removed {
            UnfollowOutcome::Removed
        } else {
            UnfollowOutcome::NotFollowing
        })
    }

    pub async fn is_following(
        &self,
        viewer_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, RepoError> {
        self.follows.follow_exists(viewer_id, author_id).await
    }

    async fn resolve(&self, username: &str) -> Result<Uuid, FollowError> {
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| FollowError::UnknownUser {
                username: username.to_string(),
            })?;
        Ok(user.id)
    }
}
