//! Feed assembly: the four projections of the post table, each counted,
//! paginated, and joined with author/group display fields.

use std::num::NonZeroU32;
use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{Page, PageInfo, Paginator};
use crate::application::repos::{
    FeedScope, GroupsRepo, PostFeedItem, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{GroupRecord, UserRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("no group with slug {slug:?}")]
    UnknownGroup { slug: String },

    #[error("no user named {username:?}")]
    UnknownUser { username: String },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A group feed page together with the group it belongs to.
#[derive(Debug)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: Page<PostFeedItem>,
}

/// A profile feed page together with the profile owner and their lifetime
/// post count.
#[derive(Debug)]
pub struct ProfileFeed {
    pub author: UserRecord,
    pub post_count: u64,
    pub page: Page<PostFeedItem>,
}

pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    page_size: NonZeroU32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        page_size: NonZeroU32,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            page_size,
        }
    }

    pub async fn global(&self, page: u32) -> Result<Page<PostFeedItem>, FeedError> {
        self.load(FeedScope::Global, page).await
    }

    pub async fn group(&self, slug: &str, page: u32) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| FeedError::UnknownGroup {
                slug: slug.to_string(),
            })?;
        let page = self.load(FeedScope::Group(group.id), page).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn profile(&self, username: &str, page: u32) -> Result<ProfileFeed, FeedError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| FeedError::UnknownUser {
                username: username.to_string(),
            })?;
        let page = self.load(FeedScope::Author(author.id), page).await?;
        Ok(ProfileFeed {
            post_count: page.info.total_items,
            author,
            page,
        })
    }

    /// Posts by every author the viewer follows. An empty follow set is an
    /// empty feed, not an error.
    pub async fn following(
        &self,
        viewer_id: uuid::Uuid,
        page: u32,
    ) -> Result<Page<PostFeedItem>, FeedError> {
        self.load(FeedScope::FollowedBy(viewer_id), page).await
    }

    async fn load(&self, scope: FeedScope, requested: u32) -> Result<Page<PostFeedItem>, FeedError> {
        let total = self.posts.count_feed(scope).await?;
        let info: PageInfo = Paginator::new(self.page_size, total).page(requested);
        let items = self.posts.list_feed(scope, info.offset, info.limit).await?;
        Ok(Page { items, info })
    }
}
