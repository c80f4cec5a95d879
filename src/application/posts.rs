//! Post and comment writes plus the detail view assembly.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::forms::{
    FieldErrors, PostInput, validate_comment_input, validate_post_input,
};
use crate::application::repos::{
    CommentWithAuthor, CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo,
    PostFeedItem, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, PostRecord};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,

    /// The viewer is not the author. Handlers translate this into a
    /// redirect to the post detail page, never an error status.
    #[error("only the author may edit a post")]
    NotAuthor,

    #[error("no group with slug {slug:?}")]
    UnknownGroup { slug: String },

    #[error("invalid form input")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Everything the detail page shows for one post.
pub struct PostDetail {
    pub item: PostFeedItem,
    pub comments: Vec<CommentWithAuthor>,
}

pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    writes: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writes: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            posts,
            writes,
            comments,
            groups,
        }
    }

    pub async fn detail(&self, post_id: Uuid) -> Result<PostDetail, PostError> {
        let item = self
            .posts
            .find_post_by_id(post_id)
            .await?
            .ok_or(PostError::NotFound)?;
        let comments = self.comments.list_comments_for_post(post_id).await?;
        Ok(PostDetail { item, comments })
    }

    pub async fn create(&self, author_id: Uuid, input: PostInput) -> Result<PostRecord, PostError> {
        let input = input.normalized();
        validate_post_input(&input).map_err(PostError::Invalid)?;
        let group_id = self.resolve_group(input.group.as_deref()).await?;
        let record = self
            .writes
            .create_post(CreatePostParams {
                author_id,
                group_id,
                text: input.text,
                image_url: input.image_url,
            })
            .await?;
        Ok(record)
    }

    /// Author-only. The author cannot change; only text, group and image.
    pub async fn edit(
        &self,
        viewer_id: Uuid,
        post_id: Uuid,
        input: PostInput,
    ) -> Result<PostRecord, PostError> {
        let existing = self.authored_post(viewer_id, post_id).await?;
        let input = input.normalized();
        validate_post_input(&input).map_err(PostError::Invalid)?;
        let group_id = self.resolve_group(input.group.as_deref()).await?;
        let record = self
            .writes
            .update_post(UpdatePostParams {
                id: existing.post.id,
                group_id,
                text: input.text,
                image_url: input.image_url,
            })
            .await?;
        Ok(record)
    }

    /// Loads a post and checks the viewer owns it.
    pub async fn authored_post(
        &self,
        viewer_id: Uuid,
        post_id: Uuid,
    ) -> Result<PostFeedItem, PostError> {
        let item = self
            .posts
            .find_post_by_id(post_id)
            .await?
            .ok_or(PostError::NotFound)?;
        if item.post.author_id != viewer_id {
            return Err(PostError::NotAuthor);
        }
        Ok(item)
    }

    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        text: &str,
    ) -> Result<CommentRecord, PostError> {
        validate_comment_input(text).map_err(PostError::Invalid)?;
        if self.posts.find_post_by_id(post_id).await?.is_none() {
            return Err(PostError::NotFound);
        }
        let record = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id,
                text: text.trim().to_string(),
            })
            .await?;
        Ok(record)
    }

    async fn resolve_group(&self, slug: Option<&str>) -> Result<Option<Uuid>, PostError> {
        match slug {
            None => Ok(None),
            Some(slug) => {
                let group = self.groups.find_group_by_slug(slug).await?.ok_or_else(|| {
                    PostError::UnknownGroup {
                        slug: slug.to_string(),
                    }
                })?;
                Ok(Some(group.id))
            }
        }
    }
}
