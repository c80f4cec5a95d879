use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::forms::{FieldErrors, PostInput};
use crate::application::pagination::PageInfo;
use crate::application::repos::{CommentWithAuthor, PostFeedItem};
use crate::domain::entities::GroupRecord;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        HttpError::from_error(
            err.source,
            StatusCode::INTERNAL_SERVER_ERROR,
            err.public_message,
            &err.error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|error| {
        TemplateRenderError {
            source: "presentation::views::render_template",
            public_message: "Template rendering failed",
            error,
        }
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(viewer: Option<ViewerView>) -> Response {
    let view = LayoutContext::new(viewer, ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// The signed-in user, as the layout chrome shows them.
#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub viewer: Option<ViewerView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(viewer: Option<ViewerView>, content: T) -> Self {
        Self { viewer, content }
    }
}

#[derive(Clone)]
pub struct GroupBadge {
    pub slug: String,
    pub title: String,
}

#[derive(Clone)]
pub struct PostCardView {
    pub id: String,
    pub text: String,
    pub author_username: String,
    pub group: Option<GroupBadge>,
    pub image_url: Option<String>,
    pub published: String,
}

impl From<&PostFeedItem> for PostCardView {
    fn from(item: &PostFeedItem) -> Self {
        PostCardView {
            id: item.post.id.to_string(),
            text: item.post.text.clone(),
            author_username: item.author_username.clone(),
            group: item.group.as_ref().map(|g| GroupBadge {
                slug: g.slug.clone(),
                title: g.title.clone(),
            }),
            image_url: item.post.image_url.clone(),
            published: format_published(item.post.created_at),
        }
    }
}

pub fn build_post_cards(items: &[PostFeedItem]) -> Vec<PostCardView> {
    items.iter().map(PostCardView::from).collect()
}

/// Pagination controls for one feed page. `base_path` is the feed URL the
/// page links append their `?page=` query to.
#[derive(Clone)]
pub struct PageNav {
    pub number: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous: u32,
    pub next: u32,
    pub base_path: String,
}

impl PageNav {
    pub fn new(info: PageInfo, base_path: impl Into<String>) -> Self {
        Self {
            number: info.number,
            total_pages: info.total_pages,
            has_previous: info.has_previous,
            has_next: info.has_next,
            previous: info.number.saturating_sub(1).max(1),
            next: info.number.saturating_add(1).min(info.total_pages),
            base_path: base_path.into(),
        }
    }
}

pub struct FeedContext {
    pub posts: Vec<PostCardView>,
    pub nav: PageNav,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<FeedContext>,
}

pub struct GroupContext {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub posts: Vec<PostCardView>,
    pub nav: PageNav,
}

impl GroupContext {
    pub fn new(group: &GroupRecord, posts: Vec<PostCardView>, nav: PageNav) -> Self {
        Self {
            title: group.title.clone(),
            description: group.description.clone(),
            slug: group.slug.clone(),
            posts,
            nav,
        }
    }
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub view: LayoutContext<GroupContext>,
}

pub struct ProfileContext {
    pub username: String,
    pub post_count: u64,
    /// Whether the viewer already follows this author.
    pub is_following: bool,
    /// Follow controls only show for signed-in viewers on other profiles.
    pub show_follow_controls: bool,
    pub posts: Vec<PostCardView>,
    pub nav: PageNav,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ProfileContext>,
}

pub struct CommentView {
    pub author_username: String,
    pub text: String,
    pub published: String,
}

impl From<&CommentWithAuthor> for CommentView {
    fn from(entry: &CommentWithAuthor) -> Self {
        CommentView {
            author_username: entry.author_username.clone(),
            text: entry.comment.text.clone(),
            published: format_published(entry.comment.created_at),
        }
    }
}

pub struct PostDetailContext {
    pub post: PostCardView,
    pub comments: Vec<CommentView>,
    pub can_edit: bool,
    pub can_comment: bool,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct GroupOptionView {
    pub slug: String,
    pub title: String,
    pub selected: bool,
}

pub struct FieldErrorView {
    pub field: String,
    pub message: String,
}

pub struct PostFormContext {
    pub heading: String,
    pub action: String,
    pub text: String,
    pub image_url: String,
    pub groups: Vec<GroupOptionView>,
    pub errors: Vec<FieldErrorView>,
}

impl PostFormContext {
    pub fn new(
        heading: impl Into<String>,
        action: impl Into<String>,
        input: &PostInput,
        groups: &[GroupRecord],
        errors: &FieldErrors,
    ) -> Self {
        let selected = input.group.as_deref();
        Self {
            heading: heading.into(),
            action: action.into(),
            text: input.text.clone(),
            image_url: input.image_url.clone().unwrap_or_default(),
            groups: groups
                .iter()
                .map(|g| GroupOptionView {
                    slug: g.slug.clone(),
                    title: g.title.clone(),
                    selected: selected == Some(g.slug.as_str()),
                })
                .collect(),
            errors: build_field_errors(errors),
        }
    }
}

pub fn build_field_errors(errors: &FieldErrors) -> Vec<FieldErrorView> {
    errors
        .iter()
        .map(|e| FieldErrorView {
            field: e.field.to_string(),
            message: e.message.clone(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormContext>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub view: LayoutContext<FeedContext>,
}

pub struct AuthFormContext {
    pub username: String,
    pub errors: Vec<FieldErrorView>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<AuthFormContext>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub view: LayoutContext<AuthFormContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

const PUBLISHED_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[day padding:none] [month repr:short] [year], [hour]:[minute]");

pub fn format_published(at: OffsetDateTime) -> String {
    at.format(&PUBLISHED_FORMAT).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    use crate::application::pagination::Paginator;

    #[test]
    fn page_nav_clamps_neighbours() {
        let paginator = Paginator::new(NonZeroU32::new(10).unwrap(), 25);
        let first = PageNav::new(paginator.page(1), "/");
        assert_eq!(first.previous, 1);
        assert_eq!(first.next, 2);

        let last = PageNav::new(paginator.page(3), "/");
        assert_eq!(last.previous, 2);
        assert_eq!(last.next, 3);
    }

    #[test]
    fn published_format_is_human_readable() {
        let at = time::macros::datetime!(2024-03-05 09:07 UTC);
        assert_eq!(format_published(at), "5 Mar 2024, 09:07");
    }
}
