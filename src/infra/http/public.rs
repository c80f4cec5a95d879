//! Handlers for the unauthenticated surface: the four feeds' public
//! projections, post detail, and the datastore health probe.

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::application::error::HttpError;
use crate::application::feed::FeedError;
use crate::application::posts::PostError;
use crate::infra::http::HttpState;
use crate::infra::http::session::OptionalSession;
use crate::presentation::views::{
    CommentView, FeedContext, GroupContext, GroupTemplate, IndexTemplate, LayoutContext, PageNav,
    PostCardView, PostDetailContext, PostDetailTemplate, ProfileContext, ProfileTemplate,
    build_post_cards, render_not_found_response, render_template_response,
};

use super::session::SessionUser;

/// Lenient `?page=` parsing: anything that is not a positive integer means
/// the first page.
pub fn page_param(query: Option<&str>) -> u32 {
    query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse::<u32>().ok())
        })
        .unwrap_or(1)
}

fn viewer_view(session: &Option<SessionUser>) -> Option<crate::presentation::views::ViewerView> {
    session.as_ref().map(SessionUser::viewer)
}

pub async fn index(
    State(state): State<HttpState>,
    OptionalSession(session): OptionalSession,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpError> {
    let page = page_param(query.as_deref());
    let feed = match state.feed.global(page).await {
        Ok(feed) => feed,
        Err(FeedError::Repo(err)) => {
            return Err(HttpError::from_repo("infra::http::public::index", err));
        }
        Err(err) => {
            return Err(HttpError::from_error(
                "infra::http::public::index",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load the feed",
                &err,
            ));
        }
    };
    let content = FeedContext {
        posts: build_post_cards(&feed.items),
        nav: PageNav::new(feed.info, "/"),
    };
    let view = LayoutContext::new(viewer_view(&session), content);
    Ok(render_template_response(IndexTemplate { view }, StatusCode::OK))
}

pub async fn group_feed(
    State(state): State<HttpState>,
    OptionalSession(session): OptionalSession,
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpError> {
    let page = page_param(query.as_deref());
    match state.feed.group(&slug, page).await {
        Ok(feed) => {
            let nav = PageNav::new(feed.page.info, format!("/group/{}", feed.group.slug));
            let content =
                GroupContext::new(&feed.group, build_post_cards(&feed.page.items), nav);
            let view = LayoutContext::new(viewer_view(&session), content);
            Ok(render_template_response(GroupTemplate { view }, StatusCode::OK))
        }
        Err(FeedError::UnknownGroup { .. }) => Ok(render_not_found_response(viewer_view(&session))),
        Err(FeedError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::public::group_feed",
            err,
        )),
        Err(err) => Err(HttpError::from_error(
            "infra::http::public::group_feed",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load the group feed",
            &err,
        )),
    }
}

pub async fn profile(
    State(state): State<HttpState>,
    OptionalSession(session): OptionalSession,
    Path(username): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpError> {
    let page = page_param(query.as_deref());
    let feed = match state.feed.profile(&username, page).await {
        Ok(feed) => feed,
        Err(FeedError::UnknownUser { .. }) => {
            return Ok(render_not_found_response(viewer_view(&session)));
        }
        Err(FeedError::Repo(err)) => {
            return Err(HttpError::from_repo("infra::http::public::profile", err));
        }
        Err(err) => {
            return Err(HttpError::from_error(
                "infra::http::public::profile",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load the profile",
                &err,
            ));
        }
    };

    let (show_follow_controls, is_following) = match &session {
        Some(viewer) if viewer.id != feed.author.id => {
            let following = state
                .follows
                .is_following(viewer.id, feed.author.id)
                .await
                .map_err(|err| HttpError::from_repo("infra::http::public::profile", err))?;
            (true, following)
        }
        _ => (false, false),
    };

    let nav = PageNav::new(feed.page.info, format!("/profile/{}", feed.author.username));
    let content = ProfileContext {
        username: feed.author.username.clone(),
        post_count: feed.post_count,
        is_following,
        show_follow_controls,
        posts: build_post_cards(&feed.page.items),
        nav,
    };
    let view = LayoutContext::new(viewer_view(&session), content);
    Ok(render_template_response(ProfileTemplate { view }, StatusCode::OK))
}

pub async fn post_detail(
    State(state): State<HttpState>,
    OptionalSession(session): OptionalSession,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpError> {
    match state.posts.detail(id).await {
        Ok(detail) => {
            let can_edit = session
                .as_ref()
                .is_some_and(|viewer| viewer.id == detail.item.post.author_id);
            let content = PostDetailContext {
                post: PostCardView::from(&detail.item),
                comments: detail.comments.iter().map(CommentView::from).collect(),
                can_edit,
                can_comment: session.is_some(),
            };
            let view = LayoutContext::new(viewer_view(&session), content);
            Ok(render_template_response(
                PostDetailTemplate { view },
                StatusCode::OK,
            ))
        }
        Err(PostError::NotFound) => Ok(render_not_found_response(viewer_view(&session))),
        Err(PostError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::public::post_detail",
            err,
        )),
        Err(err) => Err(HttpError::from_error(
            "infra::http::public::post_detail",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load the post",
            &err,
        )),
    }
}

pub async fn db_health(State(state): State<HttpState>) -> Response {
    match state.health.ping().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(err) => HttpError::from_error(
            "infra::http::public::db_health",
            StatusCode::SERVICE_UNAVAILABLE,
            "database unavailable",
            &err,
        )
        .into_response(),
    }
}

pub async fn not_found(OptionalSession(session): OptionalSession) -> Response {
    render_not_found_response(viewer_view(&session))
}
