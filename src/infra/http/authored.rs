//! Handlers that require a signed-in user: post create/edit, comments, the
//! follow feed, and follow/unfollow actions. Ownership failures redirect
//! instead of erroring.

use axum::Form;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::error::HttpError;
use crate::application::feed::FeedError;
use crate::application::follows::FollowError;
use crate::application::forms::{FieldErrors, PostInput};
use crate::application::posts::PostError;
use crate::application::repos::PostFeedItem;
use crate::infra::http::HttpState;
use crate::infra::http::public::page_param;
use crate::infra::http::session::SessionUser;
use crate::presentation::views::{
    FeedContext, FollowTemplate, LayoutContext, PageNav, PostFormContext, PostFormTemplate,
    build_post_cards, render_not_found_response, render_template_response,
};

#[derive(Debug, Deserialize)]
pub struct PostFormData {
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<PostFormData> for PostInput {
    fn from(form: PostFormData) -> Self {
        PostInput {
            text: form.text,
            group: form.group,
            image_url: form.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentFormData {
    pub text: String,
}

async fn post_form_page(
    state: &HttpState,
    user: &SessionUser,
    heading: &str,
    action: String,
    input: &PostInput,
    errors: &FieldErrors,
    status: StatusCode,
) -> Result<Response, HttpError> {
    let groups = state
        .groups
        .list_groups()
        .await
        .map_err(|err| HttpError::from_repo("infra::http::authored::post_form_page", err))?;
    let content = PostFormContext::new(heading, action, input, &groups, errors);
    let view = LayoutContext::new(Some(user.viewer()), content);
    Ok(render_template_response(PostFormTemplate { view }, status))
}

pub async fn create_form(
    State(state): State<HttpState>,
    user: SessionUser,
) -> Result<Response, HttpError> {
    post_form_page(
        &state,
        &user,
        "New post",
        "/create".to_string(),
        &PostInput::default(),
        &FieldErrors::new(),
        StatusCode::OK,
    )
    .await
}

pub async fn create_submit(
    State(state): State<HttpState>,
    user: SessionUser,
    Form(form): Form<PostFormData>,
) -> Result<Response, HttpError> {
    let input = PostInput::from(form);
    match state.posts.create(user.id, input.clone()).await {
        Ok(_) => Ok(Redirect::to(&format!("/profile/{}", user.username)).into_response()),
        Err(PostError::Invalid(errors)) => {
            post_form_page(
                &state,
                &user,
                "New post",
                "/create".to_string(),
                &input,
                &errors,
                StatusCode::OK,
            )
            .await
        }
        Err(PostError::UnknownGroup { slug }) => {
            let errors = vec![crate::application::forms::FieldError {
                field: "group",
                message: format!("No group with slug {slug:?}"),
            }];
            post_form_page(
                &state,
                &user,
                "New post",
                "/create".to_string(),
                &input,
                &errors,
                StatusCode::OK,
            )
            .await
        }
        Err(PostError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::authored::create_submit",
            err,
        )),
        Err(err) => Err(HttpError::from_error(
            "infra::http::authored::create_submit",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create the post",
            &err,
        )),
    }
}

fn prefill_input(item: &PostFeedItem) -> PostInput {
    PostInput {
        text: item.post.text.clone(),
        group: item.group.as_ref().map(|g| g.slug.clone()),
        image_url: item.post.image_url.clone(),
    }
}

pub async fn edit_form(
    State(state): State<HttpState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpError> {
    match state.posts.authored_post(user.id, id).await {
        Ok(item) => {
            let input = prefill_input(&item);
            post_form_page(
                &state,
                &user,
                "Edit post",
                format!("/posts/{id}/edit"),
                &input,
                &FieldErrors::new(),
                StatusCode::OK,
            )
            .await
        }
        Err(PostError::NotAuthor) => Ok(Redirect::to(&format!("/posts/{id}")).into_response()),
        Err(PostError::NotFound) => Ok(render_not_found_response(Some(user.viewer()))),
        Err(PostError::Repo(err)) => {
            Err(HttpError::from_repo("infra::http::authored::edit_form", err))
        }
        Err(err) => Err(HttpError::from_error(
            "infra::http::authored::edit_form",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load the post",
            &err,
        )),
    }
}

pub async fn edit_submit(
    State(state): State<HttpState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    Form(form): Form<PostFormData>,
) -> Result<Response, HttpError> {
    let input = PostInput::from(form);
    match state.posts.edit(user.id, id, input.clone()).await {
        Ok(_) => Ok(Redirect::to(&format!("/posts/{id}")).into_response()),
        Err(PostError::NotAuthor) => Ok(Redirect::to(&format!("/posts/{id}")).into_response()),
        Err(PostError::NotFound) => Ok(render_not_found_response(Some(user.viewer()))),
        Err(PostError::Invalid(errors)) => {
            post_form_page(
                &state,
                &user,
                "Edit post",
                format!("/posts/{id}/edit"),
                &input,
                &errors,
                StatusCode::OK,
            )
            .await
        }
        Err(PostError::UnknownGroup { slug }) => {
            let errors = vec![crate::application::forms::FieldError {
                field: "group",
                message: format!("No group with slug {slug:?}"),
            }];
            post_form_page(
                &state,
                &user,
                "Edit post",
                format!("/posts/{id}/edit"),
                &input,
                &errors,
                StatusCode::OK,
            )
            .await
        }
        Err(PostError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::authored::edit_submit",
            err,
        )),
    }
}

/// Invalid comment input is a silent no-op: the detail page is re-shown and
/// nothing is written.
pub async fn add_comment(
    State(state): State<HttpState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    Form(form): Form<CommentFormData>,
) -> Result<Response, HttpError> {
    match state.posts.add_comment(user.id, id, &form.text).await {
        Ok(_) | Err(PostError::Invalid(_)) => {
            Ok(Redirect::to(&format!("/posts/{id}")).into_response())
        }
        Err(PostError::NotFound) => Ok(render_not_found_response(Some(user.viewer()))),
        Err(PostError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::authored::add_comment",
            err,
        )),
        Err(err) => Err(HttpError::from_error(
            "infra::http::authored::add_comment",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to add the comment",
            &err,
        )),
    }
}

pub async fn follow_feed(
    State(state): State<HttpState>,
    user: SessionUser,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpError> {
    let page = page_param(query.as_deref());
    let feed = match state.feed.following(user.id, page).await {
        Ok(feed) => feed,
        Err(FeedError::Repo(err)) => {
            return Err(HttpError::from_repo(
                "infra::http::authored::follow_feed",
                err,
            ));
        }
        Err(err) => {
            return Err(HttpError::from_error(
                "infra::http::authored::follow_feed",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load the follow feed",
                &err,
            ));
        }
    };
    let content = FeedContext {
        posts: build_post_cards(&feed.items),
        nav: PageNav::new(feed.info, "/follow"),
    };
    let view = LayoutContext::new(Some(user.viewer()), content);
    Ok(render_template_response(FollowTemplate { view }, StatusCode::OK))
}

/// Self-follow and repeated follows fall through to the same redirect; the
/// edge set is unchanged.
pub async fn follow_author(
    State(state): State<HttpState>,
    user: SessionUser,
    Path(username): Path<String>,
) -> Result<Response, HttpError> {
    match state.follows.follow(user.id, &username).await {
        Ok(_) => Ok(Redirect::to(&format!("/profile/{username}")).into_response()),
        Err(FollowError::UnknownUser { .. }) => {
            Ok(render_not_found_response(Some(user.viewer())))
        }
        Err(FollowError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::authored::follow_author",
            err,
        )),
    }
}

pub async fn unfollow_author(
    State(state): State<HttpState>,
    user: SessionUser,
    Path(username): Path<String>,
) -> Result<Response, HttpError> {
    match state.follows.unfollow(user.id, &username).await {
        Ok(_) => Ok(Redirect::to(&format!("/profile/{username}")).into_response()),
        Err(FollowError::UnknownUser { .. }) => {
            Ok(render_not_found_response(Some(user.viewer())))
        }
        Err(FollowError::Repo(err)) => Err(HttpError::from_repo(
            "infra::http::authored::unfollow_author",
            err,
        )),
    }
}
