//! HTTP surface: state, router assembly, handlers, sessions, middleware.

pub mod authored;
pub mod middleware;
pub mod public;
pub mod session;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum_extra::extract::cookie::Key;

use crate::application::accounts::AccountService;
use crate::application::feed::FeedService;
use crate::application::follows::FollowService;
use crate::application::posts::PostService;
use crate::application::repos::{GroupsRepo, HealthRepo};
use crate::cache::middleware::{CacheHandle, page_cache_layer};
use crate::cache::store::PageStore;

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub accounts: Arc<AccountService>,
    pub groups: Arc<dyn GroupsRepo>,
    pub health: Arc<dyn HealthRepo>,
    /// Present when the page cache is enabled; only the `/` route uses it.
    pub page_cache: Option<Arc<PageStore>>,
    pub session_key: Key,
}

impl FromRef<HttpState> for Key {
    fn from_ref(state: &HttpState) -> Key {
        state.session_key.clone()
    }
}

pub fn build_router(state: HttpState) -> Router {
    let index = match &state.page_cache {
        Some(store) => get(public::index).layer(from_fn_with_state(
            CacheHandle {
                store: store.clone(),
            },
            page_cache_layer,
        )),
        None => get(public::index),
    };

    Router::new()
        .route("/", index)
        .route("/group/{slug}", get(public::group_feed))
        .route("/profile/{username}", get(public::profile))
        .route("/posts/{id}", get(public::post_detail))
        .route(
            "/posts/{id}/edit",
            get(authored::edit_form).post(authored::edit_submit),
        )
        .route(
            "/create",
            get(authored::create_form).post(authored::create_submit),
        )
        .route("/posts/{id}/comment", axum::routing::post(authored::add_comment))
        .route("/follow", get(authored::follow_feed))
        .route("/profile/{username}/follow", get(authored::follow_author))
        .route(
            "/profile/{username}/unfollow",
            get(authored::unfollow_author),
        )
        .route(
            "/auth/signup",
            get(session::signup_form).post(session::signup_submit),
        )
        .route(
            "/auth/login",
            get(session::login_form).post(session::login_submit),
        )
        .route("/auth/logout", get(session::logout))
        .route("/_health/db", get(public::db_health))
        .fallback(public::not_found)
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
        .with_state(state)
}
