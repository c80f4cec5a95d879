//! Response-capture middleware for the page cache. Layered onto the
//! public feed route only; everything else renders live.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::cache::store::{PageKey, PageStore};

/// Responses larger than this are served but not cached.
const MAX_CACHED_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct CacheHandle {
    pub store: Arc<PageStore>,
}

/// Serves a fresh cached copy when one exists; otherwise runs the handler
/// and stores successful GET responses. Within the TTL the cached bytes are
/// returned verbatim, so concurrent writes stay invisible until expiry.
pub async fn page_cache_layer(
    State(handle): State<CacheHandle>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = PageKey::new(request.uri().path(), request.uri().query());
    if let Some(page) = handle.store.get(&key) {
        let mut response = Response::builder()
            .status(page.status)
            .body(Body::from(page.body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());
        *response.headers_mut() = page.headers;
        return response;
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(
                target = "foglio::cache",
                error = %err,
                "failed to buffer response body for caching",
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if bytes.len() <= MAX_CACHED_BODY_BYTES {
        handle
            .store
            .put(key, parts.status, parts.headers.clone(), bytes.clone());
    }

    Response::from_parts(parts, Body::from(bytes))
}
