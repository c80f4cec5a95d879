//! foglio is a multi-user blogging service: users publish text posts,
//! optionally filed under a topic group, comment on each other's posts, and
//! follow authors to build an aggregated feed. The public feed is served
//! through a short-lived page cache.
//!
//! Layering, top down: `infra::http` (axum handlers and sessions) calls
//! `application` services (pagination, feeds, posts, follows, accounts),
//! which talk to storage through the repository traits implemented by
//! `infra::db`. `presentation` renders askama view models; `cache` holds
//! the TTL page store.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
