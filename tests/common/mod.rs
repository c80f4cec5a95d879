//! In-memory repository fakes and request helpers shared by the
//! integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use axum_extra::extract::cookie::Key;
use http_body_util::BodyExt;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

use foglio::application::accounts::{AccountService, password_digest};
use foglio::application::feed::FeedService;
use foglio::application::follows::FollowService;
use foglio::application::posts::PostService;
use foglio::application::repos::{
    CommentWithAuthor, CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams,
    CreateUserParams, FeedScope, FollowsRepo, GroupRef, GroupsRepo, HealthRepo, PostFeedItem,
    PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams, UsersRepo,
};
use foglio::cache::{CacheConfig, Clock, ManualClock, PageStore};
use foglio::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};
use foglio::infra::http::{HttpState, build_router};

pub const PAGE_SIZE: u32 = 10;
const TEST_SESSION_SECRET: &[u8] =
    b"integration-test-session-secret-0123456789-0123456789-0123456789";

#[derive(Default)]
struct MemoryState {
    users: Vec<UserRecord>,
    groups: Vec<GroupRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    follows: HashSet<(Uuid, Uuid)>,
}

/// One shared store implementing every repository trait, with strictly
/// increasing timestamps so feed ordering is deterministic.
#[derive(Default)]
pub struct MemoryRepos {
    state: Mutex<MemoryState>,
    seq: AtomicI64,
}

impl MemoryRepos {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_time(&self) -> OffsetDateTime {
        let tick = self.seq.fetch_add(1, Ordering::SeqCst);
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(tick)
    }

    pub fn seed_user(&self, username: &str) -> UserRecord {
        self.seed_user_with_password(username, "correct-horse-battery")
    }

    pub fn seed_user_with_password(&self, username: &str, password: &str) -> UserRecord {
        let salt = Uuid::new_v4().simple().to_string();
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_digest: password_digest(&salt, password),
            password_salt: salt,
            created_at: self.next_time(),
        };
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_group(&self, slug: &str, title: &str) -> GroupRecord {
        let group = GroupRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: title.to_string(),
            description: String::new(),
            created_at: self.next_time(),
        };
        self.state.lock().unwrap().groups.push(group.clone());
        group
    }

    pub fn seed_post(
        &self,
        author: &UserRecord,
        group: Option<&GroupRecord>,
        text: &str,
    ) -> PostRecord {
        let post = PostRecord {
            id: Uuid::new_v4(),
            author_id: author.id,
            group_id: group.map(|g| g.id),
            text: text.to_string(),
            image_url: None,
            created_at: self.next_time(),
        };
        self.state.lock().unwrap().posts.push(post.clone());
        post
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().unwrap().comments.len()
    }

    pub fn follow_count(&self) -> usize {
        self.state.lock().unwrap().follows.len()
    }

    fn feed_item(&self, state: &MemoryState, post: &PostRecord) -> PostFeedItem {
        let author_username = state
            .users
            .iter()
            .find(|u| u.id == post.author_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let group = post.group_id.and_then(|gid| {
            state.groups.iter().find(|g| g.id == gid).map(|g| GroupRef {
                slug: g.slug.clone(),
                title: g.title.clone(),
            })
        });
        PostFeedItem {
            post: post.clone(),
            author_username,
            group,
        }
    }

    fn scoped<'a>(state: &'a MemoryState, scope: FeedScope) -> Vec<&'a PostRecord> {
        let mut posts: Vec<&PostRecord> = state
            .posts
            .iter()
            .filter(|p| match scope {
                FeedScope::Global => true,
                FeedScope::Group(gid) => p.group_id == Some(gid),
                FeedScope::Author(aid) => p.author_id == aid,
                FeedScope::FollowedBy(viewer) => state.follows.contains(&(viewer, p.author_id)),
            })
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts
    }
}

#[async_trait]
impl UsersRepo for MemoryRepos {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let created_at = self.next_time();
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            password_digest: params.password_digest,
            password_salt: params.password_salt,
            created_at,
        };
        state.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl GroupsRepo for MemoryRepos {
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut groups = state.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let created_at = self.next_time();
        let mut state = self.state.lock().unwrap();
        if state.groups.iter().any(|g| g.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "groups_slug_key".to_string(),
            });
        }
        let group = GroupRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            title: params.title,
            description: params.description,
            created_at,
        };
        state.groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl PostsRepo for MemoryRepos {
    async fn list_feed(
        &self,
        scope: FeedScope,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostFeedItem>, RepoError> {
        let state = self.state.lock().unwrap();
        let posts = Self::scoped(&state, scope);
        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|p| self.feed_item(&state, p))
            .collect())
    }

    async fn count_feed(&self, scope: FeedScope) -> Result<u64, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(Self::scoped(&state, scope).len() as u64)
    }

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<PostFeedItem>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| self.feed_item(&state, p)))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepos {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let created_at = self.next_time();
        let mut state = self.state.lock().unwrap();
        let post = PostRecord {
            id: Uuid::new_v4(),
            author_id: params.author_id,
            group_id: params.group_id,
            text: params.text,
            image_url: params.image_url,
            created_at,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.group_id = params.group_id;
        post.text = params.text;
        post.image_url = params.image_url;
        Ok(post.clone())
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepos {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let created_at = self.next_time();
        let mut state = self.state.lock().unwrap();
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: params.author_id,
            text: params.text,
            created_at,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments_for_post(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut comments: Vec<&CommentRecord> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments
            .into_iter()
            .map(|c| CommentWithAuthor {
                comment: c.clone(),
                author_username: state
                    .users
                    .iter()
                    .find(|u| u.id == c.author_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl FollowsRepo for MemoryRepos {
    async fn insert_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.follows.insert((follower_id, author_id)))
    }

    async fn remove_follow(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.follows.remove(&(follower_id, author_id)))
    }

    async fn follow_exists(&self, follower_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.follows.contains(&(follower_id, author_id)))
    }
}

#[async_trait]
impl HealthRepo for MemoryRepos {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

pub fn page_size() -> NonZeroU32 {
    NonZeroU32::new(PAGE_SIZE).unwrap()
}

pub fn feed_service(repos: &Arc<MemoryRepos>) -> FeedService {
    FeedService::new(
        repos.clone(),
        repos.clone(),
        repos.clone(),
        page_size(),
    )
}

pub fn follow_service(repos: &Arc<MemoryRepos>) -> FollowService {
    FollowService::new(repos.clone(), repos.clone())
}

pub fn post_service(repos: &Arc<MemoryRepos>) -> PostService {
    PostService::new(repos.clone(), repos.clone(), repos.clone(), repos.clone())
}

pub struct TestApp {
    pub repos: Arc<MemoryRepos>,
    pub clock: Arc<ManualClock>,
    pub store: Option<Arc<PageStore>>,
    pub router: Router,
}

pub fn build_app(repos: Arc<MemoryRepos>, cache_enabled: bool) -> TestApp {
    let clock = Arc::new(ManualClock::new(OffsetDateTime::UNIX_EPOCH));
    let store = cache_enabled.then(|| {
        let clock: Arc<dyn Clock> = clock.clone();
        Arc::new(PageStore::new(&CacheConfig::default(), clock))
    });

    let state = HttpState {
        feed: Arc::new(feed_service(&repos)),
        posts: Arc::new(post_service(&repos)),
        follows: Arc::new(follow_service(&repos)),
        accounts: Arc::new(AccountService::new(repos.clone())),
        groups: repos.clone(),
        health: repos.clone(),
        page_cache: store.clone(),
        session_key: Key::derive_from(TEST_SESSION_SECRET),
    };

    TestApp {
        router: build_router(state),
        repos,
        clock,
        store,
    }
}

pub async fn get(router: &Router, path: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get_with_cookie(router: &Router, path: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(path)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn post_form(
    router: &Router,
    path: &str,
    body: &str,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The `name=value` pair of the session cookie set by a response.
pub fn session_cookie_from(response: &Response<Body>) -> Option<String> {
    let raw = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    raw.split(';').next().map(|pair| pair.trim().to_string())
}

pub fn location_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(axum::http::header::LOCATION)?
        .to_str()
        .ok()
        .map(str::to_string)
}
