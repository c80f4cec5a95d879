//! Service-level feed behavior: ordering, pagination, group scoping, and
//! the follow lifecycle.

mod common;

use common::{MemoryRepos, feed_service, follow_service};

use foglio::application::feed::FeedError;
use foglio::application::follows::{FollowOutcome, UnfollowOutcome};

#[tokio::test]
async fn global_feed_orders_newest_first() {
    let repos = MemoryRepos::new();
    let author = repos.seed_user("leo");
    repos.seed_post(&author, None, "first");
    repos.seed_post(&author, None, "second");
    repos.seed_post(&author, None, "third");

    let feed = feed_service(&repos);
    let page = feed.global(1).await.unwrap();

    let texts: Vec<&str> = page.items.iter().map(|i| i.post.text.as_str()).collect();
    assert_eq!(texts, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn thirteen_posts_make_two_pages() {
    let repos = MemoryRepos::new();
    let author = repos.seed_user("leo");
    for n in 0..13 {
        repos.seed_post(&author, None, &format!("post {n}"));
    }

    let feed = feed_service(&repos);
    let first = feed.global(1).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.info.total_pages, 2);
    assert!(first.info.has_next);

    let second = feed.global(2).await.unwrap();
    assert_eq!(second.items.len(), 3);
    assert!(!second.info.has_next);
    assert!(second.info.has_previous);
}

#[tokio::test]
async fn out_of_range_page_clamps_to_last() {
    let repos = MemoryRepos::new();
    let author = repos.seed_user("leo");
    for n in 0..13 {
        repos.seed_post(&author, None, &format!("post {n}"));
    }

    let feed = feed_service(&repos);
    let page = feed.global(99).await.unwrap();
    assert_eq!(page.info.number, 2);
    assert_eq!(page.items.len(), 3);
}

#[tokio::test]
async fn group_feed_scopes_to_its_group() {
    let repos = MemoryRepos::new();
    let author = repos.seed_user("leo");
    let group = repos.seed_group("test-slug", "Тестовая группа");
    let other = repos.seed_group("other-slug", "Другая группа");
    repos.seed_post(&author, Some(&group), "Тестовый текст");
    repos.seed_post(&author, None, "ungrouped");

    let feed = feed_service(&repos);

    let in_group = feed.group("test-slug", 1).await.unwrap();
    assert_eq!(in_group.group.slug, "test-slug");
    assert_eq!(in_group.page.items.len(), 1);
    assert_eq!(in_group.page.items[0].post.text, "Тестовый текст");

    let in_other = feed.group("other-slug", 1).await.unwrap();
    assert_eq!(in_other.group.slug, other.slug);
    assert!(in_other.page.items.is_empty());
}

#[tokio::test]
async fn unknown_group_slug_is_an_error() {
    let repos = MemoryRepos::new();
    let feed = feed_service(&repos);
    let err = feed.group("missing", 1).await.unwrap_err();
    assert!(matches!(err, FeedError::UnknownGroup { .. }));
}

#[tokio::test]
async fn profile_feed_reports_unknown_user() {
    let repos = MemoryRepos::new();
    let feed = feed_service(&repos);
    let err = feed.profile("nobody", 1).await.unwrap_err();
    assert!(matches!(err, FeedError::UnknownUser { .. }));
}

#[tokio::test]
async fn profile_feed_counts_only_the_author() {
    let repos = MemoryRepos::new();
    let leo = repos.seed_user("leo");
    let anna = repos.seed_user("anna");
    repos.seed_post(&leo, None, "by leo");
    repos.seed_post(&anna, None, "by anna");
    repos.seed_post(&leo, None, "also by leo");

    let feed = feed_service(&repos);
    let profile = feed.profile("leo", 1).await.unwrap();
    assert_eq!(profile.post_count, 2);
    assert!(profile.page.items.iter().all(|i| i.author_username == "leo"));
}

#[tokio::test]
async fn follow_lifecycle_controls_the_follow_feed() {
    let repos = MemoryRepos::new();
    let reader = repos.seed_user("reader");
    let author = repos.seed_user("author");
    repos.seed_post(&author, None, "from the author");
    repos.seed_post(&reader, None, "the reader's own post");

    let feed = feed_service(&repos);
    let follows = follow_service(&repos);

    // Before following: empty feed.
    let before = feed.following(reader.id, 1).await.unwrap();
    assert!(before.items.is_empty());

    let outcome = follows.follow(reader.id, "author").await.unwrap();
    assert_eq!(outcome, FollowOutcome::Created);

    let during = feed.following(reader.id, 1).await.unwrap();
    let texts: Vec<&str> = during.items.iter().map(|i| i.post.text.as_str()).collect();
    assert_eq!(texts, vec!["from the author"]);

    let outcome = follows.unfollow(reader.id, "author").await.unwrap();
    assert_eq!(outcome, UnfollowOutcome::Removed);

    let after = feed.following(reader.id, 1).await.unwrap();
    assert!(after.items.is_empty());
}

#[tokio::test]
async fn own_posts_never_appear_in_own_follow_feed() {
    let repos = MemoryRepos::new();
    let reader = repos.seed_user("reader");
    let author = repos.seed_user("author");
    repos.seed_post(&reader, None, "mine");
    repos.seed_post(&author, None, "theirs");

    let follows = follow_service(&repos);
    follows.follow(reader.id, "author").await.unwrap();

    let feed = feed_service(&repos);
    let page = feed.following(reader.id, 1).await.unwrap();
    assert!(page.items.iter().all(|i| i.post.author_id != reader.id));
}

#[tokio::test]
async fn follow_is_idempotent() {
    let repos = MemoryRepos::new();
    let reader = repos.seed_user("reader");
    repos.seed_user("author");

    let follows = follow_service(&repos);
    assert_eq!(
        follows.follow(reader.id, "author").await.unwrap(),
        FollowOutcome::Created
    );
    assert_eq!(
        follows.follow(reader.id, "author").await.unwrap(),
        FollowOutcome::AlreadyFollowing
    );
    assert_eq!(repos.follow_count(), 1);
}

#[tokio::test]
async fn self_follow_is_a_silent_no_op() {
    let repos = MemoryRepos::new();
    let reader = repos.seed_user("reader");

    let follows = follow_service(&repos);
    assert_eq!(
        follows.follow(reader.id, "reader").await.unwrap(),
        FollowOutcome::SelfFollow
    );
    assert_eq!(repos.follow_count(), 0);
}

#[tokio::test]
async fn unfollow_without_an_edge_is_a_no_op() {
    let repos = MemoryRepos::new();
    let reader = repos.seed_user("reader");
    repos.seed_user("author");

    let follows = follow_service(&repos);
    assert_eq!(
        follows.unfollow(reader.id, "author").await.unwrap(),
        UnfollowOutcome::NotFollowing
    );
}

#[tokio::test]
async fn follow_of_unknown_user_fails() {
    let repos = MemoryRepos::new();
    let reader = repos.seed_user("reader");

    let follows = follow_service(&repos);
    let err = follows.follow(reader.id, "ghost").await.unwrap_err();
    assert!(matches!(
        err,
        foglio::application::follows::FollowError::UnknownUser { .. }
    ));
}
