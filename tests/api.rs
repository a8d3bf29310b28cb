use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use dailypoet::application::analytics::AnalyticsService;
use dailypoet::application::collections::{CollectionError, CollectionService, UpsertCollectionCommand};
use dailypoet::application::comments::CommentService;
use dailypoet::application::engagement::{EngagementError, EngagementService};
use dailypoet::application::follows::{FollowError, FollowService};
use dailypoet::application::notifications::NotificationService;
use dailypoet::application::posts::{CreatePostCommand, PostService, UpdatePostCommand};
use dailypoet::application::profiles::{ProfileError, ProfileService};
use dailypoet::application::repos::{
    AnalyticsRepo, CollectionsRepo, CommentsRepo, EngagementRepo, FollowsRepo, NotificationsRepo,
    PostsRepo, SessionsRepo, TagsRepo, UsersRepo,
};
use dailypoet::application::search::SearchService;
use dailypoet::application::sessions::{SessionAuthError, SessionService};
use dailypoet::application::users::{SignupCommand, UpdateProfileCommand, UserError, UserService};
use dailypoet::domain::entities::UserRecord;
use dailypoet::domain::types::{AnalyticsRange, NotificationAction};
use dailypoet::infra::db::PostgresRepositories;
use dailypoet::infra::http::{self, ApiRateLimiter, ApiState};
use dailypoet::infra::uploads::UploadStorage;

fn build_state_with_limit(pool: PgPool, max_requests: u32) -> (ApiState, TempDir) {
    let repositories = Arc::new(PostgresRepositories::new(pool));

    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let tags_repo: Arc<dyn TagsRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let engagement_repo: Arc<dyn EngagementRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();
    let collections_repo: Arc<dyn CollectionsRepo> = repositories.clone();
    let notifications_repo: Arc<dyn NotificationsRepo> = repositories.clone();
    let analytics_repo: Arc<dyn AnalyticsRepo> = repositories.clone();

    let upload_dir = tempfile::tempdir().expect("upload tempdir");
    let upload_storage =
        Arc::new(UploadStorage::new(upload_dir.path().to_path_buf()).expect("upload storage"));

    let sessions = SessionService::new(
        sessions_repo,
        users_repo.clone(),
        time::Duration::days(30),
    );
    let users = UserService::new(users_repo.clone());
    let notifications = NotificationService::new(notifications_repo);
    let posts = PostService::new(posts_repo.clone(), tags_repo.clone());
    let comments = CommentService::new(
        comments_repo.clone(),
        posts_repo.clone(),
        notifications.clone(),
    );
    let engagement = EngagementService::new(
        engagement_repo,
        posts_repo.clone(),
        comments_repo,
        notifications.clone(),
    );
    let follows = FollowService::new(
        follows_repo.clone(),
        users_repo.clone(),
        notifications.clone(),
    );
    let profiles = ProfileService::new(
        users_repo.clone(),
        posts_repo.clone(),
        follows_repo,
        posts.clone(),
    );
    let collections = CollectionService::new(
        collections_repo.clone(),
        posts_repo.clone(),
        posts.clone(),
    );
    let search = SearchService::new(
        posts_repo,
        users_repo,
        tags_repo,
        collections_repo,
        posts.clone(),
    );
    let analytics = AnalyticsService::new(analytics_repo);

    let state = ApiState {
        sessions,
        users,
        profiles,
        posts,
        comments,
        engagement,
        follows,
        collections,
        notifications,
        search,
        analytics,
        db: repositories,
        upload_storage,
        rate_limiter: Arc::new(ApiRateLimiter::new(
            StdDuration::from_secs(60),
            max_requests,
        )),
        secure_cookies: false,
        upload_limit_bytes: 10 * 1024 * 1024,
    };

    (state, upload_dir)
}

fn build_state(pool: PgPool) -> (ApiState, TempDir) {
    build_state_with_limit(pool, 1000)
}

async fn signup(state: &ApiState, name: &str, username: &str, email: &str) -> UserRecord {
    state
        .users
        .signup(SignupCommand {
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: "stanza-secret".to_string(),
        })
        .await
        .expect("signup")
}

async fn write_post(
    state: &ApiState,
    author: &UserRecord,
    title: &str,
    content: &str,
    tags: Option<&str>,
) -> dailypoet::application::posts::PostView {
    state
        .posts
        .create(
            author,
            CreatePostCommand {
                title: title.to_string(),
                content: content.to_string(),
                tags: tags.map(|value| value.to_string()),
            },
        )
        .await
        .expect("create post")
}

#[sqlx::test(migrations = "./migrations")]
async fn signup_normalizes_handles_and_rejects_duplicates(pool: PgPool) {
    let (state, _uploads) = build_state(pool);

    let user = signup(&state, "Ada", "Ada_Poet", "Ada@Example.COM").await;
    assert_eq!(user.username, "ada_poet");
    assert_eq!(user.email, "ada@example.com");

    let duplicate = state
        .users
        .signup(SignupCommand {
            name: "Imposter".to_string(),
            username: "other".to_string(),
            email: "ada@example.com".to_string(),
            password: "different-secret".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(UserError::Validation(message))
        if message.contains("email has already been taken")));

    let taken_username = state
        .users
        .signup(SignupCommand {
            name: "Imposter".to_string(),
            username: "ADA_POET".to_string(),
            email: "fresh@example.com".to_string(),
            password: "different-secret".to_string(),
        })
        .await;
    assert!(matches!(taken_username, Err(UserError::Validation(message))
        if message.contains("username has already been taken")));
}

#[sqlx::test(migrations = "./migrations")]
async fn login_and_session_round_trip(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let user = signup(&state, "Ada", "ada", "ada@example.com").await;

    let authenticated = state
        .users
        .authenticate("ADA@example.com", "stanza-secret")
        .await
        .expect("login");
    assert_eq!(authenticated.id, user.id);

    assert!(matches!(
        state.users.authenticate("ada@example.com", "wrong").await,
        Err(UserError::InvalidCredentials)
    ));
    assert!(matches!(
        state.users.authenticate("ghost@example.com", "stanza-secret").await,
        Err(UserError::InvalidCredentials)
    ));

    let issued = state.sessions.issue(user.id).await.expect("issue session");
    let principal = state
        .sessions
        .authenticate(&issued.token)
        .await
        .expect("authenticate token");
    assert_eq!(principal.user.id, user.id);

    state
        .sessions
        .revoke(principal.session_id)
        .await
        .expect("revoke");
    assert!(matches!(
        state.sessions.authenticate(&issued.token).await,
        Err(SessionAuthError::Revoked)
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn post_creation_derives_excerpt_and_normalizes_tags(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let author = signup(&state, "Ada", "ada", "ada@example.com").await;

    let long_content = "verse ".repeat(60);
    let view = write_post(
        &state,
        &author,
        "Morning Stanza",
        &long_content,
        Some(" Poetry, HAIKU ,poetry"),
    )
    .await;

    assert_eq!(view.post.excerpt.chars().count(), 150);
    assert!(view.post.excerpt.ends_with("..."));
    assert_eq!(view.tags, vec!["poetry", "haiku"]);

    let updated = state
        .posts
        .update(
            &author,
            UpdatePostCommand {
                id: view.post.id,
                title: "Morning Stanza".to_string(),
                content: "short now".to_string(),
            },
        )
        .await
        .expect("update post");
    assert_eq!(updated.post.excerpt, "short now");
    assert_eq!(updated.tags, vec!["poetry", "haiku"]);

    let stranger = signup(&state, "Eve", "eve", "eve@example.com").await;
    let denied = state
        .posts
        .update(
            &stranger,
            UpdatePostCommand {
                id: view.post.id,
                title: "Hijack".to_string(),
                content: "mine now".to_string(),
            },
        )
        .await;
    assert!(matches!(
        denied,
        Err(dailypoet::application::posts::PostError::Unauthorized)
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn showing_a_post_records_a_view(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let author = signup(&state, "Ada", "ada", "ada@example.com").await;
    let view = write_post(&state, &author, "Counted", "content", None).await;

    let shown = state
        .posts
        .show(
            view.post.id,
            None,
            Some("203.0.113.7".to_string()),
            Some("test-agent".to_string()),
        )
        .await
        .expect("show post");
    assert_eq!(shown.post.views_count, 1);

    let again = state
        .posts
        .show(view.post.id, Some(&author), None, None)
        .await
        .expect("show post again");
    assert_eq!(again.post.views_count, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn likes_are_idempotent_and_notify_the_author(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let author = signup(&state, "Ada", "ada", "ada@example.com").await;
    let reader = signup(&state, "Ben", "ben", "ben@example.com").await;
    let view = write_post(&state, &author, "Liked", "content", None).await;

    state
        .engagement
        .like_post(&reader, view.post.id)
        .await
        .expect("like");
    // A repeated like succeeds without inflating the counter.
    state
        .engagement
        .like_post(&reader, view.post.id)
        .await
        .expect("repeat like");

    let post = PostsRepo::find_by_id(state.db.as_ref(), view.post.id)
        .await
        .expect("reload")
        .expect("post exists");
    assert_eq!(post.likes_count, 1);

    let feed = state.notifications.list(author.id).await.expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].notification.action, NotificationAction::Like);
    assert_eq!(feed[0].actor.id, reader.id);
    assert_eq!(
        feed[0].notification.target_url.as_deref(),
        Some(format!("/post/{}", view.post.id).as_str())
    );

    state
        .engagement
        .unlike_post(&reader, view.post.id)
        .await
        .expect("unlike");
    assert!(matches!(
        state.engagement.unlike_post(&reader, view.post.id).await,
        Err(EngagementError::LikeNotFound)
    ));

    let post = PostsRepo::find_by_id(state.db.as_ref(), view.post.id)
        .await
        .expect("reload")
        .expect("post exists");
    assert_eq!(post.likes_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn self_likes_stay_silent(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let author = signup(&state, "Ada", "ada", "ada@example.com").await;
    let view = write_post(&state, &author, "Own", "content", None).await;

    state
        .engagement
        .like_post(&author, view.post.id)
        .await
        .expect("self like");

    let feed = state.notifications.list(author.id).await.expect("feed");
    assert!(feed.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn reposts_toggle_and_notify(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let author = signup(&state, "Ada", "ada", "ada@example.com").await;
    let reader = signup(&state, "Ben", "ben", "ben@example.com").await;
    let view = write_post(&state, &author, "Reposted", "content", None).await;

    state
        .engagement
        .repost(&reader, view.post.id)
        .await
        .expect("repost");
    state
        .engagement
        .repost(&reader, view.post.id)
        .await
        .expect("repeat repost");

    let post = PostsRepo::find_by_id(state.db.as_ref(), view.post.id)
        .await
        .expect("reload")
        .expect("post exists");
    assert_eq!(post.reposts_count, 1);

    let feed = state.notifications.list(author.id).await.expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].notification.action, NotificationAction::Repost);

    state
        .engagement
        .unrepost(&reader, view.post.id)
        .await
        .expect("unrepost");
    assert!(matches!(
        state.engagement.unrepost(&reader, view.post.id).await,
        Err(EngagementError::RepostNotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn comments_move_the_counter_and_notify(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let author = signup(&state, "Ada", "ada", "ada@example.com").await;
    let reader = signup(&state, "Ben", "ben", "ben@example.com").await;
    let view = write_post(&state, &author, "Discussed", "content", None).await;

    let comment = state
        .comments
        .create(&reader, view.post.id, "  lovely meter  ")
        .await
        .expect("comment");
    assert_eq!(comment.comment.content, "lovely meter");

    let post = PostsRepo::find_by_id(state.db.as_ref(), view.post.id)
        .await
        .expect("reload")
        .expect("post exists");
    assert_eq!(post.comments_count, 1);

    let feed = state.notifications.list(author.id).await.expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].notification.action, NotificationAction::Comment);

    // Comment likes ride the polymorphic join.
    state
        .engagement
        .like_comment(&author, comment.comment.id)
        .await
        .expect("like comment");
    let listed = state
        .comments
        .list_for_post(view.post.id, Some(&author))
        .await
        .expect("list comments");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].comment.likes_count, 1);
    assert!(listed[0].liked_by_current_user);

    // Only the comment author may remove it.
    assert!(state.comments.delete(&author, comment.comment.id).await.is_err());
    state
        .comments
        .delete(&reader, comment.comment.id)
        .await
        .expect("delete comment");

    let post = PostsRepo::find_by_id(state.db.as_ref(), view.post.id)
        .await
        .expect("reload")
        .expect("post exists");
    assert_eq!(post.comments_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_post_cascades(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let author = signup(&state, "Ada", "ada", "ada@example.com").await;
    let reader = signup(&state, "Ben", "ben", "ben@example.com").await;
    let view = write_post(&state, &author, "Doomed", "content", Some("tagged")).await;

    let comment = state
        .comments
        .create(&reader, view.post.id, "soon gone")
        .await
        .expect("comment");
    state
        .engagement
        .like_post(&reader, view.post.id)
        .await
        .expect("like");
    state
        .engagement
        .like_comment(&author, comment.comment.id)
        .await
        .expect("like comment");

    state
        .posts
        .delete(&author, view.post.id)
        .await
        .expect("delete post");

    assert!(
        PostsRepo::find_by_id(state.db.as_ref(), view.post.id)
            .await
            .expect("query")
            .is_none()
    );
    let orphan = CommentsRepo::find_by_id(state.db.as_ref(), comment.comment.id)
        .await
        .expect("query comment");
    assert!(orphan.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn follow_graph_enforces_its_rules(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Ada", "ada", "ada@example.com").await;
    let ben = signup(&state, "Ben", "ben", "ben@example.com").await;

    assert!(matches!(
        state.follows.follow(&ada, "ada").await,
        Err(FollowError::SelfFollow)
    ));
    assert!(matches!(
        state.follows.follow(&ada, "ghost").await,
        Err(FollowError::UserNotFound)
    ));

    state.follows.follow(&ada, "ben").await.expect("follow");
    assert!(matches!(
        state.follows.follow(&ada, "ben").await,
        Err(FollowError::AlreadyFollowing)
    ));

    let feed = state.notifications.list(ben.id).await.expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].notification.action, NotificationAction::Follow);
    assert_eq!(
        feed[0].notification.target_url.as_deref(),
        Some("/profile/ada")
    );

    state.follows.unfollow(&ada, "ben").await.expect("unfollow");
    assert!(matches!(
        state.follows.unfollow(&ada, "ben").await,
        Err(FollowError::NotFollowing)
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn following_feed_shows_followed_authors_only(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Ada", "ada", "ada@example.com").await;
    let ben = signup(&state, "Ben", "ben", "ben@example.com").await;
    let cleo = signup(&state, "Cleo", "cleo", "cleo@example.com").await;

    write_post(&state, &ben, "From Ben", "content", None).await;
    write_post(&state, &cleo, "From Cleo", "content", None).await;

    state.follows.follow(&ada, "ben").await.expect("follow");

    let feed = state.posts.following(&ada).await.expect("following feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].post.title, "From Ben");
    assert_eq!(feed[0].author.username, "ben");
}

#[sqlx::test(migrations = "./migrations")]
async fn profiles_report_counts_and_follow_state(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Ada", "ada", "ada@example.com").await;
    let ben = signup(&state, "Ben", "ben", "ben@example.com").await;

    write_post(&state, &ada, "One", "content", None).await;
    write_post(&state, &ada, "Two", "content", None).await;
    state.follows.follow(&ben, "ada").await.expect("follow");

    let profile = state
        .profiles
        .show("ada", Some(&ben))
        .await
        .expect("profile");
    assert_eq!(profile.counts.posts, 2);
    assert_eq!(profile.counts.followers, 1);
    assert_eq!(profile.counts.following, 0);
    assert!(profile.is_following);
    assert!(!profile.is_current_user);
    assert_eq!(profile.posts.len(), 2);

    let own = state.profiles.show("ada", Some(&ada)).await.expect("own");
    assert!(own.is_current_user);
    assert!(!own.is_following);
}

#[sqlx::test(migrations = "./migrations")]
async fn liked_posts_respect_the_privacy_flag(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Ada", "ada", "ada@example.com").await;
    let ben = signup(&state, "Ben", "ben", "ben@example.com").await;
    let view = write_post(&state, &ben, "Liked by Ada", "content", None).await;

    state
        .engagement
        .like_post(&ada, view.post.id)
        .await
        .expect("like");

    let visible = state
        .profiles
        .liked_posts("ada", &ben)
        .await
        .expect("public likes");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].post.id, view.post.id);

    let ada = state
        .users
        .update_profile(
            &ada,
            UpdateProfileCommand {
                name: "Ada".to_string(),
                bio: None,
                public_likes: Some(false),
            },
        )
        .await
        .expect("hide likes");

    assert!(matches!(
        state.profiles.liked_posts("ada", &ben).await,
        Err(ProfileError::LikesPrivate)
    ));
    let own = state
        .profiles
        .liked_posts("ada", &ada)
        .await
        .expect("own likes stay visible");
    assert_eq!(own.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn collections_enforce_ownership_and_privacy(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Ada", "ada", "ada@example.com").await;
    let ben = signup(&state, "Ben", "ben", "ben@example.com").await;
    let view = write_post(&state, &ada, "Collected", "content", None).await;

    let collection = state
        .collections
        .create(
            &ada,
            UpsertCollectionCommand {
                name: "Favorites".to_string(),
                description: Some("kept verses".to_string()),
                is_private: true,
            },
        )
        .await
        .expect("create collection");

    state
        .collections
        .add_post(&ada, collection.id, view.post.id)
        .await
        .expect("add post");
    assert!(matches!(
        state
            .collections
            .add_post(&ada, collection.id, view.post.id)
            .await,
        Err(CollectionError::AlreadyPresent)
    ));

    let detail = state
        .collections
        .show(collection.id, Some(&ada))
        .await
        .expect("owner sees private collection");
    assert_eq!(detail.posts.len(), 1);

    assert!(matches!(
        state.collections.show(collection.id, Some(&ben)).await,
        Err(CollectionError::Private)
    ));
    assert!(matches!(
        state.collections.show(collection.id, None).await,
        Err(CollectionError::Private)
    ));
    assert!(matches!(
        state
            .collections
            .add_post(&ben, collection.id, view.post.id)
            .await,
        Err(CollectionError::Unauthorized)
    ));

    state
        .collections
        .remove_post(&ada, collection.id, view.post.id)
        .await
        .expect("remove post");
    assert!(matches!(
        state
            .collections
            .remove_post(&ada, collection.id, view.post.id)
            .await,
        Err(CollectionError::NotPresent)
    ));

    let listed = state.collections.list(&ada).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].posts_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn search_spans_posts_users_and_tags(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Aurora Poet", "aurora", "aurora@example.com").await;
    write_post(&state, &ada, "Aurora over the bay", "northern light", Some("aurora,sky")).await;
    write_post(&state, &ada, "Unrelated", "but the aurora returns", None).await;
    write_post(&state, &ada, "Silence", "nothing here", None).await;

    let results = state
        .search
        .search("aurora", None, None)
        .await
        .expect("search");
    assert_eq!(results.posts.len(), 2);
    assert_eq!(results.users.len(), 1);
    assert_eq!(results.users[0].user.username, "aurora");
    assert_eq!(results.users[0].counts.posts, 3);
    assert_eq!(results.tags.len(), 1);
    assert_eq!(results.tags[0].name, "aurora");
    assert_eq!(results.tags[0].posts_count, 1);

    let blank = state.search.search("   ", None, None).await.expect("blank");
    assert!(blank.posts.is_empty());
    assert!(blank.users.is_empty());
    assert!(blank.tags.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn search_can_exclude_a_collection_for_its_owner(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Ada", "ada", "ada@example.com").await;
    let ben = signup(&state, "Ben", "ben", "ben@example.com").await;
    let kept = write_post(&state, &ada, "Kept verse", "verse", None).await;
    write_post(&state, &ada, "Loose verse", "verse", None).await;

    let collection = state
        .collections
        .create(
            &ada,
            UpsertCollectionCommand {
                name: "Kept".to_string(),
                description: None,
                is_private: false,
            },
        )
        .await
        .expect("collection");
    state
        .collections
        .add_post(&ada, collection.id, kept.post.id)
        .await
        .expect("add");

    let filtered = state
        .search
        .search("verse", Some(collection.id), Some(&ada))
        .await
        .expect("filtered search");
    assert_eq!(filtered.posts.len(), 1);
    assert_eq!(filtered.posts[0].post.title, "Loose verse");

    // Someone else's collection id does not filter.
    let unfiltered = state
        .search
        .search("verse", Some(collection.id), Some(&ben))
        .await
        .expect("unfiltered search");
    assert_eq!(unfiltered.posts.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn analytics_reports_totals_and_zero_filled_days(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Ada", "ada", "ada@example.com").await;
    let ben = signup(&state, "Ben", "ben", "ben@example.com").await;

    let first = write_post(&state, &ada, "First", "content", None).await;
    write_post(&state, &ada, "Second", "content", None).await;

    state
        .posts
        .show(first.post.id, Some(&ben), None, None)
        .await
        .expect("view");
    state
        .engagement
        .like_post(&ben, first.post.id)
        .await
        .expect("like");
    state.follows.follow(&ben, "ada").await.expect("follow");

    let report = state
        .analytics
        .report(&ada, AnalyticsRange::SevenDays)
        .await
        .expect("report");

    assert_eq!(report.range, "7days");
    assert_eq!(report.overview.total_posts, 2);
    assert_eq!(report.overview.total_views, 1);
    assert_eq!(report.overview.total_likes, 1);
    assert_eq!(report.overview.followers_count, 1);
    assert!((report.engagement_rate - 1.0).abs() < f64::EPSILON);

    // Every calendar day from range start through today is present.
    assert_eq!(report.engagement_by_day.len(), 8);
    let today = report.engagement_by_day.last().expect("today bucket");
    assert_eq!(today.likes, 1);

    assert_eq!(report.posts_by_day.len(), 1);
    assert_eq!(report.posts_by_day[0].posts, 2);
    assert_eq!(report.views_by_day.len(), 1);
    assert_eq!(report.views_by_day[0].views, 1);

    assert_eq!(report.top_posts.len(), 2);
    assert_eq!(report.top_posts[0].title, "First");

    assert_eq!(report.engagement_distribution[0].name, "Likes");
    assert!((report.engagement_distribution[0].value - 1.0).abs() < f64::EPSILON);
    assert_eq!(report.engagement_distribution[1].value, 0.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn notifications_feed_marks_read(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let ada = signup(&state, "Ada", "ada", "ada@example.com").await;
    let ben = signup(&state, "Ben", "ben", "ben@example.com").await;
    let view = write_post(&state, &ada, "Busy", "content", None).await;

    state
        .engagement
        .like_post(&ben, view.post.id)
        .await
        .expect("like");
    state
        .comments
        .create(&ben, view.post.id, "nice")
        .await
        .expect("comment");

    let feed = state.notifications.list(ada.id).await.expect("feed");
    assert_eq!(feed.len(), 2);
    assert!(feed.iter().all(|row| !row.notification.read));

    state
        .notifications
        .mark_read(ada.id, feed[0].notification.id)
        .await
        .expect("mark read");
    // Another user cannot mark someone else's notification.
    assert!(
        state
            .notifications
            .mark_read(ben.id, feed[1].notification.id)
            .await
            .is_err()
    );

    state
        .notifications
        .mark_all_read(ada.id)
        .await
        .expect("mark all");
    let feed = state.notifications.list(ada.id).await.expect("feed");
    assert!(feed.iter().all(|row| row.notification.read));
}

#[sqlx::test(migrations = "./migrations")]
async fn router_signup_sets_a_usable_session_cookie(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let router = http::build_router(state);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/signup")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Ada",
                        "username": "Ada_Poet",
                        "email": "ada@example.com",
                        "password": "stanza-secret",
                    })
                    .to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .expect("cookie header")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string();
    assert!(cookie.starts_with("dp_session=dp_"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let account: serde_json::Value = serde_json::from_slice(&body).expect("account json");
    assert_eq!(account["username"], "ada_poet");
    assert_eq!(account["email"], "ada@example.com");

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/me")
                .header(axum::http::header::COOKIE, cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let me: serde_json::Value = serde_json::from_slice(&body).expect("me json");
    assert_eq!(me["username"], "ada_poet");
}

#[sqlx::test(migrations = "./migrations")]
async fn router_guards_sessions_and_reports_health(pool: PgPool) {
    let (state, _uploads) = build_state(pool);
    let router = http::build_router(state);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/me")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/posts")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn router_rate_limits_per_caller(pool: PgPool) {
    let (state, _uploads) = build_state_with_limit(pool, 2);
    let router = http::build_router(state);

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/posts")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/posts")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
}
