//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::entities::{
    CollectionRecord, CommentRecord, NotificationRecord, PostRecord, SessionRecord, UserRecord,
};
use crate::domain::types::{LikeTargetType, NotificationAction, NotificationTargetType};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub email: String,
    pub hashed_password: String,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateProfileParams {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub public_likes: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileCounts {
    pub followers: i64,
    pub following: i64,
    pub posts: i64,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;
    async fn update_profile(&self, params: UpdateProfileParams) -> Result<UserRecord, RepoError>;
    async fn update_password(&self, id: Uuid, hashed_password: &str) -> Result<(), RepoError>;
    async fn update_avatar(
        &self,
        id: Uuid,
        avatar_path: Option<&str>,
    ) -> Result<UserRecord, RepoError>;
    async fn profile_counts(&self, id: Uuid) -> Result<ProfileCounts, RepoError>;
    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<UserRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub user_id: Uuid,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn create_session(&self, params: CreateSessionParams)
    -> Result<SessionRecord, RepoError>;
    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<SessionRecord>, RepoError>;
    async fn revoke_session(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    /// `Some` replaces the post's tag set, `None` leaves it untouched.
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct NewPostView {
    pub post_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A post joined with its author, the shape every feed renders from.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: PostRecord,
    pub author: UserRecord,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError>;
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
    async fn set_audio(
        &self,
        id: Uuid,
        audio_path: Option<&str>,
    ) -> Result<PostRecord, RepoError>;
    async fn list_latest(&self, limit: i64) -> Result<Vec<PostWithAuthor>, RepoError>;
    async fn list_top_liked(&self, limit: i64) -> Result<Vec<PostWithAuthor>, RepoError>;
    async fn list_by_author(&self, user_id: Uuid) -> Result<Vec<PostRecord>, RepoError>;
    async fn list_following(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PostWithAuthor>, RepoError>;
    async fn list_liked_by(&self, user_id: Uuid) -> Result<Vec<PostWithAuthor>, RepoError>;
    async fn record_view(&self, view: NewPostView) -> Result<(), RepoError>;
    async fn search_posts(
        &self,
        query: &str,
        exclude_collection: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<PostWithAuthor>, RepoError>;
    async fn liked_post_ids(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError>;
    async fn reposted_post_ids(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TagHit {
    pub name: String,
    pub posts_count: i64,
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn names_for_post(&self, post_id: Uuid) -> Result<Vec<String>, RepoError>;
    async fn names_for_posts(&self, post_ids: &[Uuid])
    -> Result<Vec<(Uuid, String)>, RepoError>;
    async fn search_tags(&self, query: &str, limit: i64) -> Result<Vec<TagHit>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: CommentRecord,
    pub author: UserRecord,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError>;
    /// Inserts the comment and bumps the post's denormalized comment counter
    /// in the same transaction.
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError>;
    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError>;
    async fn liked_comment_ids(
        &self,
        user_id: Uuid,
        comment_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError>;
}

#[async_trait]
pub trait EngagementRepo: Send + Sync {
    /// Insert-if-absent; returns whether a row was actually created. The
    /// denormalized counter on the target moves only on insertion.
    async fn insert_like(
        &self,
        user_id: Uuid,
        target_type: LikeTargetType,
        target_id: Uuid,
    ) -> Result<bool, RepoError>;
    async fn remove_like(
        &self,
        user_id: Uuid,
        target_type: LikeTargetType,
        target_id: Uuid,
    ) -> Result<bool, RepoError>;
    async fn insert_repost(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;
    async fn remove_repost(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    async fn insert_follow(&self, follower_id: Uuid, followed_id: Uuid)
    -> Result<bool, RepoError>;
    async fn remove_follow(&self, follower_id: Uuid, followed_id: Uuid)
    -> Result<bool, RepoError>;
    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid)
    -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateCollectionParams {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateCollectionParams {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
}

#[derive(Debug, Clone)]
pub struct CollectionWithCount {
    pub record: CollectionRecord,
    pub posts_count: i64,
}

#[async_trait]
pub trait CollectionsRepo: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CollectionWithCount>, RepoError>;
    async fn create_collection(
        &self,
        params: CreateCollectionParams,
    ) -> Result<CollectionRecord, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CollectionRecord>, RepoError>;
    async fn update_collection(
        &self,
        params: UpdateCollectionParams,
    ) -> Result<CollectionRecord, RepoError>;
    async fn delete_collection(&self, id: Uuid) -> Result<(), RepoError>;
    async fn add_post(&self, collection_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;
    async fn remove_post(&self, collection_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;
    async fn posts_for_collection(
        &self,
        collection_id: Uuid,
    ) -> Result<Vec<PostWithAuthor>, RepoError>;
    async fn posts_count(&self, collection_id: Uuid) -> Result<i64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateNotificationParams {
    pub user_id: Uuid,
    pub actor_id: Uuid,
    pub action: NotificationAction,
    pub content: String,
    pub target_type: NotificationTargetType,
    pub target_id: Uuid,
    pub target_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotificationWithActor {
    pub notification: NotificationRecord,
    pub actor: UserRecord,
}

#[async_trait]
pub trait NotificationsRepo: Send + Sync {
    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError>;
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<NotificationWithActor>, RepoError>;
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepoError>;
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostTotals {
    pub posts: i64,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub reposts: i64,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct DayCount {
    pub day: Date,
    pub count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopPostRow {
    pub id: Uuid,
    pub title: String,
    pub views: i32,
    pub likes: i32,
    pub comments: i32,
    pub reposts: i32,
}

#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn post_totals(&self, user_id: Uuid) -> Result<PostTotals, RepoError>;
    async fn follower_count(&self, user_id: Uuid) -> Result<i64, RepoError>;
    async fn posts_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError>;
    async fn views_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError>;
    async fn likes_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError>;
    async fn comments_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError>;
    async fn reposts_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError>;
    async fn top_posts(&self, user_id: Uuid, limit: i64) -> Result<Vec<TopPostRow>, RepoError>;
}
