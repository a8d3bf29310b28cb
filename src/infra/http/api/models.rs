//! Request payloads and response shapes for the JSON API.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::application::collections::CollectionDetail;
use crate::application::comments::CommentView;
use crate::application::posts::PostView;
use crate::application::profiles::ProfileView;
use crate::application::repos::{
    CollectionWithCount, NotificationWithActor, TagHit,
};
use crate::application::search::{SearchResults, UserHit};
use crate::domain::entities::{CollectionRecord, PostRecord, UserRecord};
use crate::domain::types::{NotificationAction, NotificationTargetType};

pub fn avatar_url(avatar_path: Option<&str>) -> Option<String> {
    avatar_path.map(|path| format!("/avatars/{path}"))
}

pub fn audio_url(audio_path: Option<&str>) -> Option<String> {
    audio_path.map(|path| format!("/audio/{path}"))
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

// ---------- requests ----------

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub bio: Option<String>,
    pub public_likes: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    /// Comma-separated tag names, as the composer submits them.
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertCollectionRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddPostRequest {
    pub post_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub exclude_collection: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<String>,
}

// ---------- responses ----------

/// The author/actor card embedded in posts, comments, and notifications.
#[derive(Debug, Serialize)]
pub struct UserJson {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl UserJson {
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            avatar_url: avatar_url(user.avatar_path.as_deref()),
        }
    }
}

/// The signed-in user's own account, as returned by signup/login/me.
#[derive(Debug, Serialize)]
pub struct AccountJson {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub public_likes: bool,
    pub created_at: String,
}

impl AccountJson {
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            bio: user.bio.clone(),
            avatar_url: avatar_url(user.avatar_path.as_deref()),
            public_likes: user.public_likes,
            created_at: rfc3339(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostJson {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub has_audio: bool,
    pub audio_url: Option<String>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub reposts_count: i32,
    pub views_count: i32,
    pub liked_by_current_user: bool,
    pub reposted_by_current_user: bool,
    pub tags: Vec<String>,
    pub user: UserJson,
    pub created_at: String,
}

impl PostJson {
    pub fn from_view(view: PostView) -> Self {
        Self {
            id: view.post.id,
            title: view.post.title,
            content: view.post.content,
            excerpt: view.post.excerpt,
            has_audio: view.post.has_audio,
            audio_url: audio_url(view.post.audio_path.as_deref()),
            likes_count: view.post.likes_count,
            comments_count: view.post.comments_count,
            reposts_count: view.post.reposts_count,
            views_count: view.post.views_count,
            liked_by_current_user: view.liked_by_current_user,
            reposted_by_current_user: view.reposted_by_current_user,
            tags: view.tags,
            user: UserJson::from_record(&view.author),
            created_at: rfc3339(view.post.created_at),
        }
    }
}

/// Compact post card used inside profile payloads.
#[derive(Debug, Serialize)]
pub struct PostSummaryJson {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub has_audio: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    pub reposts_count: i32,
    pub views_count: i32,
    pub created_at: String,
}

impl PostSummaryJson {
    pub fn from_record(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            has_audio: post.has_audio,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            reposts_count: post.reposts_count,
            views_count: post.views_count,
            created_at: rfc3339(post.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileCard {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub joined_at: String,
    pub is_following: bool,
    pub is_current_user: bool,
}

/// The profile page payload: the card plus the user's posts.
#[derive(Debug, Serialize)]
pub struct ProfileJson {
    pub profile: ProfileCard,
    pub posts: Vec<PostSummaryJson>,
}

impl ProfileJson {
    pub fn from_view(view: &ProfileView) -> Self {
        Self {
            profile: ProfileCard {
                id: view.user.id,
                name: view.user.name.clone(),
                username: view.user.username.clone(),
                bio: view.user.bio.clone(),
                avatar_url: avatar_url(view.user.avatar_path.as_deref()),
                followers_count: view.counts.followers,
                following_count: view.counts.following,
                posts_count: view.counts.posts,
                joined_at: rfc3339(view.user.created_at),
                is_following: view.is_following,
                is_current_user: view.is_current_user,
            },
            posts: view.posts.iter().map(PostSummaryJson::from_record).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentJson {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub likes_count: i32,
    pub liked_by_current_user: bool,
    pub user: UserJson,
    pub created_at: String,
}

impl CommentJson {
    pub fn from_view(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            post_id: view.comment.post_id,
            content: view.comment.content,
            likes_count: view.comment.likes_count,
            liked_by_current_user: view.liked_by_current_user,
            user: UserJson::from_record(&view.author),
            created_at: rfc3339(view.comment.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionJson {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub posts_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl CollectionJson {
    pub fn from_record(record: &CollectionRecord, posts_count: i64) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            is_private: record.is_private,
            posts_count,
            created_at: rfc3339(record.created_at),
            updated_at: rfc3339(record.updated_at),
        }
    }

    pub fn from_counted(counted: &CollectionWithCount) -> Self {
        Self::from_record(&counted.record, counted.posts_count)
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionDetailJson {
    #[serde(flatten)]
    pub collection: CollectionJson,
    pub posts: Vec<PostJson>,
}

impl CollectionDetailJson {
    pub fn from_detail(detail: CollectionDetail) -> Self {
        let posts_count = detail.posts.len() as i64;
        Self {
            collection: CollectionJson::from_record(&detail.record, posts_count),
            posts: detail.posts.into_iter().map(PostJson::from_view).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationJson {
    pub id: Uuid,
    pub action: NotificationAction,
    pub content: String,
    pub target_type: NotificationTargetType,
    pub target_id: Uuid,
    pub target_url: Option<String>,
    pub read: bool,
    pub actor: UserJson,
    pub created_at: String,
}

impl NotificationJson {
    pub fn from_row(row: NotificationWithActor) -> Self {
        Self {
            id: row.notification.id,
            action: row.notification.action,
            content: row.notification.content,
            target_type: row.notification.target_type,
            target_id: row.notification.target_id,
            target_url: row.notification.target_url,
            read: row.notification.read,
            actor: UserJson::from_record(&row.actor),
            created_at: rfc3339(row.notification.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserHitJson {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

impl UserHitJson {
    pub fn from_hit(hit: &UserHit) -> Self {
        Self {
            id: hit.user.id,
            name: hit.user.name.clone(),
            username: hit.user.username.clone(),
            bio: hit.user.bio.clone(),
            avatar_url: avatar_url(hit.user.avatar_path.as_deref()),
            posts_count: hit.counts.posts,
            followers_count: hit.counts.followers,
            following_count: hit.counts.following,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagJson {
    pub name: String,
    pub posts_count: i64,
}

impl TagJson {
    pub fn from_hit(hit: &TagHit) -> Self {
        Self {
            name: hit.name.clone(),
            posts_count: hit.posts_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResultsJson {
    pub posts: Vec<PostJson>,
    pub users: Vec<UserHitJson>,
    pub tags: Vec<TagJson>,
}

impl SearchResultsJson {
    pub fn from_results(results: SearchResults) -> Self {
        Self {
            users: results.users.iter().map(UserHitJson::from_hit).collect(),
            tags: results.tags.iter().map(TagJson::from_hit).collect(),
            posts: results.posts.into_iter().map(PostJson::from_view).collect(),
        }
    }
}
