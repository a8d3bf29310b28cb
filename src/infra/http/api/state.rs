use std::sync::Arc;

use crate::application::analytics::AnalyticsService;
use crate::application::collections::CollectionService;
use crate::application::comments::CommentService;
use crate::application::engagement::EngagementService;
use crate::application::follows::FollowService;
use crate::application::notifications::NotificationService;
use crate::application::posts::PostService;
use crate::application::profiles::ProfileService;
use crate::application::search::SearchService;
use crate::application::sessions::SessionService;
use crate::application::users::UserService;
use crate::infra::db::PostgresRepositories;
use crate::infra::uploads::UploadStorage;

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub sessions: SessionService,
    pub users: UserService,
    pub profiles: ProfileService,
    pub posts: PostService,
    pub comments: CommentService,
    pub engagement: EngagementService,
    pub follows: FollowService,
    pub collections: CollectionService,
    pub notifications: NotificationService,
    pub search: SearchService,
    pub analytics: AnalyticsService,
    pub db: Arc<PostgresRepositories>,
    pub upload_storage: Arc<UploadStorage>,
    pub rate_limiter: Arc<ApiRateLimiter>,
    /// Whether session cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
    pub upload_limit_bytes: u64,
}
