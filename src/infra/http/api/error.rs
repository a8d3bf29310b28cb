use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::analytics::AnalyticsError;
use crate::application::collections::CollectionError;
use crate::application::comments::CommentError;
use crate::application::engagement::EngagementError;
use crate::application::error::ErrorReport;
use crate::application::follows::FollowError;
use crate::application::notifications::NotificationError;
use crate::application::posts::PostError;
use crate::application::profiles::ProfileError;
use crate::application::repos::RepoError;
use crate::application::search::SearchError;
use crate::application::users::UserError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const UNPROCESSABLE: &str = "unprocessable";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const UPLOAD: &str = "upload_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            hint,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, None)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Sign in required",
            None,
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, codes::FORBIDDEN, message, None)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    /// Validation failure, rendered with the offending message as the body.
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::UNPROCESSABLE,
            message,
            None,
        )
    }

    pub fn rate_limited(retry_after: u64) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: codes::RATE_LIMITED.to_string(),
                message: "Rate limit exceeded".to_string(),
                hint: Some(format!("Retry after {retry_after} seconds")),
            },
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, value);
        }
        ErrorReport::from_message(
            "infra::http::api::rate_limit",
            StatusCode::TOO_MANY_REQUESTS,
            format!("rate_limited: retry_after={retry_after}"),
        )
        .attach(&mut response);
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.clone(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(&self.message)),
        )
        .attach(&mut response);
        response
    }
}

pub fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

pub fn user_to_api(err: UserError) -> ApiError {
    match err {
        UserError::Validation(message) => ApiError::unprocessable(message),
        UserError::InvalidCredentials => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Invalid email or password",
            None,
        ),
        UserError::Hashing(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Credential processing failed",
            Some(message),
        ),
        UserError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn post_to_api(err: PostError) -> ApiError {
    match err {
        PostError::NotFound => ApiError::not_found("Post not found"),
        PostError::Unauthorized => ApiError::unauthorized(),
        PostError::Validation(message) => ApiError::unprocessable(message),
        PostError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn comment_to_api(err: CommentError) -> ApiError {
    match err {
        CommentError::PostNotFound => ApiError::not_found("Post not found"),
        CommentError::NotFound => ApiError::not_found("Comment not found"),
        CommentError::Unauthorized => ApiError::unauthorized(),
        CommentError::Validation(message) => ApiError::unprocessable(message),
        CommentError::Notification(err) => notification_to_api(err),
        CommentError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn engagement_to_api(err: EngagementError) -> ApiError {
    match err {
        EngagementError::PostNotFound => ApiError::not_found("Post not found"),
        EngagementError::CommentNotFound => ApiError::not_found("Comment not found"),
        EngagementError::LikeNotFound => ApiError::not_found("Like not found"),
        EngagementError::RepostNotFound => ApiError::not_found("Repost not found"),
        EngagementError::Notification(err) => notification_to_api(err),
        EngagementError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn follow_to_api(err: FollowError) -> ApiError {
    match err {
        FollowError::UserNotFound => ApiError::not_found("User not found"),
        FollowError::SelfFollow => ApiError::unprocessable("you cannot follow yourself"),
        FollowError::AlreadyFollowing => {
            ApiError::unprocessable("is already following this user")
        }
        FollowError::NotFollowing => ApiError::not_found("you are not following this user"),
        FollowError::Notification(err) => notification_to_api(err),
        FollowError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn profile_to_api(err: ProfileError) -> ApiError {
    match err {
        ProfileError::NotFound => ApiError::not_found("User not found"),
        ProfileError::LikesPrivate => {
            ApiError::forbidden("this user's liked posts are private")
        }
        ProfileError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn collection_to_api(err: CollectionError) -> ApiError {
    match err {
        CollectionError::NotFound => ApiError::not_found("Collection not found"),
        CollectionError::PostNotFound => ApiError::not_found("Post not found"),
        CollectionError::Private => ApiError::forbidden("this collection is private"),
        CollectionError::Unauthorized => ApiError::forbidden("not your collection"),
        CollectionError::AlreadyPresent => {
            ApiError::unprocessable("post is already in this collection")
        }
        CollectionError::NotPresent => ApiError::not_found("post is not in this collection"),
        CollectionError::Validation(message) => ApiError::unprocessable(message),
        CollectionError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn notification_to_api(err: NotificationError) -> ApiError {
    match err {
        NotificationError::NotFound => ApiError::not_found("Notification not found"),
        NotificationError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn session_to_api(err: crate::application::sessions::SessionError) -> ApiError {
    match err {
        crate::application::sessions::SessionError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn upload_to_api(err: crate::infra::uploads::UploadStorageError) -> ApiError {
    use crate::infra::uploads::UploadStorageError;
    match err {
        UploadStorageError::InvalidPath => ApiError::bad_request("invalid stored path"),
        UploadStorageError::EmptyPayload => ApiError::unprocessable("uploaded file is empty"),
        UploadStorageError::PayloadTooLarge { .. } => ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::UPLOAD,
            "uploaded file exceeds the configured limit",
            None,
        ),
        other => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::UPLOAD,
            "upload failed",
            Some(other.to_string()),
        ),
    }
}

pub fn search_to_api(err: SearchError) -> ApiError {
    match err {
        SearchError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn analytics_to_api(err: AnalyticsError) -> ApiError {
    match err {
        AnalyticsError::Repo(repo) => repo_to_api(repo),
    }
}
