pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};

use crate::infra::http::middleware::log_responses;

pub fn build_api_router(state: ApiState) -> Router {
    let session_state = state.clone();
    let rate_state = state.clone();

    Router::new()
        .route("/api/v1/signup", post(handlers::signup))
        .route("/api/v1/login", post(handlers::login))
        .route("/api/v1/logout", delete(handlers::logout))
        .route("/api/v1/me", get(handlers::me))
        .route("/api/v1/users", put(handlers::update_user))
        .route("/api/v1/users/password", put(handlers::update_password))
        .route("/api/v1/users/avatar", put(handlers::update_avatar))
        .route("/api/v1/profiles/{username}", get(handlers::show_profile))
        .route(
            "/api/v1/profiles/{username}/liked_posts",
            get(handlers::liked_posts),
        )
        .route("/api/v1/profiles/{username}/follow", post(handlers::follow))
        .route(
            "/api/v1/profiles/{username}/unfollow",
            delete(handlers::unfollow),
        )
        .route(
            "/api/v1/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/api/v1/posts/featured", get(handlers::featured_posts))
        .route("/api/v1/posts/trending", get(handlers::trending_posts))
        .route("/api/v1/posts/recent", get(handlers::list_posts))
        .route("/api/v1/posts/following", get(handlers::following_posts))
        .route(
            "/api/v1/posts/{id}",
            get(handlers::show_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/api/v1/posts/{id}/audio",
            post(handlers::attach_audio).delete(handlers::detach_audio),
        )
        .route("/api/v1/posts/{id}/like", post(handlers::like_post))
        .route("/api/v1/posts/{id}/unlike", delete(handlers::unlike_post))
        .route("/api/v1/posts/{id}/repost", post(handlers::repost))
        .route("/api/v1/posts/{id}/unrepost", delete(handlers::unrepost))
        .route(
            "/api/v1/posts/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/api/v1/comments/{id}", delete(handlers::delete_comment))
        .route("/api/v1/comments/{id}/like", post(handlers::like_comment))
        .route(
            "/api/v1/comments/{id}/unlike",
            delete(handlers::unlike_comment),
        )
        .route(
            "/api/v1/notifications",
            get(handlers::list_notifications),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            patch(handlers::mark_notification_read),
        )
        .route(
            "/api/v1/notifications/mark_all_read",
            post(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/v1/collections",
            get(handlers::list_collections).post(handlers::create_collection),
        )
        .route(
            "/api/v1/collections/{id}",
            get(handlers::show_collection)
                .put(handlers::update_collection)
                .delete(handlers::delete_collection),
        )
        .route(
            "/api/v1/collections/{id}/add_post",
            post(handlers::add_post_to_collection),
        )
        .route(
            "/api/v1/collections/{id}/remove_post/{post_id}",
            delete(handlers::remove_post_from_collection),
        )
        .route("/api/v1/search", get(handlers::search))
        .route("/api/v1/analytics", get(handlers::analytics))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::api_rate_limit,
        ))
        .layer(axum_middleware::from_fn_with_state(
            session_state,
            middleware::load_session,
        ))
        .layer(axum_middleware::from_fn(log_responses))
}
