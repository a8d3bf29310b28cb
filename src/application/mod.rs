//! Application services layer.

pub mod analytics;
pub mod collections;
pub mod comments;
pub mod engagement;
pub mod error;
pub mod follows;
pub mod notifications;
pub mod posts;
pub mod profiles;
pub mod repos;
pub mod search;
pub mod sessions;
pub mod users;
