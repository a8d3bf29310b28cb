mod analytics;
mod auth;
mod collections;
mod comments;
mod notifications;
mod posts;
mod profiles;
mod search;
mod users;

pub use analytics::*;
pub use auth::*;
pub use collections::*;
pub use comments::*;
pub use notifications::*;
pub use posts::*;
pub use profiles::*;
pub use search::*;
pub use users::*;
