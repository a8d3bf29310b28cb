use crate::application::repos::RepoError;

/// Collapse sqlx's error surface into the repository error classes the
/// services branch on.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    let sqlx::Error::Database(db) = err else {
        return match err {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            other => RepoError::from_persistence(other),
        };
    };

    let message = db.message();
    if message.contains("duplicate key") {
        return RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        };
    }
    if message.contains("violates foreign key constraint")
        || message.contains("invalid input syntax")
    {
        return RepoError::InvalidInput {
            message: message.to_string(),
        };
    }
    if message.contains("canceling statement due to user request") {
        return RepoError::Timeout;
    }
    if message.contains("violates") {
        return RepoError::Integrity {
            message: message.to_string(),
        };
    }

    RepoError::from_persistence(message)
}
