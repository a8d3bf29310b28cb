//! User account validation and normalization.

use crate::domain::error::DomainError;

pub const BIO_MAX_CHARS: usize = 500;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 128;
pub const COLLECTION_NAME_MAX_CHARS: usize = 100;
pub const COLLECTION_DESCRIPTION_MAX_CHARS: usize = 500;

pub fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name can't be blank"));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.is_empty() {
        return Err(DomainError::validation("username can't be blank"));
    }
    if !username
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(DomainError::validation(
            "username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let mut parts = email.split('@');
    let local = parts.next().unwrap_or_default();
    let host = parts.next().unwrap_or_default();
    let valid = parts.next().is_none()
        && !local.is_empty()
        && !host.is_empty()
        && !email.contains(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(DomainError::validation("email is invalid"))
    }
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    let length = password.chars().count();
    if length < PASSWORD_MIN_CHARS {
        return Err(DomainError::validation(format!(
            "password is too short (minimum is {PASSWORD_MIN_CHARS} characters)"
        )));
    }
    if length > PASSWORD_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "password is too long (maximum is {PASSWORD_MAX_CHARS} characters)"
        )));
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), DomainError> {
    if bio.chars().count() > BIO_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "bio is too long (maximum is {BIO_MAX_CHARS} characters)"
        )));
    }
    Ok(())
}

/// Emails and usernames are stored lowercased so uniqueness is
/// case-insensitive.
pub fn normalize_handle(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rejects_punctuation() {
        assert!(validate_username("daily_poet9").is_ok());
        assert!(validate_username("daily-poet").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn email_requires_single_at_sign() {
        assert!(validate_email("poet@example.com").is_ok());
        assert!(validate_email("poet@").is_err());
        assert!(validate_email("poet example@x.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn password_length_window() {
        assert!(validate_password("verse1").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(PASSWORD_MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn handles_are_lowercased() {
        assert_eq!(normalize_handle("  Poet@Example.COM "), "poet@example.com");
    }
}
