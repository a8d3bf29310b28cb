//! Account lifecycle: signup, credential checks, profile updates.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{CreateUserParams, RepoError, UpdateProfileParams, UsersRepo};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::users::{
    normalize_handle, validate_bio, validate_email, validate_name, validate_password,
    validate_username,
};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DomainError> for UserError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => UserError::Validation(message),
            other => UserError::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignupCommand {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct UpdateProfileCommand {
    pub name: String,
    pub bio: Option<String>,
    pub public_likes: Option<bool>,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UsersRepo>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UsersRepo>) -> Self {
        Self { repo }
    }

    pub async fn signup(&self, cmd: SignupCommand) -> Result<UserRecord, UserError> {
        let name = cmd.name.trim().to_string();
        let username = normalize_handle(&cmd.username);
        let email = normalize_handle(&cmd.email);

        validate_name(&name)?;
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&cmd.password)?;

        let hashed_password = Self::hash_password(&cmd.password)?;

        self.repo
            .create_user(CreateUserParams {
                email,
                hashed_password,
                name,
                username,
                bio: None,
            })
            .await
            .map_err(Self::map_unique_violation)
    }

    /// Credential check for login. The same error covers an unknown email
    /// and a wrong password so the response does not reveal which failed.
    pub async fn authenticate(&self, email: &str, password: &str)
    -> Result<UserRecord, UserError> {
        let email = normalize_handle(email);
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if Self::verify_password(password, &user.hashed_password) {
            Ok(user)
        } else {
            Err(UserError::InvalidCredentials)
        }
    }

    pub async fn update_profile(
        &self,
        user: &UserRecord,
        cmd: UpdateProfileCommand,
    ) -> Result<UserRecord, UserError> {
        let name = cmd.name.trim().to_string();
        validate_name(&name)?;

        let bio = cmd.bio.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        });
        if let Some(bio) = bio.as_deref() {
            validate_bio(bio)?;
        }

        self.repo
            .update_profile(UpdateProfileParams {
                id: user.id,
                name,
                bio,
                public_likes: cmd.public_likes.unwrap_or(user.public_likes),
            })
            .await
            .map_err(UserError::from)
    }

    pub async fn update_password(
        &self,
        user: &UserRecord,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        if !Self::verify_password(current_password, &user.hashed_password) {
            return Err(UserError::Validation(
                "current password is incorrect".to_string(),
            ));
        }
        validate_password(new_password)?;

        let hashed = Self::hash_password(new_password)?;
        self.repo.update_password(user.id, &hashed).await?;
        Ok(())
    }

    pub async fn set_avatar(
        &self,
        user_id: Uuid,
        avatar_path: Option<&str>,
    ) -> Result<UserRecord, UserError> {
        self.repo
            .update_avatar(user_id, avatar_path)
            .await
            .map_err(UserError::from)
    }

    fn hash_password(password: &str) -> Result<String, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| UserError::Hashing(err.to_string()))
    }

    fn verify_password(password: &str, hashed: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn map_unique_violation(err: RepoError) -> UserError {
        match err {
            RepoError::Duplicate { constraint } if constraint.contains("email") => {
                UserError::Validation("email has already been taken".to_string())
            }
            RepoError::Duplicate { constraint } if constraint.contains("username") => {
                UserError::Validation("username has already been taken".to_string())
            }
            other => UserError::Repo(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_round_trip() {
        let hashed = UserService::hash_password("stanza-secret").expect("hash");
        assert!(hashed.starts_with("$argon2"));
        assert!(UserService::verify_password("stanza-secret", &hashed));
        assert!(!UserService::verify_password("wrong-secret", &hashed));
    }

    #[test]
    fn garbage_stored_hash_never_verifies() {
        assert!(!UserService::verify_password("anything", "not-a-phc-string"));
    }
}
