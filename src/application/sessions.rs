//! DB-backed session tokens delivered as an HttpOnly cookie.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{CreateSessionParams, RepoError, SessionsRepo, UsersRepo};
use crate::domain::entities::UserRecord;

pub const SESSION_COOKIE: &str = "dp_session";

const TOKEN_PREFIX: &str = "dp";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Error)]
pub enum SessionAuthError {
    #[error("missing session token")]
    Missing,
    #[error("invalid session token")]
    Invalid,
    #[error("expired session")]
    Expired,
    #[error("revoked session")]
    Revoked,
}

#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub session_id: Uuid,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// The authenticated caller: the session row plus its owning user.
#[derive(Debug, Clone)]
pub struct SessionPrincipal {
    pub session_id: Uuid,
    pub user: UserRecord,
}

#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionsRepo>,
    users: Arc<dyn UsersRepo>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionsRepo>, users: Arc<dyn UsersRepo>, ttl: Duration) -> Self {
        Self {
            sessions,
            users,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open a session for the user and return the opaque token to set in the
    /// cookie. Only the SHA-256 of the secret half is persisted.
    pub async fn issue(&self, user_id: Uuid) -> Result<SessionIssued, SessionError> {
        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");
        let hashed_secret = Self::hash_secret(&secret);
        let expires_at = OffsetDateTime::now_utc() + self.ttl;

        let record = self
            .sessions
            .create_session(CreateSessionParams {
                user_id,
                prefix,
                hashed_secret,
                expires_at,
            })
            .await?;

        Ok(SessionIssued {
            session_id: record.id,
            token,
            expires_at,
        })
    }

    pub async fn revoke(&self, session_id: Uuid) -> Result<(), SessionError> {
        let now = OffsetDateTime::now_utc();
        self.sessions.revoke_session(session_id, now).await?;
        Ok(())
    }

    pub async fn authenticate(&self, token: &str) -> Result<SessionPrincipal, SessionAuthError> {
        let parsed = Self::parse_token(token).ok_or(SessionAuthError::Invalid)?;
        let record = self
            .sessions
            .find_by_prefix(&parsed.prefix)
            .await
            .map_err(|_| SessionAuthError::Invalid)?
            .ok_or(SessionAuthError::Invalid)?;

        let now = OffsetDateTime::now_utc();
        if let Some(revoked_at) = record.revoked_at
            && revoked_at <= now
        {
            return Err(SessionAuthError::Revoked);
        }
        if record.expires_at <= now {
            return Err(SessionAuthError::Expired);
        }

        let hashed_input = Self::hash_secret(&parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(SessionAuthError::Invalid);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await
            .map_err(|_| SessionAuthError::Invalid)?
            .ok_or(SessionAuthError::Invalid)?;

        Ok(SessionPrincipal {
            session_id: record.id,
            user,
        })
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.finalize().to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken> {
        let mut parts = token.splitn(3, '_');
        let prefix_tag = parts.next()?;
        if prefix_tag != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if secret.len() < MIN_SECRET_LEN || prefix.is_empty() {
            return None;
        }
        Some(ParsedToken {
            prefix: prefix.to_string(),
            secret: secret.to_string(),
        })
    }
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_shape_round_trips_through_parser() {
        let prefix = SessionService::generate_prefix();
        let secret = SessionService::generate_secret();
        let token = format!("dp_{prefix}_{secret}");
        let parsed = SessionService::parse_token(&token).expect("parse issued token");
        assert_eq!(parsed.prefix, prefix);
        assert_eq!(parsed.secret, secret);
    }

    #[test]
    fn foreign_or_truncated_tokens_are_rejected() {
        assert!(SessionService::parse_token("sk_abc_0123456789abcdef").is_none());
        assert!(SessionService::parse_token("dp_abc_short").is_none());
        assert!(SessionService::parse_token("dp_onlyprefix").is_none());
    }
}
