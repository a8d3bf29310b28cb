//! Follow relationships between users.

use std::sync::Arc;

use thiserror::Error;

use crate::application::notifications::{NotificationError, NotificationService};
use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("user not found")]
    UserNotFound,
    #[error("you cannot follow yourself")]
    SelfFollow,
    #[error("is already following this user")]
    AlreadyFollowing,
    #[error("you are not following this user")]
    NotFollowing,
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FollowService {
    follows: Arc<dyn FollowsRepo>,
    users: Arc<dyn UsersRepo>,
    notifications: NotificationService,
}

impl FollowService {
    pub fn new(
        follows: Arc<dyn FollowsRepo>,
        users: Arc<dyn UsersRepo>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            follows,
            users,
            notifications,
        }
    }

    pub async fn follow(&self, actor: &UserRecord, username: &str) -> Result<(), FollowError> {
        let target = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FollowError::UserNotFound)?;

        if target.id == actor.id {
            return Err(FollowError::SelfFollow);
        }

        let inserted = self.follows.insert_follow(actor.id, target.id).await?;
        if !inserted {
            return Err(FollowError::AlreadyFollowing);
        }

        self.notifications.user_followed(actor, &target).await?;
        Ok(())
    }

    pub async fn unfollow(&self, actor: &UserRecord, username: &str) -> Result<(), FollowError> {
        let target = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FollowError::UserNotFound)?;

        let removed = self.follows.remove_follow(actor.id, target.id).await?;
        if removed {
            Ok(())
        } else {
            Err(FollowError::NotFollowing)
        }
    }

    pub async fn is_following(
        &self,
        follower: &UserRecord,
        followed: &UserRecord,
    ) -> Result<bool, FollowError> {
        self.follows
            .is_following(follower.id, followed.id)
            .await
            .map_err(FollowError::from)
    }
}
