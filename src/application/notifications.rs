//! Notification generation and the read/unread feed.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    CreateNotificationParams, NotificationWithActor, NotificationsRepo, RepoError,
};
use crate::domain::entities::{CommentRecord, PostRecord, UserRecord};
use crate::domain::types::{NotificationAction, NotificationTargetType};

const FEED_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationsRepo>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationsRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<NotificationWithActor>, NotificationError> {
        self.repo
            .list_for_user(user_id, FEED_LIMIT)
            .await
            .map_err(NotificationError::from)
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<(), NotificationError> {
        if self.repo.mark_read(id, user_id).await? {
            Ok(())
        } else {
            Err(NotificationError::NotFound)
        }
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<(), NotificationError> {
        self.repo.mark_all_read(user_id).await?;
        Ok(())
    }

    /// Like on a post. Self-likes are silent.
    pub async fn post_liked(
        &self,
        actor: &UserRecord,
        post: &PostRecord,
    ) -> Result<(), NotificationError> {
        if actor.id == post.user_id {
            return Ok(());
        }
        self.record(CreateNotificationParams {
            user_id: post.user_id,
            actor_id: actor.id,
            action: NotificationAction::Like,
            content: format!("{} liked your post", actor.name),
            target_type: NotificationTargetType::Post,
            target_id: post.id,
            target_url: Some(format!("/post/{}", post.id)),
        })
        .await
    }

    pub async fn comment_liked(
        &self,
        actor: &UserRecord,
        comment: &CommentRecord,
    ) -> Result<(), NotificationError> {
        if actor.id == comment.user_id {
            return Ok(());
        }
        self.record(CreateNotificationParams {
            user_id: comment.user_id,
            actor_id: actor.id,
            action: NotificationAction::Like,
            content: format!("{} liked your comment", actor.name),
            target_type: NotificationTargetType::Comment,
            target_id: comment.id,
            target_url: Some(format!("/post/{}", comment.post_id)),
        })
        .await
    }

    pub async fn post_commented(
        &self,
        actor: &UserRecord,
        post: &PostRecord,
        comment: &CommentRecord,
    ) -> Result<(), NotificationError> {
        if actor.id == post.user_id {
            return Ok(());
        }
        self.record(CreateNotificationParams {
            user_id: post.user_id,
            actor_id: actor.id,
            action: NotificationAction::Comment,
            content: format!("{} commented on your post", actor.name),
            target_type: NotificationTargetType::Comment,
            target_id: comment.id,
            target_url: Some(format!("/post/{}", post.id)),
        })
        .await
    }

    pub async fn post_reposted(
        &self,
        actor: &UserRecord,
        post: &PostRecord,
    ) -> Result<(), NotificationError> {
        if actor.id == post.user_id {
            return Ok(());
        }
        self.record(CreateNotificationParams {
            user_id: post.user_id,
            actor_id: actor.id,
            action: NotificationAction::Repost,
            content: format!("{} reposted your post", actor.name),
            target_type: NotificationTargetType::Post,
            target_id: post.id,
            target_url: Some(format!("/post/{}", post.id)),
        })
        .await
    }

    pub async fn user_followed(
        &self,
        actor: &UserRecord,
        followed: &UserRecord,
    ) -> Result<(), NotificationError> {
        self.record(CreateNotificationParams {
            user_id: followed.id,
            actor_id: actor.id,
            action: NotificationAction::Follow,
            content: format!("{} followed you", actor.name),
            target_type: NotificationTargetType::User,
            target_id: actor.id,
            target_url: Some(format!("/profile/{}", actor.username)),
        })
        .await
    }

    async fn record(&self, params: CreateNotificationParams) -> Result<(), NotificationError> {
        self.repo.create_notification(params).await?;
        Ok(())
    }
}
