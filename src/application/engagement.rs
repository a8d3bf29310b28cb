//! Like and repost toggles with their denormalized counters.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::notifications::{NotificationError, NotificationService};
use crate::application::repos::{CommentsRepo, EngagementRepo, PostsRepo, RepoError};
use crate::domain::entities::UserRecord;
use crate::domain::types::LikeTargetType;

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("post not found")]
    PostNotFound,
    #[error("comment not found")]
    CommentNotFound,
    #[error("like not found")]
    LikeNotFound,
    #[error("repost not found")]
    RepostNotFound,
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct EngagementService {
    engagement: Arc<dyn EngagementRepo>,
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    notifications: NotificationService,
}

impl EngagementService {
    pub fn new(
        engagement: Arc<dyn EngagementRepo>,
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            engagement,
            posts,
            comments,
            notifications,
        }
    }

    /// Idempotent: a repeated like succeeds without moving the counter.
    pub async fn like_post(&self, actor: &UserRecord, post_id: Uuid)
    -> Result<(), EngagementError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(EngagementError::PostNotFound)?;

        let inserted = self
            .engagement
            .insert_like(actor.id, LikeTargetType::Post, post.id)
            .await?;

        if inserted {
            self.notifications.post_liked(actor, &post).await?;
        }
        Ok(())
    }

    pub async fn unlike_post(&self, actor: &UserRecord, post_id: Uuid)
    -> Result<(), EngagementError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(EngagementError::PostNotFound)?;

        let removed = self
            .engagement
            .remove_like(actor.id, LikeTargetType::Post, post_id)
            .await?;
        if removed {
            Ok(())
        } else {
            Err(EngagementError::LikeNotFound)
        }
    }

    pub async fn like_comment(
        &self,
        actor: &UserRecord,
        comment_id: Uuid,
    ) -> Result<(), EngagementError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or(EngagementError::CommentNotFound)?;

        let inserted = self
            .engagement
            .insert_like(actor.id, LikeTargetType::Comment, comment.id)
            .await?;

        if inserted {
            self.notifications.comment_liked(actor, &comment).await?;
        }
        Ok(())
    }

    pub async fn unlike_comment(
        &self,
        actor: &UserRecord,
        comment_id: Uuid,
    ) -> Result<(), EngagementError> {
        self.comments
            .find_by_id(comment_id)
            .await?
            .ok_or(EngagementError::CommentNotFound)?;

        let removed = self
            .engagement
            .remove_like(actor.id, LikeTargetType::Comment, comment_id)
            .await?;
        if removed {
            Ok(())
        } else {
            Err(EngagementError::LikeNotFound)
        }
    }

    pub async fn repost(&self, actor: &UserRecord, post_id: Uuid)
    -> Result<(), EngagementError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(EngagementError::PostNotFound)?;

        let inserted = self.engagement.insert_repost(actor.id, post.id).await?;
        if inserted {
            self.notifications.post_reposted(actor, &post).await?;
        }
        Ok(())
    }

    pub async fn unrepost(&self, actor: &UserRecord, post_id: Uuid)
    -> Result<(), EngagementError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(EngagementError::PostNotFound)?;

        let removed = self.engagement.remove_repost(actor.id, post_id).await?;
        if removed {
            Ok(())
        } else {
            Err(EngagementError::RepostNotFound)
        }
    }
}
