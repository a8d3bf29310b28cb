//! Comments on posts, with the post's denormalized counter.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::notifications::{NotificationError, NotificationService};
use crate::application::repos::{
    CommentWithAuthor, CommentsRepo, CreateCommentParams, PostsRepo, RepoError,
};
use crate::domain::entities::{CommentRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::posts::validate_comment_content;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("post not found")]
    PostNotFound,
    #[error("comment not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DomainError> for CommentError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => CommentError::Validation(message),
            other => CommentError::Validation(other.to_string()),
        }
    }
}

/// A comment assembled for rendering: author plus the viewer's like flag.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: CommentRecord,
    pub author: UserRecord,
    pub liked_by_current_user: bool,
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentsRepo>,
    posts: Arc<dyn PostsRepo>,
    notifications: NotificationService,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentsRepo>,
        posts: Arc<dyn PostsRepo>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            comments,
            posts,
            notifications,
        }
    }

    pub async fn list_for_post(
        &self,
        post_id: Uuid,
        viewer: Option<&UserRecord>,
    ) -> Result<Vec<CommentView>, CommentError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(CommentError::PostNotFound);
        }

        let rows = self.comments.list_for_post(post_id).await?;
        self.assemble(rows, viewer).await
    }

    pub async fn create(
        &self,
        actor: &UserRecord,
        post_id: Uuid,
        content: &str,
    ) -> Result<CommentView, CommentError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(CommentError::PostNotFound)?;

        let content = content.trim().to_string();
        validate_comment_content(&content)?;

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                user_id: actor.id,
                post_id: post.id,
                content,
            })
            .await?;

        self.notifications
            .post_commented(actor, &post, &comment)
            .await?;

        Ok(CommentView {
            comment,
            author: actor.clone(),
            liked_by_current_user: false,
        })
    }

    /// Only the comment's own author may delete it.
    pub async fn delete(&self, actor: &UserRecord, id: Uuid) -> Result<(), CommentError> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or(CommentError::NotFound)?;
        if comment.user_id != actor.id {
            return Err(CommentError::Unauthorized);
        }
        self.comments.delete_comment(comment.id).await?;
        Ok(())
    }

    async fn assemble(
        &self,
        rows: Vec<CommentWithAuthor>,
        viewer: Option<&UserRecord>,
    ) -> Result<Vec<CommentView>, CommentError> {
        let liked: HashSet<Uuid> = match viewer {
            Some(user) => {
                let ids: Vec<Uuid> = rows.iter().map(|row| row.comment.id).collect();
                self.comments
                    .liked_comment_ids(user.id, &ids)
                    .await?
                    .into_iter()
                    .collect()
            }
            None => HashSet::new(),
        };

        Ok(rows
            .into_iter()
            .map(|row| CommentView {
                liked_by_current_user: liked.contains(&row.comment.id),
                comment: row.comment,
                author: row.author,
            })
            .collect())
    }
}
