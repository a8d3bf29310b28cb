//! Public profile pages and per-user liked posts.

use std::sync::Arc;

use thiserror::Error;

use crate::application::posts::{PostService, PostView};
use crate::application::repos::{FollowsRepo, PostsRepo, ProfileCounts, RepoError, UsersRepo};
use crate::domain::entities::{PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("user not found")]
    NotFound,
    #[error("this user's liked posts are private")]
    LikesPrivate,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Everything the profile page renders in one fetch.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub user: UserRecord,
    pub counts: ProfileCounts,
    pub is_following: bool,
    pub is_current_user: bool,
    pub posts: Vec<PostRecord>,
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UsersRepo>,
    posts: Arc<dyn PostsRepo>,
    follows: Arc<dyn FollowsRepo>,
    post_service: PostService,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        posts: Arc<dyn PostsRepo>,
        follows: Arc<dyn FollowsRepo>,
        post_service: PostService,
    ) -> Self {
        Self {
            users,
            posts,
            follows,
            post_service,
        }
    }

    pub async fn show(
        &self,
        username: &str,
        viewer: Option<&UserRecord>,
    ) -> Result<ProfileView, ProfileError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let counts = self.users.profile_counts(user.id).await?;
        let is_current_user = viewer.map(|v| v.id) == Some(user.id);
        let is_following = match viewer {
            Some(viewer) if !is_current_user => {
                self.follows.is_following(viewer.id, user.id).await?
            }
            _ => false,
        };
        let posts = self.posts.list_by_author(user.id).await?;

        Ok(ProfileView {
            user,
            counts,
            is_following,
            is_current_user,
            posts,
        })
    }

    /// Likes are public by default; a user who turned `public_likes` off only
    /// exposes the list to themselves.
    pub async fn liked_posts(
        &self,
        username: &str,
        viewer: &UserRecord,
    ) -> Result<Vec<PostView>, ProfileError> {
        let target = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(ProfileError::NotFound)?;

        if !target.public_likes && viewer.id != target.id {
            return Err(ProfileError::LikesPrivate);
        }

        let rows = self.posts.list_liked_by(target.id).await?;
        self.post_service
            .assemble(rows, Some(viewer))
            .await
            .map_err(|err| match err {
                crate::application::posts::PostError::Repo(repo) => ProfileError::Repo(repo),
                other => ProfileError::Repo(RepoError::from_persistence(other)),
            })
    }
}
