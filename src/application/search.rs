//! Substring search across posts, users, and tags.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::posts::{PostService, PostView};
use crate::application::repos::{
    CollectionsRepo, PostsRepo, ProfileCounts, RepoError, TagHit, TagsRepo, UsersRepo,
};
use crate::domain::entities::UserRecord;

const POST_RESULT_LIMIT: i64 = 20;
const USER_RESULT_LIMIT: i64 = 10;
const TAG_RESULT_LIMIT: i64 = 20;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A user hit with the counters the result card renders.
#[derive(Debug, Clone)]
pub struct UserHit {
    pub user: UserRecord,
    pub counts: ProfileCounts,
}

#[derive(Debug, Default)]
pub struct SearchResults {
    pub posts: Vec<PostView>,
    pub users: Vec<UserHit>,
    pub tags: Vec<TagHit>,
}

#[derive(Clone)]
pub struct SearchService {
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
    tags: Arc<dyn TagsRepo>,
    collections: Arc<dyn CollectionsRepo>,
    post_service: PostService,
}

impl SearchService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        users: Arc<dyn UsersRepo>,
        tags: Arc<dyn TagsRepo>,
        collections: Arc<dyn CollectionsRepo>,
        post_service: PostService,
    ) -> Self {
        Self {
            posts,
            users,
            tags,
            collections,
            post_service,
        }
    }

    /// Substring matching only; a blank query short-circuits to empty results.
    pub async fn search(
        &self,
        query: &str,
        exclude_collection: Option<Uuid>,
        viewer: Option<&UserRecord>,
    ) -> Result<SearchResults, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }

        let exclude = self
            .resolve_excluded_collection(exclude_collection, viewer)
            .await?;

        let post_rows = self
            .posts
            .search_posts(query, exclude, POST_RESULT_LIMIT)
            .await?;
        let posts = self
            .post_service
            .assemble(post_rows, viewer)
            .await
            .map_err(|err| match err {
                crate::application::posts::PostError::Repo(repo) => SearchError::Repo(repo),
                other => SearchError::Repo(RepoError::from_persistence(other)),
            })?;

        let user_rows = self.users.search_users(query, USER_RESULT_LIMIT).await?;
        let mut users = Vec::with_capacity(user_rows.len());
        for user in user_rows {
            let counts = self.users.profile_counts(user.id).await?;
            users.push(UserHit { user, counts });
        }

        let tags = self.tags.search_tags(query, TAG_RESULT_LIMIT).await?;

        Ok(SearchResults { posts, users, tags })
    }

    /// The exclusion only applies when the named collection belongs to the
    /// requester; anyone else's collection id is ignored.
    async fn resolve_excluded_collection(
        &self,
        exclude_collection: Option<Uuid>,
        viewer: Option<&UserRecord>,
    ) -> Result<Option<Uuid>, SearchError> {
        let (Some(id), Some(viewer)) = (exclude_collection, viewer) else {
            return Ok(None);
        };

        let collection = self.collections.find_by_id(id).await?;
        Ok(collection
            .filter(|record| record.user_id == viewer.id)
            .map(|record| record.id))
    }
}
