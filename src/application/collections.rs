//! User-owned collections of posts.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::posts::{PostService, PostView};
use crate::application::repos::{
    CollectionWithCount, CollectionsRepo, CreateCollectionParams, PostsRepo, RepoError,
    UpdateCollectionParams,
};
use crate::domain::entities::{CollectionRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::users::{COLLECTION_DESCRIPTION_MAX_CHARS, COLLECTION_NAME_MAX_CHARS};

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("collection not found")]
    NotFound,
    #[error("post not found")]
    PostNotFound,
    #[error("this collection is private")]
    Private,
    #[error("unauthorized")]
    Unauthorized,
    #[error("post is already in this collection")]
    AlreadyPresent,
    #[error("post is not in this collection")]
    NotPresent,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DomainError> for CollectionError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => CollectionError::Validation(message),
            other => CollectionError::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpsertCollectionCommand {
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
}

/// A collection opened for display with its member posts assembled.
#[derive(Debug, Clone)]
pub struct CollectionDetail {
    pub record: CollectionRecord,
    pub posts: Vec<PostView>,
}

#[derive(Clone)]
pub struct CollectionService {
    collections: Arc<dyn CollectionsRepo>,
    posts: Arc<dyn PostsRepo>,
    post_service: PostService,
}

impl CollectionService {
    pub fn new(
        collections: Arc<dyn CollectionsRepo>,
        posts: Arc<dyn PostsRepo>,
        post_service: PostService,
    ) -> Self {
        Self {
            collections,
            posts,
            post_service,
        }
    }

    pub async fn list(&self, owner: &UserRecord) -> Result<Vec<CollectionWithCount>, CollectionError> {
        self.collections
            .list_for_user(owner.id)
            .await
            .map_err(CollectionError::from)
    }

    pub async fn create(
        &self,
        owner: &UserRecord,
        command: UpsertCollectionCommand,
    ) -> Result<CollectionRecord, CollectionError> {
        let (name, description) = Self::validate(command.name, command.description)?;
        self.collections
            .create_collection(CreateCollectionParams {
                user_id: owner.id,
                name,
                description,
                is_private: command.is_private,
            })
            .await
            .map_err(CollectionError::from)
    }

    /// Open a collection with its posts. Private collections are visible to
    /// their owner only.
    pub async fn show(
        &self,
        id: Uuid,
        viewer: Option<&UserRecord>,
    ) -> Result<CollectionDetail, CollectionError> {
        let record = self
            .collections
            .find_by_id(id)
            .await?
            .ok_or(CollectionError::NotFound)?;

        if record.is_private && viewer.map(|user| user.id) != Some(record.user_id) {
            return Err(CollectionError::Private);
        }

        let rows = self.collections.posts_for_collection(record.id).await?;
        let posts = self
            .post_service
            .assemble(rows, viewer)
            .await
            .map_err(|err| CollectionError::Validation(err.to_string()))?;

        Ok(CollectionDetail { record, posts })
    }

    pub async fn update(
        &self,
        owner: &UserRecord,
        id: Uuid,
        command: UpsertCollectionCommand,
    ) -> Result<CollectionWithCount, CollectionError> {
        let existing = self.owned(owner, id).await?;
        let (name, description) = Self::validate(command.name, command.description)?;
        let record = self
            .collections
            .update_collection(UpdateCollectionParams {
                id: existing.id,
                name,
                description,
                is_private: command.is_private,
            })
            .await?;
        let posts_count = self.collections.posts_count(record.id).await?;
        Ok(CollectionWithCount {
            record,
            posts_count,
        })
    }

    pub async fn delete(&self, owner: &UserRecord, id: Uuid) -> Result<(), CollectionError> {
        let existing = self.owned(owner, id).await?;
        self.collections.delete_collection(existing.id).await?;
        Ok(())
    }

    pub async fn add_post(
        &self,
        owner: &UserRecord,
        id: Uuid,
        post_id: Uuid,
    ) -> Result<(), CollectionError> {
        let collection = self.owned(owner, id).await?;
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(CollectionError::PostNotFound);
        }

        let inserted = self.collections.add_post(collection.id, post_id).await?;
        if inserted {
            Ok(())
        } else {
            Err(CollectionError::AlreadyPresent)
        }
    }

    pub async fn remove_post(
        &self,
        owner: &UserRecord,
        id: Uuid,
        post_id: Uuid,
    ) -> Result<(), CollectionError> {
        let collection = self.owned(owner, id).await?;
        let removed = self.collections.remove_post(collection.id, post_id).await?;
        if removed {
            Ok(())
        } else {
            Err(CollectionError::NotPresent)
        }
    }

    async fn owned(&self, owner: &UserRecord, id: Uuid) -> Result<CollectionRecord, CollectionError> {
        let record = self
            .collections
            .find_by_id(id)
            .await?
            .ok_or(CollectionError::NotFound)?;
        if record.user_id != owner.id {
            return Err(CollectionError::Unauthorized);
        }
        Ok(record)
    }

    fn validate(
        name: String,
        description: Option<String>,
    ) -> Result<(String, Option<String>), CollectionError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CollectionError::Validation("name can't be blank".to_string()));
        }
        if name.chars().count() > COLLECTION_NAME_MAX_CHARS {
            return Err(CollectionError::Validation(format!(
                "name is too long (maximum is {COLLECTION_NAME_MAX_CHARS} characters)"
            )));
        }

        let description = description.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        });
        if let Some(description) = description.as_deref()
            && description.chars().count() > COLLECTION_DESCRIPTION_MAX_CHARS
        {
            return Err(CollectionError::Validation(format!(
                "description is too long (maximum is {COLLECTION_DESCRIPTION_MAX_CHARS} characters)"
            )));
        }

        Ok((name, description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_bounded() {
        assert!(CollectionService::validate("Favorites".to_string(), None).is_ok());
        assert!(CollectionService::validate("  ".to_string(), None).is_err());
        assert!(CollectionService::validate("n".repeat(101), None).is_err());
    }

    #[test]
    fn blank_descriptions_collapse_to_none() {
        let (_, description) =
            CollectionService::validate("Favorites".to_string(), Some("   ".to_string())).unwrap();
        assert_eq!(description, None);
    }
}
