use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CollectionWithCount, CollectionsRepo, CreateCollectionParams, PostWithAuthor, RepoError,
    UpdateCollectionParams,
};
use crate::domain::entities::CollectionRecord;

use super::posts::PostAuthorRow;
use super::{PostgresRepositories, map_sqlx_error};

const COLLECTION_COLUMNS: &str =
    "id, user_id, name, description, is_private, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CollectionRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    is_private: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CollectionRow> for CollectionRecord {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            is_private: row.is_private,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CollectionCountRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    is_private: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    posts_count: i64,
}

impl From<CollectionCountRow> for CollectionWithCount {
    fn from(row: CollectionCountRow) -> Self {
        Self {
            record: CollectionRecord {
                id: row.id,
                user_id: row.user_id,
                name: row.name,
                description: row.description,
                is_private: row.is_private,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            posts_count: row.posts_count,
        }
    }
}

#[async_trait]
impl CollectionsRepo for PostgresRepositories {
    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CollectionWithCount>, RepoError> {
        let rows = sqlx::query_as::<_, CollectionCountRow>(
            "SELECT c.id, c.user_id, c.name, c.description, c.is_private, \
                    c.created_at, c.updated_at, \
                    (SELECT COUNT(*) FROM collection_posts cp WHERE cp.collection_id = c.id) \
                        AS posts_count \
             FROM collections c \
             WHERE c.user_id = $1 \
             ORDER BY c.updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CollectionWithCount::from).collect())
    }

    async fn create_collection(
        &self,
        params: CreateCollectionParams,
    ) -> Result<CollectionRecord, RepoError> {
        let sql = format!(
            "INSERT INTO collections (user_id, name, description, is_private) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLLECTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(params.user_id)
            .bind(&params.name)
            .bind(&params.description)
            .bind(params.is_private)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(CollectionRecord::from(row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CollectionRecord>, RepoError> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = $1");
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CollectionRecord::from))
    }

    async fn update_collection(
        &self,
        params: UpdateCollectionParams,
    ) -> Result<CollectionRecord, RepoError> {
        let sql = format!(
            "UPDATE collections \
             SET name = $2, description = $3, is_private = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLLECTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(params.id)
            .bind(&params.name)
            .bind(&params.description)
            .bind(params.is_private)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(CollectionRecord::from(row))
    }

    async fn delete_collection(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn add_post(&self, collection_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let inserted = sqlx::query(
            "INSERT INTO collection_posts (collection_id, post_id) VALUES ($1, $2) \
             ON CONFLICT (collection_id, post_id) DO NOTHING",
        )
        .bind(collection_id)
        .bind(post_id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?
        .rows_affected()
            > 0;

        if inserted {
            sqlx::query("UPDATE collections SET updated_at = now() WHERE id = $1")
                .bind(collection_id)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(inserted)
    }

    async fn remove_post(&self, collection_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let removed = sqlx::query(
            "DELETE FROM collection_posts WHERE collection_id = $1 AND post_id = $2",
        )
        .bind(collection_id)
        .bind(post_id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?
        .rows_affected()
            > 0;

        if removed {
            sqlx::query("UPDATE collections SET updated_at = now() WHERE id = $1")
                .bind(collection_id)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(removed)
    }

    async fn posts_for_collection(
        &self,
        collection_id: Uuid,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let rows = sqlx::query_as::<_, PostAuthorRow>(
            "SELECT p.id, p.user_id, p.title, p.content, p.excerpt, \
                    p.audio_path, p.has_audio, \
                    p.likes_count, p.comments_count, p.reposts_count, p.views_count, \
                    p.created_at, p.updated_at, \
                    u.email AS author_email, u.hashed_password AS author_hashed_password, \
                    u.name AS author_name, u.username AS author_username, u.bio AS author_bio, \
                    u.avatar_path AS author_avatar_path, u.public_likes AS author_public_likes, \
                    u.created_at AS author_created_at, u.updated_at AS author_updated_at \
             FROM collection_posts cp \
             INNER JOIN posts p ON p.id = cp.post_id \
             INNER JOIN users u ON u.id = p.user_id \
             WHERE cp.collection_id = $1 \
             ORDER BY cp.created_at DESC",
        )
        .bind(collection_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn posts_count(&self, collection_id: Uuid) -> Result<i64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM collection_posts WHERE collection_id = $1",
        )
        .bind(collection_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(count)
    }
}
