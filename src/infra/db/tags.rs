use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{RepoError, TagHit, TagsRepo};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn names_for_post(&self, post_id: Uuid) -> Result<Vec<String>, RepoError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM tags WHERE post_id = $1 ORDER BY created_at",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(names)
    }

    async fn names_for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, String)>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT post_id, name FROM tags WHERE post_id = ANY($1) ORDER BY created_at",
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows)
    }

    async fn search_tags(&self, query: &str, limit: i64) -> Result<Vec<TagHit>, RepoError> {
        let pattern = format!("%{query}%");
        let rows = sqlx::query_as::<_, TagHit>(
            "SELECT name, COUNT(DISTINCT post_id) AS posts_count \
             FROM tags WHERE name ILIKE $1 \
             GROUP BY name \
             ORDER BY posts_count DESC, name \
             LIMIT $2",
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows)
    }
}
