use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{EngagementRepo, RepoError};
use crate::domain::types::LikeTargetType;

use super::{PostgresRepositories, map_sqlx_error};

fn counter_table(target_type: LikeTargetType) -> &'static str {
    match target_type {
        LikeTargetType::Post => "posts",
        LikeTargetType::Comment => "comments",
    }
}

#[async_trait]
impl EngagementRepo for PostgresRepositories {
    async fn insert_like(
        &self,
        user_id: Uuid,
        target_type: LikeTargetType,
        target_id: Uuid,
    ) -> Result<bool, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let inserted = sqlx::query(
            "INSERT INTO likes (user_id, target_type, target_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, target_type, target_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(target_type)
        .bind(target_id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?
        .rows_affected()
            > 0;

        // The denormalized counter moves only when a row was actually added,
        // so a repeated like cannot inflate it.
        if inserted {
            let sql = format!(
                "UPDATE {} SET likes_count = likes_count + 1 WHERE id = $1",
                counter_table(target_type)
            );
            sqlx::query(&sql)
                .bind(target_id)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(inserted)
    }

    async fn remove_like(
        &self,
        user_id: Uuid,
        target_type: LikeTargetType,
        target_id: Uuid,
    ) -> Result<bool, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let removed = sqlx::query(
            "DELETE FROM likes WHERE user_id = $1 AND target_type = $2 AND target_id = $3",
        )
        .bind(user_id)
        .bind(target_type)
        .bind(target_id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?
        .rows_affected()
            > 0;

        if removed {
            let sql = format!(
                "UPDATE {} SET likes_count = GREATEST(likes_count - 1, 0) WHERE id = $1",
                counter_table(target_type)
            );
            sqlx::query(&sql)
                .bind(target_id)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(removed)
    }

    async fn insert_repost(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let inserted = sqlx::query(
            "INSERT INTO reposts (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, post_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?
        .rows_affected()
            > 0;

        if inserted {
            sqlx::query("UPDATE posts SET reposts_count = reposts_count + 1 WHERE id = $1")
                .bind(post_id)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(inserted)
    }

    async fn remove_repost(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let removed = sqlx::query("DELETE FROM reposts WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?
            .rows_affected()
            > 0;

        if removed {
            sqlx::query(
                "UPDATE posts SET reposts_count = GREATEST(reposts_count - 1, 0) WHERE id = $1",
            )
            .bind(post_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(removed)
    }
}
