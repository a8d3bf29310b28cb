use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateNotificationParams, NotificationWithActor, NotificationsRepo, RepoError,
};
use crate::domain::entities::{NotificationRecord, UserRecord};
use crate::domain::types::{NotificationAction, NotificationTargetType};

use super::{PostgresRepositories, map_sqlx_error};

const NOTIFICATION_COLUMNS: &str = "id, user_id, actor_id, action, content, target_type, \
     target_id, target_url, read, created_at";

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    actor_id: Uuid,
    action: NotificationAction,
    content: String,
    target_type: NotificationTargetType,
    target_id: Uuid,
    target_url: Option<String>,
    read: bool,
    created_at: OffsetDateTime,
}

impl From<NotificationRow> for NotificationRecord {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            actor_id: row.actor_id,
            action: row.action,
            content: row.content,
            target_type: row.target_type,
            target_id: row.target_id,
            target_url: row.target_url,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationActorRow {
    id: Uuid,
    user_id: Uuid,
    actor_id: Uuid,
    action: NotificationAction,
    content: String,
    target_type: NotificationTargetType,
    target_id: Uuid,
    target_url: Option<String>,
    read: bool,
    created_at: OffsetDateTime,
    actor_email: String,
    actor_hashed_password: String,
    actor_name: String,
    actor_username: String,
    actor_bio: Option<String>,
    actor_avatar_path: Option<String>,
    actor_public_likes: bool,
    actor_created_at: OffsetDateTime,
    actor_updated_at: OffsetDateTime,
}

impl From<NotificationActorRow> for NotificationWithActor {
    fn from(row: NotificationActorRow) -> Self {
        let actor = UserRecord {
            id: row.actor_id,
            email: row.actor_email,
            hashed_password: row.actor_hashed_password,
            name: row.actor_name,
            username: row.actor_username,
            bio: row.actor_bio,
            avatar_path: row.actor_avatar_path,
            public_likes: row.actor_public_likes,
            created_at: row.actor_created_at,
            updated_at: row.actor_updated_at,
        };
        let notification = NotificationRecord {
            id: row.id,
            user_id: row.user_id,
            actor_id: row.actor_id,
            action: row.action,
            content: row.content,
            target_type: row.target_type,
            target_id: row.target_id,
            target_url: row.target_url,
            read: row.read,
            created_at: row.created_at,
        };
        Self {
            notification,
            actor,
        }
    }
}

#[async_trait]
impl NotificationsRepo for PostgresRepositories {
    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError> {
        let sql = format!(
            "INSERT INTO notifications \
             (user_id, actor_id, action, content, target_type, target_id, target_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {NOTIFICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(params.user_id)
            .bind(params.actor_id)
            .bind(params.action)
            .bind(&params.content)
            .bind(params.target_type)
            .bind(params.target_id)
            .bind(&params.target_url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(NotificationRecord::from(row))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<NotificationWithActor>, RepoError> {
        let rows = sqlx::query_as::<_, NotificationActorRow>(
            "SELECT n.id, n.user_id, n.actor_id, n.action, n.content, n.target_type, \
                    n.target_id, n.target_url, n.read, n.created_at, \
                    u.email AS actor_email, u.hashed_password AS actor_hashed_password, \
                    u.name AS actor_name, u.username AS actor_username, u.bio AS actor_bio, \
                    u.avatar_path AS actor_avatar_path, u.public_likes AS actor_public_likes, \
                    u.created_at AS actor_created_at, u.updated_at AS actor_updated_at \
             FROM notifications n INNER JOIN users u ON u.id = n.actor_id \
             WHERE n.user_id = $1 \
             ORDER BY n.created_at DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NotificationWithActor::from).collect())
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
