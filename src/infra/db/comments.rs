use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CommentWithAuthor, CommentsRepo, CreateCommentParams, RepoError,
};
use crate::domain::entities::{CommentRecord, UserRecord};

use super::{PostgresRepositories, map_sqlx_error};

const COMMENT_COLUMNS: &str =
    "id, user_id, post_id, content, likes_count, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    user_id: Uuid,
    post_id: Uuid,
    content: String,
    likes_count: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            post_id: row.post_id,
            content: row.content,
            likes_count: row.likes_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentAuthorRow {
    id: Uuid,
    user_id: Uuid,
    post_id: Uuid,
    content: String,
    likes_count: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    author_email: String,
    author_hashed_password: String,
    author_name: String,
    author_username: String,
    author_bio: Option<String>,
    author_avatar_path: Option<String>,
    author_public_likes: bool,
    author_created_at: OffsetDateTime,
    author_updated_at: OffsetDateTime,
}

impl From<CommentAuthorRow> for CommentWithAuthor {
    fn from(row: CommentAuthorRow) -> Self {
        let author = UserRecord {
            id: row.user_id,
            email: row.author_email,
            hashed_password: row.author_hashed_password,
            name: row.author_name,
            username: row.author_username,
            bio: row.author_bio,
            avatar_path: row.author_avatar_path,
            public_likes: row.author_public_likes,
            created_at: row.author_created_at,
            updated_at: row.author_updated_at,
        };
        let comment = CommentRecord {
            id: row.id,
            user_id: row.user_id,
            post_id: row.post_id,
            content: row.content,
            likes_count: row.likes_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Self { comment, author }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = sqlx::query_as::<_, CommentAuthorRow>(
            "SELECT c.id, c.user_id, c.post_id, c.content, c.likes_count, \
                    c.created_at, c.updated_at, \
                    u.email AS author_email, u.hashed_password AS author_hashed_password, \
                    u.name AS author_name, u.username AS author_username, u.bio AS author_bio, \
                    u.avatar_path AS author_avatar_path, u.public_likes AS author_public_likes, \
                    u.created_at AS author_created_at, u.updated_at AS author_updated_at \
             FROM comments c INNER JOIN users u ON u.id = c.user_id \
             WHERE c.post_id = $1 \
             ORDER BY c.created_at DESC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            "INSERT INTO comments (user_id, post_id, content) \
             VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(params.user_id)
            .bind(params.post_id)
            .bind(&params.content)
            .fetch_one(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("UPDATE posts SET comments_count = comments_count + 1 WHERE id = $1")
            .bind(params.post_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(CommentRecord::from(row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CommentRecord::from))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Likes on the comment carry no FK; sweep them with the row.
        sqlx::query("DELETE FROM likes WHERE target_type = 'comment' AND target_id = $1")
            .bind(id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        let post_id = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM comments WHERE id = $1 RETURNING post_id",
        )
        .bind(id)
        .fetch_optional(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        if let Some(post_id) = post_id {
            sqlx::query(
                "UPDATE posts SET comments_count = GREATEST(comments_count - 1, 0) WHERE id = $1",
            )
            .bind(post_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn liked_comment_ids(
        &self,
        user_id: Uuid,
        comment_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT target_id FROM likes \
             WHERE user_id = $1 AND target_type = 'comment' AND target_id = ANY($2)",
        )
        .bind(user_id)
        .bind(comment_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ids)
    }
}
