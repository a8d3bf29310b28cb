use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, NewPostView, PostWithAuthor, PostsRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{PostRecord, UserRecord};

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str = "id, user_id, title, content, excerpt, audio_path, has_audio, \
     likes_count, comments_count, reposts_count, views_count, created_at, updated_at";

/// Post joined with its author, author columns aliased for the flat row.
const POST_AUTHOR_COLUMNS: &str = "p.id, p.user_id, p.title, p.content, p.excerpt, \
     p.audio_path, p.has_audio, \
     p.likes_count, p.comments_count, p.reposts_count, p.views_count, \
     p.created_at, p.updated_at, \
     u.email AS author_email, u.hashed_password AS author_hashed_password, \
     u.name AS author_name, u.username AS author_username, u.bio AS author_bio, \
     u.avatar_path AS author_avatar_path, u.public_likes AS author_public_likes, \
     u.created_at AS author_created_at, u.updated_at AS author_updated_at";

const POST_AUTHOR_FROM: &str = "FROM posts p INNER JOIN users u ON u.id = p.user_id";

#[derive(sqlx::FromRow)]
pub(super) struct PostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub audio_path: Option<String>,
    pub has_audio: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    pub reposts_count: i32,
    pub views_count: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            audio_path: row.audio_path,
            has_audio: row.has_audio,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            reposts_count: row.reposts_count,
            views_count: row.views_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct PostAuthorRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub audio_path: Option<String>,
    pub has_audio: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    pub reposts_count: i32,
    pub views_count: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_email: String,
    pub author_hashed_password: String,
    pub author_name: String,
    pub author_username: String,
    pub author_bio: Option<String>,
    pub author_avatar_path: Option<String>,
    pub author_public_likes: bool,
    pub author_created_at: OffsetDateTime,
    pub author_updated_at: OffsetDateTime,
}

impl From<PostAuthorRow> for PostWithAuthor {
    fn from(row: PostAuthorRow) -> Self {
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
        let post = PostRecord {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            audio_path: row.audio_path,
            has_audio: row.has_audio,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            reposts_count: row.reposts_count,
            views_count: row.views_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Self { post, author }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            "INSERT INTO posts (user_id, title, content, excerpt) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(params.user_id)
            .bind(&params.title)
            .bind(&params.content)
            .bind(&params.excerpt)
            .fetch_one(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        for name in &params.tags {
            sqlx::query("INSERT INTO tags (post_id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(row.id)
                .bind(name)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let sql = format!("SELECT {POST_AUTHOR_COLUMNS} {POST_AUTHOR_FROM} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostAuthorRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostWithAuthor::from))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            "UPDATE posts \
             SET title = $2, content = $3, excerpt = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(params.id)
            .bind(&params.title)
            .bind(&params.content)
            .bind(&params.excerpt)
            .fetch_one(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        if let Some(tags) = &params.tags {
            sqlx::query("DELETE FROM tags WHERE post_id = $1")
                .bind(row.id)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
            for name in tags {
                sqlx::query(
                    "INSERT INTO tags (post_id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(row.id)
                .bind(name)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Likes are polymorphic and carry no FK, so they are swept by hand:
        // first likes on the post's comments, then likes on the post itself.
        sqlx::query(
            "DELETE FROM likes \
             WHERE target_type = 'comment' \
               AND target_id IN (SELECT id FROM comments WHERE post_id = $1)",
        )
        .bind(id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM likes WHERE target_type = 'post' AND target_id = $1")
            .bind(id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn set_audio(
        &self,
        id: Uuid,
        audio_path: Option<&str>,
    ) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "UPDATE posts \
             SET audio_path = $2, has_audio = $2 IS NOT NULL, updated_at = now() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(audio_path)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn list_latest(&self, limit: i64) -> Result<Vec<PostWithAuthor>, RepoError> {
        let sql = format!(
            "SELECT {POST_AUTHOR_COLUMNS} {POST_AUTHOR_FROM} ORDER BY p.created_at DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, PostAuthorRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn list_top_liked(&self, limit: i64) -> Result<Vec<PostWithAuthor>, RepoError> {
        let sql = format!(
            "SELECT {POST_AUTHOR_COLUMNS} {POST_AUTHOR_FROM} \
             ORDER BY p.likes_count DESC, p.created_at DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, PostAuthorRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn list_by_author(&self, user_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_following(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let sql = format!(
            "SELECT {POST_AUTHOR_COLUMNS} {POST_AUTHOR_FROM} \
             WHERE p.user_id IN (SELECT followed_id FROM follows WHERE follower_id = $1) \
             ORDER BY p.created_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, PostAuthorRow>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn list_liked_by(&self, user_id: Uuid) -> Result<Vec<PostWithAuthor>, RepoError> {
        let sql = format!(
            "SELECT {POST_AUTHOR_COLUMNS} {POST_AUTHOR_FROM} \
             INNER JOIN likes l ON l.target_type = 'post' AND l.target_id = p.id \
             WHERE l.user_id = $1 \
             ORDER BY l.created_at DESC"
        );
        let rows = sqlx::query_as::<_, PostAuthorRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn record_view(&self, view: NewPostView) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO post_views (post_id, user_id, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(view.post_id)
        .bind(view.user_id)
        .bind(&view.ip_address)
        .bind(&view.user_agent)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query("UPDATE posts SET views_count = views_count + 1 WHERE id = $1")
            .bind(view.post_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn search_posts(
        &self,
        query: &str,
        exclude_collection: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let pattern = format!("%{query}%");
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT DISTINCT {POST_AUTHOR_COLUMNS} {POST_AUTHOR_FROM}"
        ));
        qb.push(" LEFT JOIN tags t ON t.post_id = p.id WHERE (p.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.content ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR t.name ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");

        if let Some(collection_id) = exclude_collection {
            qb.push(
                " AND p.id NOT IN (SELECT post_id FROM collection_posts WHERE collection_id = ",
            );
            qb.push_bind(collection_id);
            qb.push(")");
        }

        qb.push(" ORDER BY p.created_at DESC LIMIT ");
        qb.push_bind(limit);

        let rows = qb
            .build_query_as::<PostAuthorRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn liked_post_ids(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT target_id FROM likes \
             WHERE user_id = $1 AND target_type = 'post' AND target_id = ANY($2)",
        )
        .bind(user_id)
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ids)
    }

    async fn reposted_post_ids(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT post_id FROM reposts WHERE user_id = $1 AND post_id = ANY($2)",
        )
        .bind(user_id)
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ids)
    }
}
