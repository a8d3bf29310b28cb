use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateUserParams, ProfileCounts, RepoError, UpdateProfileParams, UsersRepo,
};
use crate::domain::entities::UserRecord;

use super::{PostgresRepositories, map_sqlx_error};

const USER_COLUMNS: &str = "id, email, hashed_password, name, username, bio, avatar_path, \
     public_likes, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub public_likes: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            hashed_password: row.hashed_password,
            name: row.name,
            username: row.username,
            bio: row.bio,
            avatar_path: row.avatar_path,
            public_likes: row.public_likes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "INSERT INTO users (email, hashed_password, name, username, bio) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&params.email)
            .bind(&params.hashed_password)
            .bind(&params.name)
            .bind(&params.username)
            .bind(&params.bio)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn update_profile(&self, params: UpdateProfileParams) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "UPDATE users \
             SET name = $2, bio = $3, public_likes = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(params.id)
            .bind(&params.name)
            .bind(&params.bio)
            .bind(params.public_likes)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }

    async fn update_password(&self, id: Uuid, hashed_password: &str) -> Result<(), RepoError> {
        sqlx::query("UPDATE users SET hashed_password = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(hashed_password)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update_avatar(
        &self,
        id: Uuid,
        avatar_path: Option<&str>,
    ) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "UPDATE users SET avatar_path = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(avatar_path)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }

    async fn profile_counts(&self, id: Uuid) -> Result<ProfileCounts, RepoError> {
        let (followers, following, posts): (i64, i64, i64) = sqlx::query_as(
            "SELECT \
                (SELECT COUNT(*) FROM follows WHERE followed_id = $1), \
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1), \
                (SELECT COUNT(*) FROM posts WHERE user_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ProfileCounts {
            followers,
            following,
            posts,
        })
    }

    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<UserRecord>, RepoError> {
        let pattern = format!("%{query}%");
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE name ILIKE $1 OR username ILIKE $1 OR bio ILIKE $1 \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }
}
