use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AnalyticsRepo, DayCount, PostTotals, RepoError, TopPostRow};

use super::{PostgresRepositories, map_sqlx_error};

/// Day buckets are cut in UTC regardless of the server timezone.
const DAY_EXPR: &str = "(created_at AT TIME ZONE 'utc')::date";

#[async_trait]
impl AnalyticsRepo for PostgresRepositories {
    async fn post_totals(&self, user_id: Uuid) -> Result<PostTotals, RepoError> {
        let (posts, views, likes, comments, reposts): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT COUNT(*), \
                        COALESCE(SUM(views_count), 0)::BIGINT, \
                        COALESCE(SUM(likes_count), 0)::BIGINT, \
                        COALESCE(SUM(comments_count), 0)::BIGINT, \
                        COALESCE(SUM(reposts_count), 0)::BIGINT \
                 FROM posts WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostTotals {
            posts,
            views,
            likes,
            comments,
            reposts,
        })
    }

    async fn follower_count(&self, user_id: Uuid) -> Result<i64, RepoError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followed_id = $1")
                .bind(user_id)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn posts_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError> {
        let sql = format!(
            "SELECT {DAY_EXPR} AS day, COUNT(*) AS count \
             FROM posts \
             WHERE user_id = $1 AND created_at >= $2 \
             GROUP BY day ORDER BY day"
        );
        sqlx::query_as::<_, DayCount>(&sql)
            .bind(user_id)
            .bind(since)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn views_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError> {
        sqlx::query_as::<_, DayCount>(
            "SELECT (pv.created_at AT TIME ZONE 'utc')::date AS day, COUNT(*) AS count \
             FROM post_views pv \
             INNER JOIN posts p ON p.id = pv.post_id \
             WHERE p.user_id = $1 AND pv.created_at >= $2 \
             GROUP BY day ORDER BY day",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn likes_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError> {
        sqlx::query_as::<_, DayCount>(
            "SELECT (l.created_at AT TIME ZONE 'utc')::date AS day, COUNT(*) AS count \
             FROM likes l \
             INNER JOIN posts p ON l.target_type = 'post' AND l.target_id = p.id \
             WHERE p.user_id = $1 AND l.created_at >= $2 \
             GROUP BY day ORDER BY day",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn comments_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError> {
        sqlx::query_as::<_, DayCount>(
            "SELECT (c.created_at AT TIME ZONE 'utc')::date AS day, COUNT(*) AS count \
             FROM comments c \
             INNER JOIN posts p ON p.id = c.post_id \
             WHERE p.user_id = $1 AND c.created_at >= $2 \
             GROUP BY day ORDER BY day",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn reposts_by_day(
        &self,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<DayCount>, RepoError> {
        sqlx::query_as::<_, DayCount>(
            "SELECT (r.created_at AT TIME ZONE 'utc')::date AS day, COUNT(*) AS count \
             FROM reposts r \
             INNER JOIN posts p ON p.id = r.post_id \
             WHERE p.user_id = $1 AND r.created_at >= $2 \
             GROUP BY day ORDER BY day",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn top_posts(&self, user_id: Uuid, limit: i64) -> Result<Vec<TopPostRow>, RepoError> {
        sqlx::query_as::<_, TopPostRow>(
            "SELECT id, title, views_count AS views, likes_count AS likes, \
                    comments_count AS comments, reposts_count AS reposts \
             FROM posts \
             WHERE user_id = $1 \
             ORDER BY (likes_count + comments_count + reposts_count) DESC, created_at DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
