//! Per-author engagement reporting over a preset date range.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::application::repos::{AnalyticsRepo, DayCount, RepoError, TopPostRow};
use crate::domain::entities::UserRecord;
use crate::domain::types::AnalyticsRange;

const TOP_POSTS_LIMIT: i64 = 5;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_posts: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_reposts: i64,
    pub followers_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostsByDay {
    pub date: String,
    pub posts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewsByDay {
    pub date: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementDay {
    pub date: String,
    pub likes: i64,
    pub comments: i64,
    pub reposts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPost {
    pub id: uuid::Uuid,
    pub title: String,
    pub views: i32,
    pub likes: i32,
    pub comments: i32,
    pub reposts: i32,
}

/// One slice of the engagement share chart.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionSlice {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub range: &'static str,
    pub overview: Overview,
    pub engagement_rate: f64,
    pub posts_by_day: Vec<PostsByDay>,
    pub views_by_day: Vec<ViewsByDay>,
    pub engagement_by_day: Vec<EngagementDay>,
    pub top_posts: Vec<TopPost>,
    pub engagement_distribution: Vec<DistributionSlice>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepo>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepo>) -> Self {
        Self { repo }
    }

    pub async fn report(
        &self,
        user: &UserRecord,
        range: AnalyticsRange,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        let now = OffsetDateTime::now_utc();
        // The window opens at the beginning of the first day, so the whole
        // of that day counts.
        let since = (now - Duration::days(range.days()))
            .date()
            .midnight()
            .assume_utc();

        let totals = self.repo.post_totals(user.id).await?;
        let followers_count = self.repo.follower_count(user.id).await?;

        let posts_by_day: Vec<PostsByDay> = self
            .repo
            .posts_by_day(user.id, since)
            .await?
            .into_iter()
            .map(|row| PostsByDay {
                date: format_day(row.day),
                posts: row.count,
            })
            .collect();
        let views_by_day: Vec<ViewsByDay> = self
            .repo
            .views_by_day(user.id, since)
            .await?
            .into_iter()
            .map(|row| ViewsByDay {
                date: format_day(row.day),
                views: row.count,
            })
            .collect();

        let likes = self.repo.likes_by_day(user.id, since).await?;
        let comments = self.repo.comments_by_day(user.id, since).await?;
        let reposts = self.repo.reposts_by_day(user.id, since).await?;
        let engagement_by_day = zero_filled_engagement(since.date(), now.date(), &likes, &comments, &reposts);

        let top_posts = self
            .repo
            .top_posts(user.id, TOP_POSTS_LIMIT)
            .await?
            .into_iter()
            .map(TopPost::from)
            .collect();

        let engagement_total = totals.likes + totals.comments + totals.reposts;

        Ok(AnalyticsReport {
            range: range.as_str(),
            overview: Overview {
                total_posts: totals.posts,
                total_views: totals.views,
                total_likes: totals.likes,
                total_comments: totals.comments,
                total_reposts: totals.reposts,
                followers_count,
            },
            engagement_rate: engagement_rate(engagement_total, totals.views),
            posts_by_day,
            views_by_day,
            engagement_by_day,
            top_posts,
            engagement_distribution: distribution(totals.likes, totals.comments, totals.reposts),
        })
    }
}

impl From<TopPostRow> for TopPost {
    fn from(row: TopPostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            views: row.views,
            likes: row.likes,
            comments: row.comments,
            reposts: row.reposts,
        }
    }
}

fn format_day(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
        .unwrap_or_else(|_| date.to_string())
}

/// One entry per calendar day from range start through today, zeros included.
fn zero_filled_engagement(
    start: Date,
    end: Date,
    likes: &[DayCount],
    comments: &[DayCount],
    reposts: &[DayCount],
) -> Vec<EngagementDay> {
    let likes: HashMap<Date, i64> = likes.iter().map(|row| (row.day, row.count)).collect();
    let comments: HashMap<Date, i64> = comments.iter().map(|row| (row.day, row.count)).collect();
    let reposts: HashMap<Date, i64> = reposts.iter().map(|row| (row.day, row.count)).collect();

    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(EngagementDay {
            date: format_day(current),
            likes: likes.get(&current).copied().unwrap_or(0),
            comments: comments.get(&current).copied().unwrap_or(0),
            reposts: reposts.get(&current).copied().unwrap_or(0),
        });
        match current.next_day() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}

fn engagement_rate(engagement: i64, views: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    engagement as f64 / views as f64
}

fn distribution(likes: i64, comments: i64, reposts: i64) -> Vec<DistributionSlice> {
    let total = likes + comments + reposts;
    let share = |value: i64| {
        if total > 0 {
            value as f64 / total as f64
        } else {
            0.0
        }
    };
    vec![
        DistributionSlice {
            name: "Likes",
            value: share(likes),
        },
        DistributionSlice {
            name: "Comments",
            value: share(comments),
        },
        DistributionSlice {
            name: "Reposts",
            value: share(reposts),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn engagement_rate_guards_division_by_zero() {
        assert_eq!(engagement_rate(12, 0), 0.0);
        assert_eq!(engagement_rate(5, 10), 0.5);
    }

    #[test]
    fn distribution_sums_to_one_when_engagement_exists() {
        let dist = distribution(2, 1, 1);
        assert_eq!(dist[0].name, "Likes");
        assert!((dist[0].value - 0.5).abs() < f64::EPSILON);
        let total: f64 = dist.iter().map(|slice| slice.value).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn distribution_is_zero_without_engagement() {
        let dist = distribution(0, 0, 0);
        assert!(dist.iter().all(|slice| slice.value == 0.0));
    }

    #[test]
    fn engagement_days_are_zero_filled_inclusive() {
        let likes = vec![DayCount {
            day: date!(2026 - 01 - 02),
            count: 3,
        }];
        let days = zero_filled_engagement(
            date!(2026 - 01 - 01),
            date!(2026 - 01 - 03),
            &likes,
            &[],
            &[],
        );
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].likes, 0);
        assert_eq!(days[1].likes, 3);
        assert_eq!(days[1].date, "2026-01-02");
        assert_eq!(days[2].likes, 0);
    }
}
