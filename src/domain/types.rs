//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "like_target_type", rename_all = "snake_case")]
pub enum LikeTargetType {
    Post,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notification_action", rename_all = "snake_case")]
pub enum NotificationAction {
    Like,
    Comment,
    Follow,
    Repost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notification_target_type", rename_all = "snake_case")]
pub enum NotificationTargetType {
    Post,
    Comment,
    User,
}

/// Reporting window presets accepted by the analytics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsRange {
    SevenDays,
    ThirtyDays,
    NinetyDays,
    Year,
}

impl AnalyticsRange {
    /// Parse a query-string preset. Unknown values fall back to the 30-day
    /// window, which is what clients already rely on.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("7days") => AnalyticsRange::SevenDays,
            Some("90days") => AnalyticsRange::NinetyDays,
            Some("year") => AnalyticsRange::Year,
            _ => AnalyticsRange::ThirtyDays,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            AnalyticsRange::SevenDays => 7,
            AnalyticsRange::ThirtyDays => 30,
            AnalyticsRange::NinetyDays => 90,
            AnalyticsRange::Year => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalyticsRange::SevenDays => "7days",
            AnalyticsRange::ThirtyDays => "30days",
            AnalyticsRange::NinetyDays => "90days",
            AnalyticsRange::Year => "year",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parses_known_presets() {
        assert_eq!(
            AnalyticsRange::parse(Some("7days")),
            AnalyticsRange::SevenDays
        );
        assert_eq!(
            AnalyticsRange::parse(Some("30days")),
            AnalyticsRange::ThirtyDays
        );
        assert_eq!(
            AnalyticsRange::parse(Some("90days")),
            AnalyticsRange::NinetyDays
        );
        assert_eq!(AnalyticsRange::parse(Some("year")), AnalyticsRange::Year);
    }

    #[test]
    fn range_falls_back_to_thirty_days() {
        assert_eq!(AnalyticsRange::parse(None), AnalyticsRange::ThirtyDays);
        assert_eq!(
            AnalyticsRange::parse(Some("fortnight")),
            AnalyticsRange::ThirtyDays
        );
    }
}
