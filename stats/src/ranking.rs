//! Read-time ranking queries over the pre-aggregated counter tables.
//!
//! The named windows read `aggregate_points` (lifetime reads the
//! `history_rating` snapshot) so a ranking page never joins the raw event
//! tables; only the short trending window counts events directly because
//! the aggregate rows are not granular enough for it.

use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Integer, Nullable, Text, Timestamp};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

use crate::{App, error::AppError};

pub const DEFAULT_LIMIT: i64 = 20;
pub const TREND_WINDOW_HOURS: i64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    Daily,
    Weekly,
    Monthly,
    Lifetime,
}

impl Window {
    /// Lower bound of the window at `now`; `None` means unbounded.
    pub fn start(self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Window::Daily => Some(now - Duration::days(1)),
            Window::Weekly => Some(now - Duration::days(7)),
            Window::Monthly => Some(now - Duration::days(30)),
            Window::Lifetime => None,
        }
    }

    pub fn contains(self, now: NaiveDateTime, ts: NaiveDateTime) -> bool {
        self.start(now).is_none_or(|start| ts >= start)
    }
}

impl FromStr for Window {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        match s {
            "daily" => Ok(Window::Daily),
            "weekly" => Ok(Window::Weekly),
            "monthly" => Ok(Window::Monthly),
            "lifetime" => Ok(Window::Lifetime),
            other => Err(AppError::Validation(format!(
                "unknown ranking window `{other}`"
            ))),
        }
    }
}

#[derive(QueryableByName, Debug)]
struct RankedRow {
    #[diesel(sql_type = Integer)]
    id: i32,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Nullable<Array<Text>>)]
    category: Option<Vec<String>>,
    #[diesel(sql_type = Integer)]
    create_user_id: i32,
    #[diesel(sql_type = Nullable<Timestamp>)]
    public_at: Option<NaiveDateTime>,
    #[diesel(sql_type = BigInt)]
    like_count: i64,
    #[diesel(sql_type = BigInt)]
    access_count: i64,
    #[diesel(sql_type = BigInt)]
    score: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ArticleSummary {
    pub id: i32,
    pub title: String,
    pub category: Option<Vec<String>>,
    pub author_id: i32,
    pub public_at: Option<NaiveDateTime>,
    pub like_count: i64,
    pub access_count: i64,
    pub score: i64,
}

/// Non-deleted public articles ordered by the window's score
/// (`likes + access`), at most `limit` rows. Ties are broken by newer
/// publish time, then ascending article id, so the ordering is fully
/// deterministic. An empty page is a valid outcome.
pub async fn get_ranking(
    app: &App,
    window: Window,
    limit: i64,
) -> Result<Vec<ArticleSummary>, AppError> {
    let mut conn = app.diesel.get().await?;

    // Fixed column names per window; nothing user-controlled reaches the
    // SQL string.
    let (join, like_col, access_col) = match window {
        Window::Daily => (
            "LEFT JOIN aggregate_points p ON p.article_id = a.id",
            "p.like_daily",
            "p.access_daily",
        ),
        Window::Weekly => (
            "LEFT JOIN aggregate_points p ON p.article_id = a.id",
            "p.like_weekly",
            "p.access_weekly",
        ),
        Window::Monthly => (
            "LEFT JOIN aggregate_points p ON p.article_id = a.id",
            "p.like_monthly",
            "p.access_monthly",
        ),
        Window::Lifetime => (
            "LEFT JOIN history_rating p ON p.article_id = a.id",
            "p.like_count",
            "p.access_count",
        ),
    };

    let sql = format!(
        r#"
        SELECT a.id, a.title, a.category, a.create_user_id, a.public_at,
               COALESCE({like_col}, 0) AS like_count,
               COALESCE({access_col}, 0) AS access_count,
               (COALESCE({like_col}, 0) + COALESCE({access_col}, 0)) AS score
        FROM articles a
        {join}
        WHERE a.deleted_at IS NULL AND a.public_status = 'public'
        ORDER BY score DESC, a.public_at DESC NULLS LAST, a.id ASC
        LIMIT $1
    "#
    );

    let rows: Vec<RankedRow> = diesel::sql_query(sql)
        .bind::<BigInt, _>(limit.max(0))
        .load(&mut conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ArticleSummary {
            id: row.id,
            title: row.title,
            category: row.category,
            author_id: row.create_user_id,
            public_at: row.public_at,
            like_count: row.like_count,
            access_count: row.access_count,
            score: row.score,
        })
        .collect())
}

#[derive(QueryableByName, Debug)]
struct TrendRow {
    #[diesel(sql_type = Integer)]
    id: i32,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Nullable<Array<Text>>)]
    category: Option<Vec<String>>,
    #[diesel(sql_type = Integer)]
    create_user_id: i32,
    #[diesel(sql_type = Nullable<Timestamp>)]
    public_at: Option<NaiveDateTime>,
    #[diesel(sql_type = BigInt)]
    like_count: i64,
    #[diesel(sql_type = BigInt)]
    comment_count: i64,
    #[diesel(sql_type = BigInt)]
    score: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TrendingSummary {
    pub id: i32,
    pub title: String,
    pub category: Option<Vec<String>>,
    pub author_id: i32,
    pub public_at: Option<NaiveDateTime>,
    pub like_count: i64,
    pub comment_count: i64,
    pub score: i64,
}

/// One-hour trend, measured directly from the event tables with
/// `score = likes + comments`; same ordering rules as [`get_ranking`].
pub async fn get_trending(app: &App, limit: i64) -> Result<Vec<TrendingSummary>, AppError> {
    let mut conn = app.diesel.get().await?;
    let cutoff = chrono::Utc::now().naive_utc() - Duration::hours(TREND_WINDOW_HOURS);

    let rows: Vec<TrendRow> = diesel::sql_query(
        r#"
        WITH recent_likes AS (
            SELECT article_id, COUNT(*) AS likes
            FROM article_likes
            WHERE deleted_at IS NULL AND created_at >= $1
            GROUP BY article_id
        ),
        recent_comments AS (
            SELECT article_id, COUNT(*) AS comments
            FROM article_comments
            WHERE deleted_at IS NULL AND created_at >= $1
            GROUP BY article_id
        )
        SELECT a.id, a.title, a.category, a.create_user_id, a.public_at,
               COALESCE(l.likes, 0) AS like_count,
               COALESCE(c.comments, 0) AS comment_count,
               (COALESCE(l.likes, 0) + COALESCE(c.comments, 0)) AS score
        FROM articles a
        LEFT JOIN recent_likes l ON l.article_id = a.id
        LEFT JOIN recent_comments c ON c.article_id = a.id
        WHERE a.deleted_at IS NULL AND a.public_status = 'public'
        ORDER BY score DESC, a.public_at DESC NULLS LAST, a.id ASC
        LIMIT $2
    "#,
    )
    .bind::<Timestamp, _>(cutoff)
    .bind::<BigInt, _>(limit.max(0))
    .load(&mut conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| TrendingSummary {
            id: row.id,
            title: row.title,
            category: row.category,
            author_id: row.create_user_id,
            public_at: row.public_at,
            like_count: row.like_count,
            comment_count: row.comment_count,
            score: row.score,
        })
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_window_parse() {
        assert_eq!("daily".parse::<Window>().unwrap(), Window::Daily);
        assert_eq!("lifetime".parse::<Window>().unwrap(), Window::Lifetime);
        assert!(matches!(
            "hourly".parse::<Window>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_window_starts_are_nested() {
        let now = now();
        let daily = Window::Daily.start(now).unwrap();
        let weekly = Window::Weekly.start(now).unwrap();
        let monthly = Window::Monthly.start(now).unwrap();
        assert!(monthly < weekly && weekly < daily);
        assert_eq!(Window::Lifetime.start(now), None);
    }

    #[test]
    fn test_window_membership_scenario() {
        let now = now();
        let two_hours = now - Duration::hours(2);
        let yesterday = now - Duration::hours(26);
        let last_week = now - Duration::days(8);

        assert!(Window::Daily.contains(now, two_hours));
        assert!(!Window::Daily.contains(now, yesterday));

        assert!(Window::Weekly.contains(now, yesterday));
        assert!(!Window::Weekly.contains(now, last_week));

        assert!(Window::Monthly.contains(now, last_week));
        assert!(Window::Lifetime.contains(now, last_week));
    }

    #[test]
    fn test_window_serde_names() {
        assert_eq!(
            serde_json::to_value(Window::Daily).unwrap(),
            serde_json::json!("daily")
        );
        let parsed: Window = serde_json::from_value(serde_json::json!("monthly")).unwrap();
        assert_eq!(parsed, Window::Monthly);
    }
}
