//! Pure windowed counting over raw like/comment events.
//!
//! The batch run loads event rows in a single scan and folds them here
//! instead of issuing per-article COUNT queries, so the window math is
//! plain code that the unit tests can drive directly.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

// Access counts are a synthetic engagement proxy until a real access log is
// wired in; keep the weights here so swapping the source later is a local
// change.
pub const DAILY_ACCESS_PER_LIKE: i64 = 10;
pub const DAILY_ACCESS_PER_COMMENT: i64 = 5;
pub const WINDOW_ACCESS_PER_LIKE: i64 = 10;
pub const LIFETIME_ACCESS_PER_LIKE: i64 = 15;
pub const LIFETIME_ACCESS_BASELINE: i64 = 100;

/// Time boundaries of a single batch run, all derived from one `now`.
///
/// The rolling windows (`day_ago`/`week_ago`/`month_ago`) feed the
/// aggregate points; `yesterday_start..today_start` is the calendar day
/// covered by the daily rating row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowBounds {
    pub day_ago: NaiveDateTime,
    pub week_ago: NaiveDateTime,
    pub month_ago: NaiveDateTime,
    pub yesterday_start: NaiveDateTime,
    pub today_start: NaiveDateTime,
}

impl WindowBounds {
    pub fn at(now: NaiveDateTime) -> Self {
        let today_start = now.date().and_time(NaiveTime::MIN);
        WindowBounds {
            day_ago: now - Duration::days(1),
            week_ago: now - Duration::days(7),
            month_ago: now - Duration::days(30),
            yesterday_start: today_start - Duration::days(1),
            today_start,
        }
    }

    /// The calendar day the daily-rating phase writes.
    pub fn yesterday(&self) -> NaiveDate {
        self.yesterday_start.date()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowCounts {
    pub daily: i64,
    pub weekly: i64,
    pub monthly: i64,
    pub lifetime: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArticleRollup {
    pub likes: WindowCounts,
    pub yesterday_likes: i64,
    pub yesterday_comments: i64,
}

impl ArticleRollup {
    pub fn yesterday_access(&self) -> i64 {
        self.yesterday_likes * DAILY_ACCESS_PER_LIKE
            + self.yesterday_comments * DAILY_ACCESS_PER_COMMENT
    }

    pub fn lifetime_access(&self) -> i64 {
        self.likes.lifetime * LIFETIME_ACCESS_PER_LIKE + LIFETIME_ACCESS_BASELINE
    }
}

/// Per-article counts for one run. Events carry `(article_id, created_at)`
/// and must already exclude soft-deleted rows.
#[derive(Debug)]
pub struct Rollup {
    pub bounds: WindowBounds,
    per_article: HashMap<i32, ArticleRollup>,
}

impl Rollup {
    pub fn from_events(
        bounds: WindowBounds,
        likes: &[(i32, NaiveDateTime)],
        comments: &[(i32, NaiveDateTime)],
    ) -> Self {
        let mut per_article = HashMap::<i32, ArticleRollup>::new();

        for &(article_id, ts) in likes {
            let entry = per_article.entry(article_id).or_default();
            entry.likes.lifetime += 1;
            if ts >= bounds.month_ago {
                entry.likes.monthly += 1;
            }
            if ts >= bounds.week_ago {
                entry.likes.weekly += 1;
            }
            if ts >= bounds.day_ago {
                entry.likes.daily += 1;
            }
            if ts >= bounds.yesterday_start && ts < bounds.today_start {
                entry.yesterday_likes += 1;
            }
        }

        for &(article_id, ts) in comments {
            if ts >= bounds.yesterday_start && ts < bounds.today_start {
                per_article.entry(article_id).or_default().yesterday_comments += 1;
            }
        }

        Rollup {
            bounds,
            per_article,
        }
    }

    /// Counts for an article; zeroes when it had no events.
    pub fn article(&self, article_id: i32) -> ArticleRollup {
        self.per_article
            .get(&article_id)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_bounds_are_nested() {
        let bounds = WindowBounds::at(noon(2024, 6, 15));
        assert!(bounds.month_ago < bounds.week_ago);
        assert!(bounds.week_ago < bounds.day_ago);
        assert_eq!(bounds.yesterday(), NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
        assert_eq!(bounds.today_start - bounds.yesterday_start, Duration::days(1));
    }

    #[test]
    fn test_window_membership_scenario() {
        // Likes at T-2h, T-26h and T-8d: the rolling daily window sees only
        // the first, the weekly window the first two, the monthly and
        // lifetime windows all three.
        let now = noon(2024, 6, 15);
        let likes = vec![
            (7, now - Duration::hours(2)),
            (7, now - Duration::hours(26)),
            (7, now - Duration::days(8)),
        ];
        let rollup = Rollup::from_events(WindowBounds::at(now), &likes, &[]);

        let counts = rollup.article(7).likes;
        assert_eq!(counts.daily, 1);
        assert_eq!(counts.weekly, 2);
        assert_eq!(counts.monthly, 3);
        assert_eq!(counts.lifetime, 3);
    }

    #[test]
    fn test_window_counts_are_monotonic() {
        let now = noon(2024, 6, 15);
        let likes: Vec<(i32, NaiveDateTime)> = (0..120)
            .map(|i| (1, now - Duration::hours(i * 13)))
            .collect();
        let rollup = Rollup::from_events(WindowBounds::at(now), &likes, &[]);

        let counts = rollup.article(1).likes;
        assert!(counts.lifetime >= counts.monthly);
        assert!(counts.monthly >= counts.weekly);
        assert!(counts.weekly >= counts.daily);
    }

    #[test]
    fn test_yesterday_is_the_calendar_day() {
        let now = noon(2024, 6, 15);
        let bounds = WindowBounds::at(now);
        let likes = vec![
            // 23:30 yesterday: inside the calendar day
            (3, bounds.today_start - Duration::minutes(30)),
            // 00:30 today: outside
            (3, bounds.today_start + Duration::minutes(30)),
            // 23:30 two days ago: outside
            (3, bounds.yesterday_start - Duration::minutes(30)),
        ];
        let comments = vec![(3, bounds.yesterday_start + Duration::hours(1))];
        let rollup = Rollup::from_events(bounds, &likes, &comments);

        let article = rollup.article(3);
        assert_eq!(article.yesterday_likes, 1);
        assert_eq!(article.yesterday_comments, 1);
    }

    #[test]
    fn test_access_proxy_weights() {
        let article = ArticleRollup {
            likes: WindowCounts {
                daily: 1,
                weekly: 2,
                monthly: 3,
                lifetime: 4,
            },
            yesterday_likes: 2,
            yesterday_comments: 3,
        };
        assert_eq!(article.yesterday_access(), 2 * 10 + 3 * 5);
        assert_eq!(article.lifetime_access(), 4 * 15 + 100);
    }

    #[test]
    fn test_same_events_produce_identical_rollups() {
        let now = noon(2024, 6, 15);
        let bounds = WindowBounds::at(now);
        let likes = vec![(1, now - Duration::hours(3)), (2, now - Duration::days(2))];
        let comments = vec![(1, now - Duration::hours(20))];

        let first = Rollup::from_events(bounds, &likes, &comments);
        let second = Rollup::from_events(bounds, &likes, &comments);
        assert_eq!(first.article(1), second.article(1));
        assert_eq!(first.article(2), second.article(2));
    }

    #[test]
    fn test_unknown_article_rolls_up_to_zero() {
        let rollup = Rollup::from_events(WindowBounds::at(noon(2024, 6, 15)), &[], &[]);
        assert_eq!(rollup.article(42), ArticleRollup::default());
    }
}
