//! Scheduled batch recompute of the derived counter tables.
//!
//! One run loads the raw like/comment events in a single scan, folds them
//! into per-article window counts ([`rollup`]) and then runs four phases,
//! each in its own transaction: daily ratings, aggregate points, the
//! lifetime snapshot and the retention purge. A failed phase is logged and
//! rolled back without aborting the rest of the run; re-running with no
//! new events rewrites identical rows.

use chrono::{Duration, NaiveDateTime};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::{
    App,
    models::article::STATUS_PUBLIC,
    models::rating::{NewAggregatePoints, NewDailyRating, NewHistoryRating},
    schema::{aggregate_points, article_comments, article_likes, articles, daily_rating, history_rating},
};

pub mod rollup;

use rollup::{Rollup, WindowBounds, WINDOW_ACCESS_PER_LIKE};

/// Daily rating rows older than this are purged at the end of each run.
pub const RETENTION_DAYS: i64 = 30;

// Advisory lock key guarding against overlapping runs.
const RUN_LOCK_KEY: i64 = 0x7374_6174_735f_6261;

#[derive(Debug, Default)]
pub struct RunReport {
    /// Another invocation held the run lock; nothing was recomputed.
    pub skipped: bool,
    pub articles: usize,
    pub failed_phases: usize,
    pub purged_rows: usize,
}

/// One full aggregation run. Returns `Err` only when the store itself is
/// unreachable; individual phase failures are logged and counted in the
/// report instead.
pub async fn run(app: &App, now: NaiveDateTime) -> eyre::Result<RunReport> {
    let mut conn = app.diesel.get().await?;

    if !try_acquire_run_lock(&mut conn).await? {
        tracing::warn!("another aggregation run holds the lock, skipping");
        return Ok(RunReport {
            skipped: true,
            ..Default::default()
        });
    }

    let result = run_phases(&mut conn, now).await;

    if let Err(err) = release_run_lock(&mut conn).await {
        tracing::warn!(?err, "failed to release the aggregation run lock");
    }

    result
}

async fn run_phases(conn: &mut AsyncPgConnection, now: NaiveDateTime) -> eyre::Result<RunReport> {
    let bounds = WindowBounds::at(now);

    let article_ids: Vec<i32> = articles::table
        .filter(articles::deleted_at.is_null())
        .filter(articles::public_status.eq(STATUS_PUBLIC))
        .select(articles::id)
        .load(conn)
        .await?;

    let likes: Vec<(i32, NaiveDateTime)> = article_likes::table
        .filter(article_likes::deleted_at.is_null())
        .select((article_likes::article_id, article_likes::created_at))
        .load(conn)
        .await?;

    // Comments only feed yesterday's access proxy, so the scan can start at
    // the day boundary.
    let comments: Vec<(i32, NaiveDateTime)> = article_comments::table
        .filter(article_comments::deleted_at.is_null())
        .filter(article_comments::created_at.ge(bounds.yesterday_start))
        .select((article_comments::article_id, article_comments::created_at))
        .load(conn)
        .await?;

    tracing::debug!(
        articles = article_ids.len(),
        likes = likes.len(),
        comments = comments.len(),
        "loaded rows for aggregation"
    );

    let rollup = Rollup::from_events(bounds, &likes, &comments);

    let mut report = RunReport {
        articles: article_ids.len(),
        ..Default::default()
    };

    if let Err(err) = upsert_daily_ratings(conn, &rollup, &article_ids).await {
        tracing::error!(?err, "daily rating phase failed");
        report.failed_phases += 1;
    }

    if let Err(err) = upsert_aggregate_points(conn, &rollup, &article_ids).await {
        tracing::error!(?err, "aggregate points phase failed");
        report.failed_phases += 1;
    }

    if let Err(err) = upsert_lifetime_snapshots(conn, &rollup, &article_ids).await {
        tracing::error!(?err, "lifetime snapshot phase failed");
        report.failed_phases += 1;
    }

    match purge_old_daily_ratings(conn, &bounds).await {
        Ok(purged) => report.purged_rows = purged,
        Err(err) => {
            tracing::error!(?err, "retention purge phase failed");
            report.failed_phases += 1;
        }
    }

    Ok(report)
}

/// Upsert one (article, yesterday) row per public article, keyed on the
/// calendar day.
async fn upsert_daily_ratings(
    conn: &mut AsyncPgConnection,
    rollup: &Rollup,
    article_ids: &[i32],
) -> Result<(), diesel::result::Error> {
    let day = rollup.bounds.yesterday();
    let rows: Vec<NewDailyRating> = article_ids
        .iter()
        .map(|&article_id| {
            let article = rollup.article(article_id);
            NewDailyRating {
                article_id,
                day,
                access_count: article.yesterday_access(),
                like_count: article.yesterday_likes,
                super_like_count: 0,
            }
        })
        .collect();

    if rows.is_empty() {
        return Ok(());
    }

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            diesel::insert_into(daily_rating::table)
                .values(&rows)
                .on_conflict((daily_rating::article_id, daily_rating::day))
                .do_update()
                .set((
                    daily_rating::access_count.eq(excluded(daily_rating::access_count)),
                    daily_rating::like_count.eq(excluded(daily_rating::like_count)),
                    daily_rating::super_like_count
                        .eq(excluded(daily_rating::super_like_count)),
                    daily_rating::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await
}

/// Recompute the rolling daily/weekly/monthly/lifetime counters in place.
async fn upsert_aggregate_points(
    conn: &mut AsyncPgConnection,
    rollup: &Rollup,
    article_ids: &[i32],
) -> Result<(), diesel::result::Error> {
    let rows: Vec<NewAggregatePoints> = article_ids
        .iter()
        .map(|&article_id| {
            let likes = rollup.article(article_id).likes;
            NewAggregatePoints {
                article_id,
                access_daily: likes.daily * WINDOW_ACCESS_PER_LIKE,
                access_weekly: likes.weekly * WINDOW_ACCESS_PER_LIKE,
                access_monthly: likes.monthly * WINDOW_ACCESS_PER_LIKE,
                access_total: rollup.article(article_id).lifetime_access(),
                like_daily: likes.daily,
                like_weekly: likes.weekly,
                like_monthly: likes.monthly,
                like_total: likes.lifetime,
                super_like_daily: 0,
                super_like_weekly: 0,
                super_like_monthly: 0,
                super_like_total: 0,
            }
        })
        .collect();

    if rows.is_empty() {
        return Ok(());
    }

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            diesel::insert_into(aggregate_points::table)
                .values(&rows)
                .on_conflict(aggregate_points::article_id)
                .do_update()
                .set((
                    aggregate_points::access_daily
                        .eq(excluded(aggregate_points::access_daily)),
                    aggregate_points::access_weekly
                        .eq(excluded(aggregate_points::access_weekly)),
                    aggregate_points::access_monthly
                        .eq(excluded(aggregate_points::access_monthly)),
                    aggregate_points::access_total
                        .eq(excluded(aggregate_points::access_total)),
                    aggregate_points::like_daily.eq(excluded(aggregate_points::like_daily)),
                    aggregate_points::like_weekly
                        .eq(excluded(aggregate_points::like_weekly)),
                    aggregate_points::like_monthly
                        .eq(excluded(aggregate_points::like_monthly)),
                    aggregate_points::like_total.eq(excluded(aggregate_points::like_total)),
                    aggregate_points::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await
}

/// Recompute the lifetime snapshot from raw events. Super-like counts are
/// maintained live by the metric store and left untouched on update.
async fn upsert_lifetime_snapshots(
    conn: &mut AsyncPgConnection,
    rollup: &Rollup,
    article_ids: &[i32],
) -> Result<(), diesel::result::Error> {
    let rows: Vec<NewHistoryRating> = article_ids
        .iter()
        .map(|&article_id| {
            let article = rollup.article(article_id);
            NewHistoryRating {
                article_id,
                access_count: article.lifetime_access(),
                like_count: article.likes.lifetime,
                super_like_count: 0,
            }
        })
        .collect();

    if rows.is_empty() {
        return Ok(());
    }

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            diesel::insert_into(history_rating::table)
                .values(&rows)
                .on_conflict(history_rating::article_id)
                .do_update()
                .set((
                    history_rating::access_count
                        .eq(excluded(history_rating::access_count)),
                    history_rating::like_count.eq(excluded(history_rating::like_count)),
                ))
                .execute(conn)
                .await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await
}

async fn purge_old_daily_ratings(
    conn: &mut AsyncPgConnection,
    bounds: &WindowBounds,
) -> Result<usize, diesel::result::Error> {
    let cutoff = bounds.today_start.date() - Duration::days(RETENTION_DAYS);

    diesel::delete(daily_rating::table.filter(daily_rating::day.lt(cutoff)))
        .execute(conn)
        .await
}

#[derive(QueryableByName)]
struct LockRow {
    #[diesel(sql_type = diesel::sql_types::Bool)]
    locked: bool,
}

async fn try_acquire_run_lock(
    conn: &mut AsyncPgConnection,
) -> Result<bool, diesel::result::Error> {
    let row: LockRow = diesel::sql_query("SELECT pg_try_advisory_lock($1) AS locked")
        .bind::<diesel::sql_types::BigInt, _>(RUN_LOCK_KEY)
        .get_result(conn)
        .await?;
    Ok(row.locked)
}

async fn release_run_lock(conn: &mut AsyncPgConnection) -> Result<(), diesel::result::Error> {
    diesel::sql_query("SELECT pg_advisory_unlock($1) AS locked")
        .bind::<diesel::sql_types::BigInt, _>(RUN_LOCK_KEY)
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_retention_cutoff() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap();
        let bounds = WindowBounds::at(now);
        let cutoff = bounds.today_start.date() - Duration::days(RETENTION_DAYS);
        assert_eq!(cutoff, NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
    }
}
