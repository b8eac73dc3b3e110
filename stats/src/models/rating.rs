use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::Serialize;

/// Lifetime per-article counter snapshot, lazily created on the first
/// metric event and recomputed from raw events by the batch run.
#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::history_rating)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRating {
    pub id: i32,
    pub article_id: i32,
    pub access_count: i64,
    pub like_count: i64,
    pub super_like_count: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::history_rating)]
pub struct NewHistoryRating {
    pub article_id: i32,
    pub access_count: i64,
    pub like_count: i64,
    pub super_like_count: i64,
}

/// One row per article per calendar day; the row covers the window
/// [day 00:00, day+1 00:00). Unique on (article_id, day).
#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::daily_rating)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DailyRating {
    pub id: i32,
    pub article_id: i32,
    pub day: NaiveDate,
    pub access_count: i64,
    pub like_count: i64,
    pub super_like_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::daily_rating)]
pub struct NewDailyRating {
    pub article_id: i32,
    pub day: NaiveDate,
    pub access_count: i64,
    pub like_count: i64,
    pub super_like_count: i64,
}

/// Rolling window counters per article, recomputed in place on every batch
/// run. Unique on article_id.
#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::aggregate_points)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AggregatePoints {
    pub id: i32,
    pub article_id: i32,
    pub access_daily: i64,
    pub access_weekly: i64,
    pub access_monthly: i64,
    pub access_total: i64,
    pub like_daily: i64,
    pub like_weekly: i64,
    pub like_monthly: i64,
    pub like_total: i64,
    pub super_like_daily: i64,
    pub super_like_weekly: i64,
    pub super_like_monthly: i64,
    pub super_like_total: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::aggregate_points)]
pub struct NewAggregatePoints {
    pub article_id: i32,
    pub access_daily: i64,
    pub access_weekly: i64,
    pub access_monthly: i64,
    pub access_total: i64,
    pub like_daily: i64,
    pub like_weekly: i64,
    pub like_monthly: i64,
    pub like_total: i64,
    pub super_like_daily: i64,
    pub super_like_weekly: i64,
    pub super_like_monthly: i64,
    pub super_like_total: i64,
}
