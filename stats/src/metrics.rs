//! Lifetime per-article counters (the `history_rating` snapshot).
//!
//! Increments are single-statement upserts so that two concurrent likes on
//! the same article can never lose an update; the snapshot row is created
//! seeded at zero the first time any counter is touched.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::{
    App,
    error::AppError,
    schema::{articles, history_rating},
};

/// Wire shape of a snapshot read. Field names are part of the public API.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub access: i64,
    pub like: i64,
    pub super_like: i64,
}

pub async fn increment_access(app: &App, article_id: i32) -> Result<(), AppError> {
    let mut conn = app.diesel.get().await?;
    ensure_article(&mut conn, article_id).await?;

    diesel::insert_into(history_rating::table)
        .values((
            history_rating::article_id.eq(article_id),
            history_rating::access_count.eq(1i64),
            history_rating::like_count.eq(0i64),
            history_rating::super_like_count.eq(0i64),
        ))
        .on_conflict(history_rating::article_id)
        .do_update()
        .set(history_rating::access_count.eq(history_rating::access_count + 1_i64))
        .execute(&mut conn)
        .await?;

    Ok(())
}

pub async fn increment_like(app: &App, article_id: i32) -> Result<(), AppError> {
    let mut conn = app.diesel.get().await?;
    ensure_article(&mut conn, article_id).await?;

    diesel::insert_into(history_rating::table)
        .values((
            history_rating::article_id.eq(article_id),
            history_rating::access_count.eq(0i64),
            history_rating::like_count.eq(1i64),
            history_rating::super_like_count.eq(0i64),
        ))
        .on_conflict(history_rating::article_id)
        .do_update()
        .set(history_rating::like_count.eq(history_rating::like_count + 1_i64))
        .execute(&mut conn)
        .await?;

    Ok(())
}

pub async fn increment_super_like(app: &App, article_id: i32) -> Result<(), AppError> {
    let mut conn = app.diesel.get().await?;
    ensure_article(&mut conn, article_id).await?;

    diesel::insert_into(history_rating::table)
        .values((
            history_rating::article_id.eq(article_id),
            history_rating::access_count.eq(0i64),
            history_rating::like_count.eq(0i64),
            history_rating::super_like_count.eq(1i64),
        ))
        .on_conflict(history_rating::article_id)
        .do_update()
        .set(history_rating::super_like_count.eq(history_rating::super_like_count + 1_i64))
        .execute(&mut conn)
        .await?;

    Ok(())
}

/// Zeros for an article with no snapshot row; missing data is not an error.
pub async fn get_metrics(app: &App, article_id: i32) -> Result<Metrics, AppError> {
    let mut conn = app.diesel.get().await?;

    let row = history_rating::table
        .filter(history_rating::article_id.eq(article_id))
        .select((
            history_rating::access_count,
            history_rating::like_count,
            history_rating::super_like_count,
        ))
        .first::<(i64, i64, i64)>(&mut conn)
        .await
        .optional()?;

    Ok(row
        .map(|(access, like, super_like)| Metrics {
            access,
            like,
            super_like,
        })
        .unwrap_or_default())
}

async fn ensure_article(
    conn: &mut AsyncPgConnection,
    article_id: i32,
) -> Result<(), AppError> {
    let exists = articles::table
        .filter(articles::id.eq(article_id))
        .filter(articles::deleted_at.is_null())
        .select(articles::id)
        .first::<i32>(conn)
        .await
        .optional()?;

    if exists.is_none() {
        return Err(AppError::NotFound("article"));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_metrics_default_is_zero() {
        assert_eq!(
            Metrics::default(),
            Metrics {
                access: 0,
                like: 0,
                super_like: 0
            }
        );
    }

    #[test]
    fn test_metrics_wire_field_names() {
        let json = serde_json::to_value(Metrics {
            access: 3,
            like: 2,
            super_like: 1,
        })
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({"access": 3, "like": 2, "superLike": 1})
        );
    }
}
