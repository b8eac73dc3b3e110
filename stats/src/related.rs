//! Related-article lookups: by shared primary category and by author.
//!
//! Relatedness is keyed on the source article's primary category (index 0
//! of its category array) and matched with set-containment against the
//! other articles' arrays. Engagement data for the result page is
//! batch-fetched with two grouped queries and merged in memory.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Integer, Nullable, Text, Timestamp};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::{
    App,
    error::AppError,
    metrics::Metrics,
    models::article::{Article, STATUS_PUBLIC},
    schema::{article_comments, articles, history_rating},
};

pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Clone, Debug, Serialize)]
pub struct RelatedArticle {
    pub id: i32,
    pub title: String,
    pub category: Option<Vec<String>>,
    pub author_id: i32,
    pub public_at: Option<NaiveDateTime>,
    pub metrics: Metrics,
    pub comment_count: i64,
}

#[derive(QueryableByName, Debug)]
struct RelatedRow {
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
}

#[derive(Clone, Debug)]
struct ArticleHead {
    id: i32,
    title: String,
    category: Option<Vec<String>>,
    author_id: i32,
    public_at: Option<NaiveDateTime>,
}

/// Other public articles sharing the source's primary category, newest
/// first, the source itself excluded. NotFound when the source article is
/// missing, soft-deleted or has no primary category.
pub async fn get_related(
    app: &App,
    article_id: i32,
    limit: i64,
) -> Result<Vec<RelatedArticle>, AppError> {
    let mut conn = app.diesel.get().await?;

    let source = load_source(&mut conn, article_id).await?;
    let primary = source
        .primary_category()
        .ok_or(AppError::NotFound("article has no primary category"))?
        .to_string();

    let rows: Vec<RelatedRow> = diesel::sql_query(
        r#"
        SELECT id, title, category, create_user_id, public_at
        FROM articles
        WHERE deleted_at IS NULL
          AND public_status = 'public'
          AND id != $1
          AND $2 = ANY(category)
        ORDER BY public_at DESC NULLS LAST, id ASC
        LIMIT $3
    "#,
    )
    .bind::<Integer, _>(article_id)
    .bind::<Text, _>(primary)
    .bind::<BigInt, _>(limit.max(0))
    .load(&mut conn)
    .await?;

    let heads: Vec<ArticleHead> = rows
        .into_iter()
        .map(|row| ArticleHead {
            id: row.id,
            title: row.title,
            category: row.category,
            author_id: row.create_user_id,
            public_at: row.public_at,
        })
        .collect();

    let (snapshots, comment_counts) = load_engagement(&mut conn, &heads).await?;
    Ok(attach_engagement(heads, snapshots, comment_counts))
}

/// Other public articles by the same author, newest first, the source
/// itself excluded.
pub async fn get_by_author(
    app: &App,
    article_id: i32,
    limit: i64,
) -> Result<Vec<RelatedArticle>, AppError> {
    let mut conn = app.diesel.get().await?;

    let source = load_source(&mut conn, article_id).await?;

    let rows: Vec<(i32, String, Option<Vec<String>>, i32, Option<NaiveDateTime>)> =
        articles::table
            .filter(articles::create_user_id.eq(source.create_user_id))
            .filter(articles::id.ne(article_id))
            .filter(articles::deleted_at.is_null())
            .filter(articles::public_status.eq(STATUS_PUBLIC))
            .order((articles::public_at.desc().nulls_last(), articles::id.asc()))
            .limit(limit.max(0))
            .select((
                articles::id,
                articles::title,
                articles::category,
                articles::create_user_id,
                articles::public_at,
            ))
            .load(&mut conn)
            .await?;

    let heads: Vec<ArticleHead> = rows
        .into_iter()
        .map(|(id, title, category, author_id, public_at)| ArticleHead {
            id,
            title,
            category,
            author_id,
            public_at,
        })
        .collect();

    let (snapshots, comment_counts) = load_engagement(&mut conn, &heads).await?;
    Ok(attach_engagement(heads, snapshots, comment_counts))
}

async fn load_source(
    conn: &mut AsyncPgConnection,
    article_id: i32,
) -> Result<Article, AppError> {
    articles::table
        .filter(articles::id.eq(article_id))
        .filter(articles::deleted_at.is_null())
        .select(Article::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or(AppError::NotFound("article"))
}

/// Two grouped queries for the whole result page instead of per-row
/// subqueries.
async fn load_engagement(
    conn: &mut AsyncPgConnection,
    heads: &[ArticleHead],
) -> Result<(HashMap<i32, Metrics>, HashMap<i32, i64>), AppError> {
    if heads.is_empty() {
        return Ok((HashMap::new(), HashMap::new()));
    }

    let ids: Vec<i32> = heads.iter().map(|head| head.id).collect();

    let snapshots: HashMap<i32, Metrics> = history_rating::table
        .filter(history_rating::article_id.eq_any(&ids))
        .select((
            history_rating::article_id,
            history_rating::access_count,
            history_rating::like_count,
            history_rating::super_like_count,
        ))
        .load::<(i32, i64, i64, i64)>(conn)
        .await?
        .into_iter()
        .map(|(article_id, access, like, super_like)| {
            (
                article_id,
                Metrics {
                    access,
                    like,
                    super_like,
                },
            )
        })
        .collect();

    let comment_counts: HashMap<i32, i64> = article_comments::table
        .filter(article_comments::article_id.eq_any(&ids))
        .filter(article_comments::deleted_at.is_null())
        .group_by(article_comments::article_id)
        .select((article_comments::article_id, diesel::dsl::count_star()))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();

    Ok((snapshots, comment_counts))
}

fn attach_engagement(
    heads: Vec<ArticleHead>,
    mut snapshots: HashMap<i32, Metrics>,
    comment_counts: HashMap<i32, i64>,
) -> Vec<RelatedArticle> {
    heads
        .into_iter()
        .map(|head| RelatedArticle {
            metrics: snapshots.remove(&head.id).unwrap_or_default(),
            comment_count: comment_counts.get(&head.id).copied().unwrap_or(0),
            id: head.id,
            title: head.title,
            category: head.category,
            author_id: head.author_id,
            public_at: head.public_at,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn head(id: i32) -> ArticleHead {
        ArticleHead {
            id,
            title: format!("Article {id}"),
            category: Some(vec!["pets".into()]),
            author_id: 1,
            public_at: None,
        }
    }

    #[test]
    fn test_attach_engagement_preserves_order_and_defaults() {
        let heads = vec![head(3), head(1), head(2)];
        let snapshots = HashMap::from([(
            1,
            Metrics {
                access: 5,
                like: 2,
                super_like: 1,
            },
        )]);
        let comment_counts = HashMap::from([(2, 7)]);

        let result = attach_engagement(heads, snapshots, comment_counts);

        assert_eq!(
            result.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
        assert_eq!(result[0].metrics, Metrics::default());
        assert_eq!(result[0].comment_count, 0);
        assert_eq!(result[1].metrics.like, 2);
        assert_eq!(result[2].comment_count, 7);
    }
}
