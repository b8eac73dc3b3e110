use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

// Like and comment rows are append-only events. An un-like sets
// `deleted_at` instead of removing the row, so every aggregation filters on
// `deleted_at IS NULL`.

#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::article_likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ArticleLike {
    pub id: i32,
    pub user_id: i32,
    pub article_id: i32,
    pub created_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::article_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ArticleComment {
    pub id: i32,
    pub article_id: i32,
    pub user_id: i32,
    pub comment: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}
