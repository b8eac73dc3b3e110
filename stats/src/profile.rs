//! Per-user statistics rollup for profile pages.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::{
    App,
    error::AppError,
    schema::{article_comments, article_likes, articles, user_follower},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub article_count: i64,
    pub likes_received: i64,
    pub comments_received: i64,
    pub follower_count: i64,
}

/// Rollup across the user's non-deleted articles and follow edges. A user
/// with no data gets zeros; missing data is not an error.
pub async fn get_profile_stats(app: &App, user_id: i32) -> Result<ProfileStats, AppError> {
    let mut conn = app.diesel.get().await?;

    let article_count: i64 = articles::table
        .filter(articles::create_user_id.eq(user_id))
        .filter(articles::deleted_at.is_null())
        .count()
        .get_result(&mut conn)
        .await?;

    let likes_received: i64 = article_likes::table
        .inner_join(articles::table)
        .filter(articles::create_user_id.eq(user_id))
        .filter(articles::deleted_at.is_null())
        .filter(article_likes::deleted_at.is_null())
        .count()
        .get_result(&mut conn)
        .await?;

    let comments_received: i64 = article_comments::table
        .inner_join(articles::table)
        .filter(articles::create_user_id.eq(user_id))
        .filter(articles::deleted_at.is_null())
        .filter(article_comments::deleted_at.is_null())
        .count()
        .get_result(&mut conn)
        .await?;

    let follower_count: i64 = user_follower::table
        .filter(user_follower::follow_user_id.eq(user_id))
        .filter(user_follower::deleted_at.is_null())
        .count()
        .get_result(&mut conn)
        .await?;

    Ok(ProfileStats {
        article_count,
        likes_received,
        comments_received,
        follower_count,
    })
}
