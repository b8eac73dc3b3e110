use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

/// Visibility value stored in `articles.public_status`. Only articles with
/// this status participate in aggregation, ranking and related lookups.
pub const STATUS_PUBLIC: &str = "public";

#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::articles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Article {
    pub id: i32,
    pub category: Option<Vec<String>>,
    pub title: String,
    pub content: String,
    pub public_status: String,
    pub create_user_id: i32,
    pub public_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl Article {
    /// The first category tag. This is the sole key used for related-article
    /// matching; an article without one is excluded from related lookups.
    pub fn primary_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .and_then(|tags| tags.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn article_with_categories(category: Option<Vec<&str>>) -> Article {
        let epoch = chrono::DateTime::from_timestamp(0, 0).unwrap().naive_utc();
        Article {
            id: 1,
            category: category.map(|tags| tags.into_iter().map(String::from).collect()),
            title: "title".into(),
            content: "content".into(),
            public_status: STATUS_PUBLIC.into(),
            create_user_id: 1,
            public_at: Some(epoch),
            created_at: epoch,
            updated_at: epoch,
            deleted_at: None,
        }
    }

    #[test]
    fn test_primary_category_is_first_tag() {
        let article = article_with_categories(Some(vec!["pets", "cats"]));
        assert_eq!(article.primary_category(), Some("pets"));
    }

    #[test]
    fn test_primary_category_missing() {
        assert_eq!(article_with_categories(None).primary_category(), None);
        assert_eq!(
            article_with_categories(Some(vec![])).primary_category(),
            None
        );
    }
}
