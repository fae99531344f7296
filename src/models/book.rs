//! Book model and related types.
//!
//! Popularity and age are derived from the stored row at response time and are
//! never persisted, so they follow the calendar without any write.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Weight of a single detail view in the popularity score
pub const VIEW_WEIGHT: f64 = 0.5;
/// Weight of each year since publication in the popularity score
pub const AGE_WEIGHT: f64 = 2.0;

/// Current calendar year (UTC)
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// `views * 0.5 + years * 2`
pub fn popularity_score(views_count: i32, years_since_publication: i64) -> f64 {
    f64::from(views_count) * VIEW_WEIGHT + years_since_publication as f64 * AGE_WEIGHT
}

/// Stored book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub publication_year: i32,
    pub author_name: String,
    /// Incremented on every detail read
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Widened to i64: any i32 publication year is accepted
    pub fn years_since_publication(&self, current_year: i32) -> i64 {
        i64::from(current_year) - i64::from(self.publication_year)
    }

    pub fn popularity_score(&self, current_year: i32) -> f64 {
        popularity_score(self.views_count, self.years_since_publication(current_year))
    }

    /// Detail view with derived fields computed for `current_year`
    pub fn detail(&self, current_year: i32) -> BookDetail {
        BookDetail {
            id: self.id,
            title: self.title.clone(),
            publication_year: self.publication_year,
            author_name: self.author_name.clone(),
            views_count: self.views_count,
            popularity_score: self.popularity_score(current_year),
            years_since_publication: self.years_since_publication(current_year),
            created_at: self.created_at,
        }
    }

    pub fn title_entry(&self, current_year: i32) -> BookTitle {
        BookTitle {
            title: self.title.clone(),
            views_count: self.views_count,
            popularity_score: self.popularity_score(current_year),
        }
    }

    /// Replace the mutable bibliographic fields
    pub fn apply_update(&mut self, data: UpdateBook) {
        self.title = data.title;
        self.publication_year = data.publication_year;
        self.author_name = data.author_name;
    }

    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
    }

    pub fn mark_restored(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
    }
}

/// Book with derived popularity fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub publication_year: i32,
    pub author_name: String,
    pub views_count: i32,
    pub popularity_score: f64,
    pub years_since_publication: i64,
    pub created_at: DateTime<Utc>,
}

/// Entry of the popular books ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookTitle {
    pub title: String,
    pub views_count: i32,
    pub popularity_score: f64,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub publication_year: i32,
    #[validate(length(min = 1, max = 200, message = "Author name must be between 1 and 200 characters"))]
    pub author_name: String,
}

/// Bulk create request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateBooks {
    pub books: Vec<CreateBook>,
}

/// Update book request; all three fields are replaced
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub publication_year: i32,
    #[validate(length(min = 1, max = 200, message = "Author name must be between 1 and 200 characters"))]
    pub author_name: String,
}

/// Row to insert. Id, creation date and deletion state come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub publication_year: i32,
    pub author_name: String,
    pub views_count: i32,
}

impl From<CreateBook> for NewBook {
    fn from(data: CreateBook) -> Self {
        Self {
            title: data.title,
            publication_year: data.publication_year,
            author_name: data.author_name,
            views_count: 0,
        }
    }
}
