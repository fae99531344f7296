//! Repository layer for database operations

pub mod books;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::book::{Book, NewBook, UpdateBook},
};

/// Persistence boundary of the book service.
///
/// Active-only and all-record lookups are separate entry points; nothing here
/// filters soft-deleted rows implicitly. State transitions are single
/// conditional writes that return `None` when the row is not in the expected
/// state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Active (not soft-deleted) book by id
    async fn find_active_by_id(&self, id: i32) -> AppResult<Option<Book>>;

    /// Book by id regardless of deletion state
    async fn find_any_by_id(&self, id: i32) -> AppResult<Option<Book>>;

    /// Atomically increment the view counter of an active book and return the updated row
    async fn record_view(&self, id: i32) -> AppResult<Option<Book>>;

    async fn exists_by_title(&self, title: &str, include_deleted: bool) -> AppResult<bool>;

    /// Subset of `titles` already present in storage, deleted records included
    async fn existing_titles(&self, titles: &[String]) -> AppResult<Vec<String>>;

    async fn count_active(&self) -> AppResult<i64>;

    async fn count_all(&self) -> AppResult<i64>;

    /// One page of active books ordered by popularity for `current_year`, ties by id
    async fn list_popular(&self, current_year: i32, offset: i64, limit: i64) -> AppResult<Vec<Book>>;

    async fn list_deleted(&self) -> AppResult<Vec<Book>>;

    async fn insert(&self, book: &NewBook) -> AppResult<Book>;

    /// Insert all rows or none
    async fn insert_batch(&self, books: &[NewBook]) -> AppResult<Vec<Book>>;

    /// Replace title, year and author of an active book
    async fn update_active(&self, id: i32, data: &UpdateBook) -> AppResult<Option<Book>>;

    /// Flag an active book as deleted at `at`
    async fn soft_delete(&self, id: i32, at: DateTime<Utc>) -> AppResult<Option<Book>>;

    /// Clear the deletion flag of a deleted book
    async fn restore(&self, id: i32) -> AppResult<Option<Book>>;

    /// Storage round-trip for readiness checks
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            pool,
        }
    }
}
