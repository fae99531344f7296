//! Books repository (PostgreSQL)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::BookStore;
use crate::{
    error::AppResult,
    models::book::{Book, NewBook, UpdateBook},
};

const INSERT_BOOK: &str = r#"
    INSERT INTO books (title, publication_year, author_name, views_count)
    VALUES ($1, $2, $3, $4)
    RETURNING *
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn find_active_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_any_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn record_view(&self, id: i32) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET views_count = views_count + 1
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn exists_by_title(&self, title: &str, include_deleted: bool) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM books
                WHERE title = $1 AND ($2 OR is_deleted = FALSE)
            )
            "#,
        )
        .bind(title)
        .bind(include_deleted)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn existing_titles(&self, titles: &[String]) -> AppResult<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT title FROM books WHERE title = ANY($1) ORDER BY title",
        )
        .bind(titles)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE is_deleted = FALSE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_popular(&self, current_year: i32, offset: i64, limit: i64) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE is_deleted = FALSE
            ORDER BY (views_count * 0.5 + ($1::bigint - publication_year) * 2) DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(current_year)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_deleted(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE is_deleted = TRUE ORDER BY deleted_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, book: &NewBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(INSERT_BOOK)
            .bind(&book.title)
            .bind(book.publication_year)
            .bind(&book.author_name)
            .bind(book.views_count)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_batch(&self, books: &[NewBook]) -> AppResult<Vec<Book>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(books.len());

        for book in books {
            let row = sqlx::query_as::<_, Book>(INSERT_BOOK)
                .bind(&book.title)
                .bind(book.publication_year)
                .bind(&book.author_name)
                .bind(book.views_count)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update_active(&self, id: i32, data: &UpdateBook) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, publication_year = $3, author_name = $4
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(data.publication_year)
        .bind(&data.author_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn soft_delete(&self, id: i32, at: DateTime<Utc>) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET is_deleted = TRUE, deleted_at = $2
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn restore(&self, id: i32) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET is_deleted = FALSE, deleted_at = NULL
            WHERE id = $1 AND is_deleted = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
