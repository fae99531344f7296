//! Book lifecycle and query service
//!
//! Owns visibility (active vs soft-deleted), title uniqueness, popularity
//! ranking and pagination. Reading a book's details is also a write: every
//! `get_by_id` bumps the stored view counter before the detail is returned.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{current_year, Book, BookDetail, BookTitle, CreateBook, NewBook, UpdateBook},
        pagination::{PageRequest, PaginatedResponse},
    },
    repository::BookStore,
};

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with ID {} not found.", id))
}

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Detail of an active book. Increments its view count first.
    pub async fn get_by_id(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.store.record_view(id).await?.ok_or_else(|| not_found(id))?;
        tracing::debug!("Book {} viewed ({} views)", book.id, book.views_count);
        Ok(book.detail(current_year()))
    }

    /// Active books ranked by popularity score, highest first
    pub async fn list_popular(
        &self,
        page_number: i64,
        page_size: i64,
    ) -> AppResult<PaginatedResponse<BookTitle>> {
        let page = PageRequest::new(page_number, page_size)?;
        let year = current_year();

        let total_count = self.store.count_active().await?;
        let items: Vec<BookTitle> = self
            .store
            .list_popular(year, page.offset(), page.page_size)
            .await?
            .iter()
            .map(|book| book.title_entry(year))
            .collect();

        Ok(PaginatedResponse::new(items, page, total_count))
    }

    /// Create a book. Titles of soft-deleted books stay reserved.
    pub async fn create(&self, data: CreateBook) -> AppResult<Book> {
        data.validate()?;

        if self.store.exists_by_title(&data.title, true).await? {
            return Err(AppError::Conflict(
                "A book with this title already exists.".to_string(),
            ));
        }

        let book = self.store.insert(&NewBook::from(data)).await?;
        tracing::info!("Book created: id={} title={:?}", book.id, book.title);
        Ok(book)
    }

    /// Create several books at once; nothing is stored unless all of them can be
    pub async fn create_bulk(&self, books: Vec<CreateBook>) -> AppResult<Vec<Book>> {
        if books.is_empty() {
            return Err(AppError::Validation("At least one book is required.".to_string()));
        }
        for data in &books {
            data.validate()?;
        }

        let distinct = books
            .iter()
            .map(|b| b.title.as_str())
            .collect::<HashSet<_>>()
            .len();
        if distinct != books.len() {
            return Err(AppError::BadRequest(
                "Duplicate book titles in the request.".to_string(),
            ));
        }

        let titles: Vec<String> = books.iter().map(|b| b.title.clone()).collect();
        let existing = self.store.existing_titles(&titles).await?;
        if !existing.is_empty() {
            return Err(AppError::Conflict(format!(
                "The following books already exist: {}",
                existing.join(", ")
            )));
        }

        let rows: Vec<NewBook> = books.into_iter().map(NewBook::from).collect();
        let created = self.store.insert_batch(&rows).await?;
        tracing::info!("Bulk created {} books", created.len());
        Ok(created)
    }

    /// Replace title, year and author of an active book.
    ///
    /// The new title is not checked against other books; a collision is only
    /// caught by the storage unique index and surfaces as a storage error.
    pub async fn update(&self, id: i32, data: UpdateBook) -> AppResult<Book> {
        data.validate()?;

        let saved = self
            .store
            .update_active(id, &data)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Book updated: id={}", saved.id);
        Ok(saved)
    }

    /// Hide an active book from default listings
    pub async fn soft_delete(&self, id: i32) -> AppResult<()> {
        self.store
            .soft_delete(id, Utc::now())
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Book soft-deleted: id={}", id);
        Ok(())
    }

    /// Bring a soft-deleted book back. Does not count as a view.
    pub async fn restore(&self, id: i32) -> AppResult<BookDetail> {
        if let Some(restored) = self.store.restore(id).await? {
            tracing::info!("Book restored: id={}", id);
            return Ok(restored.detail(current_year()));
        }

        // Nothing restored: either no such book or it is still active
        match self.store.find_any_by_id(id).await? {
            Some(_) => Err(AppError::BadRequest(format!("Book with ID {} is not deleted.", id))),
            None => Err(not_found(id)),
        }
    }

    /// All soft-deleted books with derived fields
    pub async fn list_deleted(&self) -> AppResult<Vec<BookDetail>> {
        let year = current_year();
        let books = self.store.list_deleted().await?;
        Ok(books.iter().map(|book| book.detail(year)).collect())
    }

    /// Insert the demo catalog if the table holds no record at all.
    /// Returns the number of inserted books.
    pub async fn seed_defaults(&self) -> AppResult<usize> {
        if self.store.count_all().await? > 0 {
            return Ok(0);
        }

        let created = self.store.insert_batch(&default_catalog()).await?;
        tracing::info!("Seeded {} books", created.len());
        Ok(created.len())
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

fn default_catalog() -> Vec<NewBook> {
    [
        ("The Great Gatsby", 1925, "F. Scott Fitzgerald", 150),
        ("To Kill a Mockingbird", 1960, "Harper Lee", 200),
        ("1984", 1949, "George Orwell", 180),
        ("Pride and Prejudice", 1813, "Jane Austen", 120),
        ("The Catcher in the Rye", 1951, "J.D. Salinger", 90),
    ]
    .into_iter()
    .map(|(title, publication_year, author_name, views_count)| NewBook {
        title: title.to_string(),
        publication_year,
        author_name: author_name.to_string(),
        views_count,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockBookStore;

    fn book(id: i32, title: &str, year: i32, views: i32) -> Book {
        Book {
            id,
            title: title.to_string(),
            publication_year: year,
            author_name: "Author".to_string(),
            views_count: views,
            created_at: Utc::now(),
            is_deleted: false,
            deleted_at: None,
        }
    }

    fn create(title: &str) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            publication_year: 2001,
            author_name: "Author".to_string(),
        }
    }

    fn service(store: MockBookStore) -> BooksService {
        BooksService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_get_by_id_records_a_view() {
        let mut store = MockBookStore::new();
        store
            .expect_record_view()
            .times(1)
            .returning(|id| Ok(Some(book(id, "The Great Gatsby", 1925, 151))));

        let detail = service(store).get_by_id(7).await.unwrap();
        let years = i64::from(current_year()) - 1925;
        assert_eq!(detail.id, 7);
        assert_eq!(detail.views_count, 151);
        assert_eq!(detail.years_since_publication, years);
        assert_eq!(detail.popularity_score, 151.0 * 0.5 + years as f64 * 2.0);
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let mut store = MockBookStore::new();
        store.expect_record_view().returning(|_| Ok(None));

        let err = service(store).get_by_id(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_popular_rejects_bad_bounds_before_querying() {
        let svc = service(MockBookStore::new());
        for (number, size) in [(0, 10), (1, 0), (1, 101), (-3, 5)] {
            let err = svc.list_popular(number, size).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{} {}", number, size);
        }
    }

    #[tokio::test]
    async fn test_list_popular_page_window() {
        let mut store = MockBookStore::new();
        store.expect_count_active().returning(|| Ok(5));
        store
            .expect_list_popular()
            .withf(|_, offset, limit| *offset == 2 && *limit == 2)
            .times(1)
            .returning(|_, _, _| Ok(vec![book(3, "c", 1950, 10), book(4, "d", 1990, 10)]));

        let page = service(store).list_popular(2, 2).await.unwrap();
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(page.has_previous_page);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "c");
    }

    #[tokio::test]
    async fn test_create_conflict_checks_deleted_titles_too() {
        let mut store = MockBookStore::new();
        store
            .expect_exists_by_title()
            .times(1)
            .returning(|_, include_deleted| Ok(include_deleted));
        store.expect_insert().never();

        let err = service(store).create(create("1984")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_starts_with_zero_views() {
        let mut store = MockBookStore::new();
        store.expect_exists_by_title().returning(|_, _| Ok(false));
        store
            .expect_insert()
            .withf(|new| new.views_count == 0 && new.title == "Dune")
            .times(1)
            .returning(|new| Ok(book(1, &new.title, new.publication_year, new.views_count)));

        let created = service(store).create(create("Dune")).await.unwrap();
        assert_eq!(created.id, 1);
        assert!(created.is_active());
    }

    #[tokio::test]
    async fn test_create_validates_lengths() {
        let err = service(MockBookStore::new())
            .create(create(&"x".repeat(201)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_bulk_duplicates_in_request() {
        let mut store = MockBookStore::new();
        store.expect_insert_batch().never();

        let err = service(store)
            .create_bulk(vec![create("Dune"), create("Emma"), create("Dune")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_bulk_conflict_names_every_existing_title() {
        let mut store = MockBookStore::new();
        store
            .expect_existing_titles()
            .returning(|_| Ok(vec!["1984".to_string(), "Emma".to_string()]));
        store.expect_insert_batch().never();

        let err = service(store)
            .create_bulk(vec![create("1984"), create("Dune"), create("Emma")])
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => {
                assert!(msg.contains("1984"));
                assert!(msg.contains("Emma"));
                assert!(!msg.contains("Dune"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bulk_inserts_in_one_batch() {
        let mut store = MockBookStore::new();
        store.expect_existing_titles().returning(|_| Ok(Vec::new()));
        store
            .expect_insert_batch()
            .times(1)
            .returning(|rows| {
                Ok(rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| book(i as i32 + 1, &r.title, r.publication_year, 0))
                    .collect())
            });

        let created = service(store)
            .create_bulk(vec![create("Dune"), create("Emma")])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_rejects_empty_request() {
        let err = service(MockBookStore::new()).create_bulk(Vec::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    // Renaming is not checked against other titles, unlike create and bulk create
    #[tokio::test]
    async fn test_update_skips_title_uniqueness_check() {
        let mut store = MockBookStore::new();
        store.expect_exists_by_title().never();
        store.expect_existing_titles().never();
        store
            .expect_update_active()
            .times(1)
            .returning(|id, data| {
                let mut updated = book(id, "Old", 1900, 12);
                updated.apply_update(data.clone());
                Ok(Some(updated))
            });

        let updated = service(store)
            .update(
                3,
                UpdateBook {
                    title: "New".to_string(),
                    publication_year: 1901,
                    author_name: "Someone".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.publication_year, 1901);
        assert_eq!(updated.views_count, 12);
    }

    #[tokio::test]
    async fn test_update_of_deleted_book_is_not_found() {
        let mut store = MockBookStore::new();
        store.expect_update_active().times(1).returning(|_, _| Ok(None));

        let err = service(store)
            .update(
                3,
                UpdateBook {
                    title: "New".to_string(),
                    publication_year: 1901,
                    author_name: "Someone".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_sets_flag_and_timestamp() {
        let mut store = MockBookStore::new();
        let before = Utc::now();
        store
            .expect_soft_delete()
            .withf(move |id, at| *id == 5 && *at >= before)
            .times(1)
            .returning(|id, at| {
                let mut deleted = book(id, "Emma", 1815, 0);
                deleted.mark_deleted(at);
                Ok(Some(deleted))
            });

        service(store).soft_delete(5).await.unwrap();
    }

    #[tokio::test]
    async fn test_soft_delete_missing_or_already_deleted() {
        let mut store = MockBookStore::new();
        store.expect_soft_delete().times(1).returning(|_, _| Ok(None));

        let err = service(store).soft_delete(5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_restore_rules() {
        let mut store = MockBookStore::new();
        store.expect_restore().returning(|id| match id {
            2 => Ok(Some(book(2, "Deleted", 2000, 3))),
            _ => Ok(None),
        });
        store.expect_find_any_by_id().returning(|id| match id {
            1 => Ok(Some(book(1, "Active", 2000, 3))),
            _ => Ok(None),
        });
        store.expect_record_view().never();

        let svc = service(store);
        assert!(matches!(svc.restore(1).await, Err(AppError::BadRequest(_))));
        assert!(matches!(svc.restore(9).await, Err(AppError::NotFound(_))));

        let restored = svc.restore(2).await.unwrap();
        assert_eq!(restored.views_count, 3);
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let mut store = MockBookStore::new();
        store
            .expect_list_deleted()
            .returning(|| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let err = service(store).list_deleted().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_seed_only_into_empty_table() {
        let mut store = MockBookStore::new();
        store.expect_count_all().times(1).returning(|| Ok(3));
        store.expect_insert_batch().never();
        assert_eq!(service(store).seed_defaults().await.unwrap(), 0);

        let mut store = MockBookStore::new();
        store.expect_count_all().returning(|| Ok(0));
        store
            .expect_insert_batch()
            .withf(|rows| rows.len() == 5 && rows[0].views_count == 150)
            .returning(|rows| {
                Ok(rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| book(i as i32 + 1, &r.title, r.publication_year, r.views_count))
                    .collect())
            });
        assert_eq!(service(store).seed_defaults().await.unwrap(), 5);
    }
}
