//! Book endpoints

use axum::{extract::State, http::StatusCode, Json};

use super::extract::{AppJson, AppPath, AppQuery};
use crate::{
    error::{AppResult, ErrorResponse},
    models::{
        book::{Book, BookDetail, BookTitle, CreateBook, CreateBooks, UpdateBook},
        pagination::{PageQuery, PaginatedResponse},
    },
};

/// Get book details by ID (counts as a view)
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// List books by popularity score
#[utoipa::path(
    get,
    path = "/books/popular",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "Popular books", body = PaginatedResponse<BookTitle>),
        (status = 400, description = "Invalid page bounds", body = ErrorResponse)
    )
)]
pub async fn list_popular(
    State(state): State<crate::AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookTitle>>> {
    let page = state
        .services
        .books
        .list_popular(query.page_number(), query.page_size())
        .await?;
    Ok(Json(page))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Title already exists", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AppJson(data): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Create several books in one atomic batch
#[utoipa::path(
    post,
    path = "/books/bulk",
    tag = "books",
    request_body = CreateBooks,
    responses(
        (status = 201, description = "Books created", body = Vec<Book>),
        (status = 400, description = "Invalid input or duplicate titles in request", body = ErrorResponse),
        (status = 409, description = "Some titles already exist", body = ErrorResponse)
    )
)]
pub async fn create_books(
    State(state): State<crate::AppState>,
    AppJson(data): AppJson<CreateBooks>,
) -> AppResult<(StatusCode, Json<Vec<Book>>)> {
    let books = state.services.books.create_bulk(data.books).await?;
    Ok((StatusCode::CREATED, Json(books)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(data): AppJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.update(id, data).await?;
    Ok(Json(book))
}

/// Soft-delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<StatusCode> {
    state.services.books.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted book
#[utoipa::path(
    post,
    path = "/books/{id}/restore",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book restored", body = BookDetail),
        (status = 400, description = "Book is not deleted", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn restore_book(
    State(state): State<crate::AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.books.restore(id).await?;
    Ok(Json(book))
}

/// List soft-deleted books
#[utoipa::path(
    get,
    path = "/books/deleted",
    tag = "books",
    responses(
        (status = 200, description = "Deleted books", body = Vec<BookDetail>)
    )
)]
pub async fn list_deleted(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<BookDetail>>> {
    let books = state.services.books.list_deleted().await?;
    Ok(Json(books))
}
