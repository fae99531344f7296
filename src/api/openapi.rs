//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Management API",
        version = "1.0.0",
        description = "An API for managing books with popularity tracking"
    ),
    servers(
        (url = "/api", description = "Book Management API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::get_book,
        books::list_popular,
        books::create_book,
        books::create_books,
        books::update_book,
        books::delete_book,
        books::restore_book,
        books::list_deleted,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookDetail,
            crate::models::book::BookTitle,
            crate::models::book::CreateBook,
            crate::models::book::CreateBooks,
            crate::models::book::UpdateBook,
            crate::models::pagination::PageQuery,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
