//! Data models for the book management server

pub mod book;
pub mod pagination;

// Re-export commonly used types
pub use book::{Book, BookDetail, BookTitle, CreateBook, CreateBooks, NewBook, UpdateBook};
pub use pagination::{PageQuery, PageRequest, PaginatedResponse};
