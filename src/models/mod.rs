//! Data models for catalog search

pub mod query;
pub mod search;

// Re-export commonly used types
pub use query::Query;
pub use search::{AuthorHit, BookHit, CategoryHit, SearchResponse};
