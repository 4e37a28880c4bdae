//! Search endpoint response model

use serde::{Deserialize, Serialize};

/// Body of `GET /api/search?q=...`
///
/// Every list is optional; the endpoint omits or empties them freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books: Option<Vec<BookHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<AuthorHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryHit>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookHit {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub available_copies: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorHit {
    pub name: String,
    pub book_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryHit {
    pub id: i64,
    pub name: String,
    pub book_count: i64,
}

impl SearchResponse {
    pub fn books(&self) -> &[BookHit] {
        self.books.as_deref().unwrap_or_default()
    }

    pub fn authors(&self) -> &[AuthorHit] {
        self.authors.as_deref().unwrap_or_default()
    }

    pub fn categories(&self) -> &[CategoryHit] {
        self.categories.as_deref().unwrap_or_default()
    }

    /// True when no list carries a single entry
    pub fn is_empty(&self) -> bool {
        self.books().is_empty() && self.authors().is_empty() && self.categories().is_empty()
    }
}

impl BookHit {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}
