//! Search services used by the autocomplete controller

pub mod cache;
pub mod search;

pub use cache::ResponseCache;
pub use search::{HttpSearchBackend, SearchBackend};
