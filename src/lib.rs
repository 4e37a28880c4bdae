//! Catalog Search
//!
//! Client-side search suggestions for the library catalog: a debounced,
//! cancellable autocomplete controller with a per-session response cache,
//! categorized HTML rendering and keyboard navigation.

pub mod autocomplete;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use autocomplete::{Autocomplete, AutocompleteHandle};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
