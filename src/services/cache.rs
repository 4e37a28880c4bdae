//! Exact-query response cache

use std::collections::HashMap;

use crate::{config::CachePolicy, models::SearchResponse};

/// Successful responses keyed by the exact query string.
///
/// Entries never expire on their own; only [`ResponseCache::clear`] drops them.
#[derive(Debug, Default)]
pub struct ResponseCache {
    policy: CachePolicy,
    entries: HashMap<String, SearchResponse>,
}

impl ResponseCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, query: &str) -> Option<&SearchResponse> {
        self.entries.get(query)
    }

    /// Store a response, unless the policy disables caching
    pub fn insert(&mut self, query: &str, response: SearchResponse) {
        match self.policy {
            CachePolicy::Session => {
                self.entries.insert(query.to_string(), response);
            }
            CachePolicy::Disabled => {}
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
