//! Search query typed into the input

use std::fmt;

/// A trimmed input value long enough to be searched
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Trim `raw` and keep it only if it has at least `min_chars` characters.
    ///
    /// A short query is not an error: the controller simply goes idle.
    pub fn qualify(raw: &str, min_chars: usize) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < min_chars {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
