//! Key pattern matching for the in-memory store.
//!
//! Mirrors the glob subset the networked store's SCAN MATCH understands:
//! `*`, `?` and `[...]` classes.

use glob::Pattern;

/// Compiled key pattern.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    Glob(Pattern),
    /// Patterns glob rejects (such as a stray `**`) fall back to exact match.
    Literal(String),
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Self {
        match Pattern::new(pattern) {
            Ok(glob) => KeyPattern::Glob(glob),
            Err(_) => KeyPattern::Literal(pattern.to_string()),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Glob(glob) => glob.matches(key),
            KeyPattern::Literal(literal) => literal == key,
        }
    }
}
