//! Trait definitions for suggestion providers.
//!
//! The search page only needs titles; anything that can turn a query prefix
//! into a list of [`SuggestionItem`]s can back the autocomplete widget.

use std::future::Future;

/// A candidate title for the current query prefix.
///
/// The endpoint may return extra fields (episode counts, ids); they are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SuggestionItem {
    pub title: String,
}

impl SuggestionItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// A source of autocomplete suggestions.
///
/// Futures are not required to be `Send`: in the browser every request runs
/// on the single page thread.
pub trait SuggestionSource {
    type Error: std::error::Error + 'static;

    /// Fetch suggestions for a (non-empty) query.
    fn suggest(&self, query: &str)
        -> impl Future<Output = Result<Vec<SuggestionItem>, Self::Error>>;
}
