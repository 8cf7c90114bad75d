//! Search-field autocomplete.
//!
//! Every keystroke advances a request token. A response is rendered only if
//! it carries the latest token, so a slow reply to an old prefix can never
//! overwrite the list for the current one.

use std::cell::RefCell;
use std::fmt::Display;

use hoshi_api::{SuggestionItem, SuggestionSource};

use crate::diagnostics::{record, DiagnosticEvent, SharedEventLog};

/// The search field and its suggestion list.
pub trait SuggestionView {
    /// Empty the suggestion list.
    fn clear(&mut self);

    /// Replace the suggestion list with one clickable row per item.
    fn render(&mut self, items: &[SuggestionItem]);

    /// Write `text` into the search field.
    fn set_query(&mut self, text: &str);
}

/// Monotonic request sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// An outbound request the caller should issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub token: RequestToken,
    pub query: String,
}

/// What happened to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Rendered with this many rows.
    Applied(usize),
    /// A newer request was issued since; discarded.
    Stale,
    /// The request failed; the list was left as it was.
    Failed,
}

pub struct SuggestionFetcher<V> {
    view: V,
    latest: u64,
    items: Vec<SuggestionItem>,
    log: SharedEventLog,
}

impl<V: SuggestionView> SuggestionFetcher<V> {
    pub fn new(view: V, log: SharedEventLog) -> Self {
        Self {
            view,
            latest: 0,
            items: Vec::new(),
            log,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Currently rendered suggestions.
    pub fn items(&self) -> &[SuggestionItem] {
        &self.items
    }

    /// The search field changed.
    ///
    /// Clears the list and returns `None` for a blank query, otherwise returns
    /// the request to issue.
    pub fn on_input(&mut self, raw: &str) -> Option<SuggestionRequest> {
        self.latest += 1;
        let query = raw.trim();
        if query.is_empty() {
            self.clear();
            return None;
        }
        Some(SuggestionRequest {
            token: RequestToken(self.latest),
            query: query.to_string(),
        })
    }

    /// A response arrived for `request`.
    pub fn on_response<E: Display>(
        &mut self,
        request: &SuggestionRequest,
        result: Result<Vec<SuggestionItem>, E>,
    ) -> ResponseOutcome {
        let items = match result {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(query = %request.query, error = %e, "suggestion request failed");
                record(
                    &self.log,
                    DiagnosticEvent::SuggestFailed {
                        query: request.query.clone(),
                        message: e.to_string(),
                    },
                );
                return ResponseOutcome::Failed;
            }
        };

        if request.token.0 != self.latest {
            tracing::debug!(
                query = %request.query,
                token = request.token.0,
                latest = self.latest,
                "discarding stale suggestions"
            );
            record(
                &self.log,
                DiagnosticEvent::StaleSuggestion {
                    query: request.query.clone(),
                    token: request.token.0,
                    latest: self.latest,
                },
            );
            return ResponseOutcome::Stale;
        }

        self.view.render(&items);
        self.items = items;
        ResponseOutcome::Applied(self.items.len())
    }

    /// The row at `index` was clicked: copy its title into the search field
    /// and close the list.
    pub fn select(&mut self, index: usize) -> Option<String> {
        let title = self.items.get(index)?.title.clone();
        self.view.set_query(&title);
        // Nothing in flight may reopen the list.
        self.latest += 1;
        self.clear();
        Some(title)
    }

    fn clear(&mut self) {
        self.items.clear();
        self.view.clear();
    }
}

/// Await the response to `request` and apply it.
///
/// The caller issues `request` through [`SuggestionFetcher::on_input`]
/// synchronously, so a blank query clears the list before anything is
/// awaited. The fetcher is never borrowed across the await, so overlapping
/// completions are fine on a single thread.
pub async fn complete<V, S>(
    fetcher: &RefCell<SuggestionFetcher<V>>,
    source: &S,
    request: SuggestionRequest,
) -> ResponseOutcome
where
    V: SuggestionView,
    S: SuggestionSource,
{
    let result = source.suggest(&request.query).await;
    fetcher.borrow_mut().on_response(&request, result)
}
