use reqwest::Client;
use url::Url;

use super::error::ApiError;
use crate::traits::{SuggestionItem, SuggestionSource};

/// Client for the site's `GET /autocomplete?q=` endpoint.
pub struct AutocompleteClient {
    endpoint: Url,
    http: Client,
}

impl AutocompleteClient {
    /// Build a client for `path` resolved against `origin`
    /// (e.g. `https://example.org` + `/autocomplete`).
    pub fn new(origin: &str, path: &str) -> Result<Self, ApiError> {
        let endpoint = Url::parse(origin)?.join(path)?;
        Ok(Self {
            endpoint,
            http: Client::new(),
        })
    }

    /// Build the request URL for `query`, URL-encoding it as `q`.
    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().clear().append_pair("q", query);
        url
    }

    async fn fetch(&self, query: &str) -> Result<Vec<SuggestionItem>, ApiError> {
        let url = self.request_url(query);
        tracing::debug!(query, "autocomplete request");

        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(query, status = status_code, "autocomplete error");
            return Err(ApiError::Status {
                status: status_code,
                message: body,
            });
        }

        let body = resp.text().await?;
        let items = parse_suggestions(&body)?;
        tracing::debug!(query, count = items.len(), "autocomplete response received");
        Ok(items)
    }
}

impl SuggestionSource for AutocompleteClient {
    type Error = ApiError;

    async fn suggest(&self, query: &str) -> Result<Vec<SuggestionItem>, ApiError> {
        self.fetch(query).await
    }
}

/// Decode an endpoint body: a JSON array of objects with a `title` string.
pub fn parse_suggestions(body: &str) -> Result<Vec<SuggestionItem>, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}
