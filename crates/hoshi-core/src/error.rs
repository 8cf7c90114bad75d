use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum HoshiError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("config error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(#[from] hoshi_api::ApiError),

    #[error("missing element: {0}")]
    MissingElement(&'static str),

    #[error("DOM error: {0}")]
    Dom(String),
}
