pub mod client;
pub mod error;

pub use client::AutocompleteClient;
pub use error::ApiError;
