pub mod autocomplete;
pub mod traits;

pub use autocomplete::{ApiError, AutocompleteClient};
pub use traits::{SuggestionItem, SuggestionSource};
