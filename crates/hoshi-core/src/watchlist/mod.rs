pub mod store;
pub mod sync;

pub use store::Watchlist;
pub use sync::{render_plan, ToggleRender, WatchlistDom, WatchlistSync};
