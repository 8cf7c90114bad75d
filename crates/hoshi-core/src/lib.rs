pub mod config;
pub mod diagnostics;
pub mod error;
pub mod navigation;
pub mod playback;
pub mod storage;
pub mod suggest;
pub mod watchlist;
