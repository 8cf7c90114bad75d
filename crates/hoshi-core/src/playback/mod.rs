//! Custom controls for the episode player.

pub mod controller;
pub mod format;
pub mod media;
pub mod timer;

pub use controller::{map_key, Action, Direction, Message, PlaybackController, PlaybackState};
pub use media::{MediaElement, PlayerSurface};
pub use timer::{HideTimer, TimerBackend};
