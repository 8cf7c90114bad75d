/// The native media element. All state is read live; nothing is cached.
pub trait MediaElement {
    fn paused(&self) -> bool;

    /// Start playback. The element may refuse asynchronously (autoplay
    /// policy); implementations report that themselves.
    fn play(&self);

    fn pause(&self);

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    /// Media length in seconds; `NaN` until metadata is loaded, `+inf` for
    /// live streams.
    fn duration(&self) -> f64;

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);
}

/// The player chrome around the media element.
pub trait PlayerSurface {
    /// Show the pause icon while playing, the play icon while paused.
    fn render_transport(&self, playing: bool);

    fn render_controls(&self, visible: bool);

    /// Move the seek range to `percent` (0-100).
    fn render_seek(&self, percent: f64);

    fn render_timestamp(&self, text: &str);

    fn render_speed_menu(&self, open: bool);

    /// Mark the option offering `rate` active and every other option inactive.
    fn render_active_speed(&self, rate: f64);

    /// Whether the player container is the document's fullscreen element.
    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&self);

    fn exit_fullscreen(&self);
}
