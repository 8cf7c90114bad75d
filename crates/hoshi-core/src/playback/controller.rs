use crate::config::PlayerConfig;

use super::format::{clamp_seek, format_timestamp, known_duration, progress_percent};
use super::media::{MediaElement, PlayerSurface};
use super::timer::{HideTimer, TimerBackend};

/// Direction of a relative seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Self::Back => -1.0,
            Self::Forward => 1.0,
        }
    }
}

/// Input to the playback controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The player finished loading; render the initial state.
    Loaded,
    /// The play/pause button.
    TogglePlay,
    /// A click on the video surface itself.
    SurfaceClicked,
    /// The element reached the end of the media.
    Ended,
    /// The element started or paused on its own (`play`/`pause` events).
    PlaybackChanged,
    /// The element's `timeupdate` signal.
    TimeUpdate,
    /// The seek range was dragged to this percentage (0-100).
    SeekInput(f64),
    /// Skip buttons.
    Skip(Direction),
    /// Arrow keys.
    KeySkip(Direction),
    /// The speed button.
    SpeedButton,
    /// A speed option declaring this rate.
    SpeedSelected(f64),
    /// A click anywhere outside the speed menu.
    OutsideClick,
    /// Pointer or touch activity inside the player.
    Activity,
    /// The hide timeout ran out.
    HideTimerFired,
    ToggleFullscreen,
}

/// What the DOM layer should do with the triggering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Stop the event so document-level handlers never see it.
    StopPropagation,
}

/// Map a `KeyboardEvent.key` value to a message.
pub fn map_key(key: &str) -> Option<Message> {
    match key {
        "ArrowLeft" => Some(Message::KeySkip(Direction::Back)),
        "ArrowRight" => Some(Message::KeySkip(Direction::Forward)),
        _ => None,
    }
}

/// Live snapshot of the player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub playback_rate: f64,
    pub controls_visible: bool,
}

/// Owns all interaction with one media element.
///
/// Playing/paused and the clock are always read from the element. The only
/// state kept here is overlay visibility, whether the speed menu is open,
/// and which offered rate is active.
pub struct PlaybackController<M, P, B: TimerBackend> {
    media: M,
    surface: P,
    timer: HideTimer<B>,
    config: PlayerConfig,
    controls_visible: bool,
    menu_open: bool,
    active_rate: f64,
}

impl<M, P, B> PlaybackController<M, P, B>
where
    M: MediaElement,
    P: PlayerSurface,
    B: TimerBackend,
{
    /// `config.speeds` are the rates the speed menu offers.
    pub fn new(media: M, surface: P, timer: B, config: PlayerConfig) -> Self {
        Self {
            media,
            surface,
            timer: HideTimer::new(timer),
            active_rate: config.default_speed,
            config,
            controls_visible: false,
            menu_open: false,
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    pub fn timer(&self) -> &HideTimer<B> {
        &self.timer
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn active_rate(&self) -> f64 {
        self.active_rate
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: !self.media.paused(),
            current_time: self.media.current_time(),
            duration: self.media.duration(),
            playback_rate: self.media.playback_rate(),
            controls_visible: self.controls_visible,
        }
    }

    pub fn update(&mut self, msg: Message) -> Action {
        match msg {
            Message::Loaded => {
                self.media.set_playback_rate(self.active_rate);
                self.surface.render_active_speed(self.active_rate);
                self.surface.render_speed_menu(false);
                self.render_transport();
                self.render_clock();
                self.show_controls();
                Action::None
            }
            Message::TogglePlay => {
                self.toggle_play();
                Action::None
            }
            Message::SurfaceClicked => {
                if self.controls_visible {
                    self.toggle_play();
                }
                self.show_controls();
                Action::None
            }
            Message::Ended | Message::PlaybackChanged => {
                self.render_transport();
                Action::None
            }
            Message::TimeUpdate => {
                self.render_clock();
                Action::None
            }
            Message::SeekInput(percent) => {
                if let Some(duration) = known_duration(self.media.duration()) {
                    let target = clamp_seek(percent / 100.0 * duration, duration);
                    self.media.set_current_time(target);
                    self.surface.render_timestamp(&format_timestamp(target));
                }
                Action::None
            }
            Message::Skip(direction) => {
                self.seek_by(direction.sign() * self.config.button_skip_secs);
                self.show_controls();
                Action::None
            }
            Message::KeySkip(direction) => {
                self.seek_by(direction.sign() * self.config.key_skip_secs);
                self.show_controls();
                Action::None
            }
            Message::SpeedButton => {
                self.set_menu(!self.menu_open);
                Action::StopPropagation
            }
            Message::SpeedSelected(rate) => {
                if !self.config.speeds.contains(&rate) {
                    tracing::debug!(rate, "speed not offered, ignored");
                    return Action::None;
                }
                self.media.set_playback_rate(rate);
                self.active_rate = rate;
                self.surface.render_active_speed(rate);
                self.set_menu(false);
                tracing::debug!(rate, "playback rate changed");
                Action::StopPropagation
            }
            Message::OutsideClick => {
                if self.menu_open {
                    self.set_menu(false);
                }
                Action::None
            }
            Message::Activity => {
                self.show_controls();
                Action::None
            }
            Message::HideTimerFired => {
                self.timer.fired();
                self.controls_visible = false;
                self.surface.render_controls(false);
                Action::None
            }
            Message::ToggleFullscreen => {
                if self.surface.is_fullscreen() {
                    self.surface.exit_fullscreen();
                } else {
                    self.surface.request_fullscreen();
                }
                Action::None
            }
        }
    }

    fn toggle_play(&self) {
        if self.media.paused() {
            self.media.play();
        } else {
            self.media.pause();
        }
        self.render_transport();
    }

    fn seek_by(&self, delta: f64) {
        let target = clamp_seek(self.media.current_time() + delta, self.media.duration());
        self.media.set_current_time(target);
        self.render_clock();
    }

    fn show_controls(&mut self) {
        if !self.controls_visible {
            self.controls_visible = true;
            self.surface.render_controls(true);
        }
        self.timer.restart(self.config.hide_delay());
    }

    fn set_menu(&mut self, open: bool) {
        self.menu_open = open;
        self.surface.render_speed_menu(open);
    }

    fn render_transport(&self) {
        self.surface.render_transport(!self.media.paused());
    }

    fn render_clock(&self) {
        let current = self.media.current_time();
        if let Some(percent) = progress_percent(current, self.media.duration()) {
            self.surface.render_seek(percent);
        }
        self.surface.render_timestamp(&format_timestamp(current));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HoshiConfig;
    use crate::playback::timer::tests::FakeTimer;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    struct FakeMedia {
        paused: Cell<bool>,
        time: Cell<f64>,
        duration: Cell<f64>,
        rate: Cell<f64>,
    }

    impl FakeMedia {
        fn new(duration: f64) -> Self {
            Self {
                paused: Cell::new(true),
                time: Cell::new(0.0),
                duration: Cell::new(duration),
                rate: Cell::new(1.0),
            }
        }
    }

    impl MediaElement for FakeMedia {
        fn paused(&self) -> bool {
            self.paused.get()
        }
        fn play(&self) {
            self.paused.set(false);
        }
        fn pause(&self) {
            self.paused.set(true);
        }
        fn current_time(&self) -> f64 {
            self.time.get()
        }
        fn set_current_time(&self, seconds: f64) {
            self.time.set(seconds);
        }
        fn duration(&self) -> f64 {
            self.duration.get()
        }
        fn playback_rate(&self) -> f64 {
            self.rate.get()
        }
        fn set_playback_rate(&self, rate: f64) {
            self.rate.set(rate);
        }
    }

    #[derive(Default)]
    struct FakeSurface {
        playing_icon: Cell<Option<bool>>,
        controls: RefCell<Vec<bool>>,
        seek: Cell<Option<f64>>,
        timestamp: RefCell<String>,
        menu: RefCell<Vec<bool>>,
        active: Cell<Option<f64>>,
        fullscreen: Cell<bool>,
        fullscreen_requests: Cell<u32>,
    }

    impl PlayerSurface for FakeSurface {
        fn render_transport(&self, playing: bool) {
            self.playing_icon.set(Some(playing));
        }
        fn render_controls(&self, visible: bool) {
            self.controls.borrow_mut().push(visible);
        }
        fn render_seek(&self, percent: f64) {
            self.seek.set(Some(percent));
        }
        fn render_timestamp(&self, text: &str) {
            *self.timestamp.borrow_mut() = text.to_string();
        }
        fn render_speed_menu(&self, open: bool) {
            self.menu.borrow_mut().push(open);
        }
        fn render_active_speed(&self, rate: f64) {
            self.active.set(Some(rate));
        }
        fn is_fullscreen(&self) -> bool {
            self.fullscreen.get()
        }
        fn request_fullscreen(&self) {
            self.fullscreen_requests.set(self.fullscreen_requests.get() + 1);
            self.fullscreen.set(true);
        }
        fn exit_fullscreen(&self) {
            self.fullscreen.set(false);
        }
    }

    type Controller = PlaybackController<FakeMedia, FakeSurface, FakeTimer>;

    fn with_config(duration: f64, config: PlayerConfig) -> Controller {
        let mut c = PlaybackController::new(
            FakeMedia::new(duration),
            FakeSurface::default(),
            FakeTimer::default(),
            config,
        );
        c.update(Message::Loaded);
        c
    }

    fn controller(duration: f64) -> Controller {
        with_config(duration, HoshiConfig::default().player)
    }

    #[test]
    fn test_loaded_renders_initial_state() {
        let c = controller(1440.0);
        assert_eq!(c.surface().playing_icon.get(), Some(false));
        assert_eq!(c.surface().active.get(), Some(1.0));
        assert_eq!(c.media().rate.get(), 1.0);
        assert_eq!(*c.surface().controls.borrow(), vec![true]);
        assert!(c.timer().is_pending());
        assert_eq!(
            c.timer().backend().last_delay.get(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(*c.surface().timestamp.borrow(), "00:00");
    }

    #[test]
    fn test_toggle_play_icons_follow_element() {
        let mut c = controller(1440.0);
        c.update(Message::TogglePlay);
        assert!(c.state().is_playing);
        assert_eq!(c.surface().playing_icon.get(), Some(true));
        c.update(Message::TogglePlay);
        assert!(!c.state().is_playing);
        assert_eq!(c.surface().playing_icon.get(), Some(false));
    }

    #[test]
    fn test_ended_shows_play_icon() {
        let mut c = controller(1440.0);
        c.update(Message::TogglePlay);
        c.media().paused.set(true);
        c.update(Message::Ended);
        assert_eq!(c.surface().playing_icon.get(), Some(false));
    }

    #[test]
    fn test_external_play_updates_icon() {
        let mut c = controller(1440.0);
        c.media().paused.set(false);
        c.update(Message::PlaybackChanged);
        assert_eq!(c.surface().playing_icon.get(), Some(true));
    }

    #[test]
    fn test_surface_click_only_toggles_when_visible() {
        let mut c = controller(1440.0);
        c.update(Message::HideTimerFired);
        assert!(!c.state().controls_visible);

        c.update(Message::SurfaceClicked);
        assert!(!c.state().is_playing);
        assert!(c.state().controls_visible);

        c.update(Message::SurfaceClicked);
        assert!(c.state().is_playing);
    }

    #[test]
    fn test_time_update_mirrors_progress() {
        let mut c = controller(200.0);
        c.media().time.set(125.0);
        c.update(Message::TimeUpdate);
        assert_eq!(c.surface().seek.get(), Some(62.5));
        assert_eq!(*c.surface().timestamp.borrow(), "02:05");
    }

    #[test]
    fn test_time_update_with_unknown_duration() {
        let mut c = controller(f64::NAN);
        c.media().time.set(3.0);
        c.update(Message::TimeUpdate);
        assert_eq!(c.surface().seek.get(), None);
        assert_eq!(*c.surface().timestamp.borrow(), "00:03");
    }

    #[test]
    fn test_seek_input_writes_time() {
        let mut c = controller(1000.0);
        c.update(Message::SeekInput(25.0));
        assert_eq!(c.media().time.get(), 250.0);
        assert_eq!(*c.surface().timestamp.borrow(), "04:10");

        let mut unknown = controller(f64::NAN);
        unknown.media().time.set(7.0);
        unknown.update(Message::SeekInput(50.0));
        assert_eq!(unknown.media().time.get(), 7.0);
    }

    #[test]
    fn test_skip_back_clamps_to_zero() {
        let mut c = controller(1440.0);
        c.media().time.set(5.0);
        c.update(Message::Skip(Direction::Back));
        assert_eq!(c.media().time.get(), 0.0);
    }

    #[test]
    fn test_skip_forward_clamps_to_duration() {
        let mut c = controller(1440.0);
        c.media().time.set(1400.0);
        c.update(Message::Skip(Direction::Forward));
        assert_eq!(c.media().time.get(), 1440.0);

        c.media().time.set(100.0);
        c.update(Message::Skip(Direction::Forward));
        assert_eq!(c.media().time.get(), 188.0);
    }

    #[test]
    fn test_arrow_keys_seek_ten_seconds() {
        let mut c = controller(1440.0);
        c.media().time.set(100.0);
        c.update(map_key("ArrowRight").unwrap());
        assert_eq!(c.media().time.get(), 110.0);
        c.update(map_key("ArrowLeft").unwrap());
        c.update(map_key("ArrowLeft").unwrap());
        assert_eq!(c.media().time.get(), 90.0);
        c.media().time.set(4.0);
        c.update(map_key("ArrowLeft").unwrap());
        assert_eq!(c.media().time.get(), 0.0);
        assert_eq!(map_key(" "), None);
    }

    #[test]
    fn test_speed_menu_select() {
        let mut c = controller(1440.0);
        assert_eq!(c.update(Message::SpeedButton), Action::StopPropagation);
        assert!(c.is_menu_open());

        c.update(Message::SpeedSelected(2.0));
        assert_eq!(c.media().rate.get(), 2.0);
        assert_eq!(c.active_rate(), 2.0);
        assert_eq!(c.surface().active.get(), Some(2.0));
        assert!(!c.is_menu_open());
        assert_eq!(c.state().playback_rate, 2.0);
    }

    #[test]
    fn test_unknown_speed_ignored() {
        let mut c = controller(1440.0);
        c.update(Message::SpeedSelected(3.0));
        assert_eq!(c.media().rate.get(), 1.0);
        assert_eq!(c.active_rate(), 1.0);
    }

    #[test]
    fn test_rates_come_from_offered_options() {
        // The menu offers fewer rates than the built-in list, in another order.
        let config = HoshiConfig::default()
            .player
            .with_offered_speeds(vec![2.0, 1.0]);
        let mut c = with_config(1440.0, config);
        assert_eq!(c.surface().active.get(), Some(1.0));

        c.update(Message::SpeedButton);
        c.update(Message::SpeedSelected(1.0));
        assert_eq!(c.media().rate.get(), 1.0);
        c.update(Message::SpeedSelected(2.0));
        assert_eq!(c.media().rate.get(), 2.0);
        assert_eq!(c.surface().active.get(), Some(2.0));

        // Offered by default, but not by this menu.
        c.update(Message::SpeedSelected(0.5));
        assert_eq!(c.media().rate.get(), 2.0);
    }

    #[test]
    fn test_outside_click_closes_menu_once() {
        let mut c = controller(1440.0);
        c.surface().menu.borrow_mut().clear();
        c.update(Message::SpeedButton);
        c.update(Message::OutsideClick);
        c.update(Message::OutsideClick);
        assert_eq!(*c.surface().menu.borrow(), vec![true, false]);
        assert!(!c.is_menu_open());
    }

    #[test]
    fn test_speed_button_toggles_menu() {
        let mut c = controller(1440.0);
        c.update(Message::SpeedButton);
        c.update(Message::SpeedButton);
        assert!(!c.is_menu_open());
    }

    #[test]
    fn test_activity_rearms_single_timer() {
        let mut c = controller(1440.0);
        for _ in 0..10 {
            c.update(Message::Activity);
        }
        assert_eq!(c.timer().backend().live.borrow().len(), 1);
        assert_eq!(c.timer().backend().started.get(), 11);
        // Already visible: not re-rendered on each event.
        assert_eq!(*c.surface().controls.borrow(), vec![true]);

        c.update(Message::HideTimerFired);
        assert!(!c.timer().is_pending());
        assert!(!c.state().controls_visible);
        c.update(Message::Activity);
        assert_eq!(*c.surface().controls.borrow(), vec![true, false, true]);
    }

    #[test]
    fn test_fullscreen_follows_live_state() {
        let mut c = controller(1440.0);
        c.update(Message::ToggleFullscreen);
        assert!(c.surface().is_fullscreen());

        // The user left fullscreen with Escape, outside the controls.
        c.surface().fullscreen.set(false);
        c.update(Message::ToggleFullscreen);
        assert!(c.surface().is_fullscreen());
        assert_eq!(c.surface().fullscreen_requests.get(), 2);

        c.update(Message::ToggleFullscreen);
        assert!(!c.surface().is_fullscreen());
    }
}
