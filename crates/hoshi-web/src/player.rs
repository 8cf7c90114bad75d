//! The episode player's custom controls.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use hoshi_core::config::PlayerConfig;
use hoshi_core::diagnostics::{record, DiagnosticEvent, SharedEventLog};
use hoshi_core::error::HoshiError;
use hoshi_core::playback::{
    map_key, Action, Direction, MediaElement, Message, PlaybackController, PlayerSurface,
    TimerBackend,
};
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement, HtmlVideoElement,
    KeyboardEvent, Node,
};

use crate::dom;

const VIDEO_ID: &str = "video";
const PLAYER_ID: &str = "player";
const CONTROLS_ID: &str = "controls";
const PLAY_PAUSE_ID: &str = "play-pause";
const PLAY_ICON_ID: &str = "play-icon";
const PAUSE_ICON_ID: &str = "pause-icon";
const SKIP_BACK_ID: &str = "skip-back";
const SKIP_FORWARD_ID: &str = "skip-forward";
const SEEK_ID: &str = "seek-bar";
const TIMESTAMP_ID: &str = "timestamp";
const SPEED_BUTTON_ID: &str = "speed-btn";
const SPEED_MENU_ID: &str = "speed-menu";
const SPEED_OPTION_SELECTOR: &str = "[data-speed]";
const SPEED_ATTR: &str = "data-speed";
const FULLSCREEN_ID: &str = "fullscreen-btn";

pub struct VideoMedia {
    video: HtmlVideoElement,
    log: SharedEventLog,
}

impl MediaElement for VideoMedia {
    fn paused(&self) -> bool {
        self.video.paused()
    }

    fn play(&self) {
        let promise = match self.video.play() {
            Ok(promise) => promise,
            Err(e) => {
                tracing::warn!(error = %dom::js_message(&e), "play() threw");
                return;
            }
        };
        let log = self.log.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                let message = dom::js_message(&e);
                tracing::warn!(error = %message, "playback rejected");
                record(&log, DiagnosticEvent::PlaybackRejected { message });
            }
        });
    }

    fn pause(&self) {
        if let Err(e) = self.video.pause() {
            tracing::warn!(error = %dom::js_message(&e), "pause() threw");
        }
    }

    fn current_time(&self) -> f64 {
        self.video.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.video.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.video.duration()
    }

    fn playback_rate(&self) -> f64 {
        self.video.playback_rate()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.video.set_playback_rate(rate);
    }
}

pub struct DomSurface {
    document: Document,
    player: Element,
    controls: HtmlElement,
    play_icon: Element,
    pause_icon: Element,
    seek: HtmlInputElement,
    timestamp: Element,
    speed_menu: Element,
    speed_options: Vec<(Element, Option<f64>)>,
}

impl DomSurface {
    fn find(document: &Document) -> Result<Self, HoshiError> {
        let speed_menu: Element = dom::by_id(document, SPEED_MENU_ID)?;
        let speed_options = speed_options(&speed_menu);
        Ok(Self {
            document: document.clone(),
            player: dom::by_id(document, PLAYER_ID)?,
            controls: dom::by_id(document, CONTROLS_ID)?,
            play_icon: dom::by_id(document, PLAY_ICON_ID)?,
            pause_icon: dom::by_id(document, PAUSE_ICON_ID)?,
            seek: dom::by_id(document, SEEK_ID)?,
            timestamp: dom::by_id(document, TIMESTAMP_ID)?,
            speed_menu,
            speed_options,
        })
    }

    /// Rates declared by the menu's options, in document order.
    fn offered_rates(&self) -> Vec<f64> {
        self.speed_options.iter().filter_map(|(_, rate)| *rate).collect()
    }
}

/// Every speed option in `menu` with the rate its `data-speed` declares.
fn speed_options(menu: &Element) -> Vec<(Element, Option<f64>)> {
    dom::query_all_within(menu, SPEED_OPTION_SELECTOR)
        .into_iter()
        .map(|option| {
            let rate = option
                .get_attribute(SPEED_ATTR)
                .and_then(|v| v.trim().parse::<f64>().ok());
            if rate.is_none() {
                tracing::debug!("speed option without a numeric data-speed");
            }
            (option, rate)
        })
        .collect()
}

fn set_hidden(el: &Element, hidden: bool) {
    let _ = el.toggle_attribute_with_force("hidden", hidden);
}

fn set_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

impl PlayerSurface for DomSurface {
    fn render_transport(&self, playing: bool) {
        set_hidden(&self.play_icon, playing);
        set_hidden(&self.pause_icon, !playing);
    }

    fn render_controls(&self, visible: bool) {
        let opacity = if visible { "1" } else { "0" };
        let _ = self.controls.style().set_property("opacity", opacity);
    }

    fn render_seek(&self, percent: f64) {
        self.seek.set_value(&percent.to_string());
    }

    fn render_timestamp(&self, text: &str) {
        self.timestamp.set_text_content(Some(text));
    }

    fn render_speed_menu(&self, open: bool) {
        set_class(&self.speed_menu, "open", open);
    }

    fn render_active_speed(&self, rate: f64) {
        for (option, offered) in &self.speed_options {
            set_class(option, "active", *offered == Some(rate));
        }
    }

    fn is_fullscreen(&self) -> bool {
        self.document.fullscreen_element().is_some()
    }

    fn request_fullscreen(&self) {
        if let Err(e) = self.player.request_fullscreen() {
            tracing::warn!(error = %dom::js_message(&e), "fullscreen request failed");
        }
    }

    fn exit_fullscreen(&self) {
        self.document.exit_fullscreen();
    }
}

/// Hide timeouts on `gloo-timers`. Dropping a [`Timeout`] clears it.
pub struct WebTimer {
    on_fire: Rc<dyn Fn()>,
}

impl TimerBackend for WebTimer {
    type Handle = Timeout;

    fn start(&self, delay: Duration) -> Timeout {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let on_fire = self.on_fire.clone();
        Timeout::new(millis, move || on_fire())
    }

    fn cancel(&self, handle: Timeout) {
        drop(handle);
    }
}

type Controller = PlaybackController<VideoMedia, DomSurface, WebTimer>;
type Shared = Rc<RefCell<Controller>>;

/// Feed `msg` to the controller on behalf of `event`.
fn dispatch(controller: &Shared, event: Option<&Event>, msg: Message) {
    let Ok(mut controller) = controller.try_borrow_mut() else {
        tracing::debug!(?msg, "player busy, event dropped");
        return;
    };
    if controller.update(msg) == Action::StopPropagation {
        if let Some(event) = event {
            event.stop_propagation();
        }
    }
}

fn on(target: &EventTarget, name: &'static str, controller: &Shared, msg: Message) {
    let controller = controller.clone();
    dom::listen(target, name, move |event| {
        dispatch(&controller, Some(event), msg.clone())
    });
}

pub fn init(document: &Document, config: &PlayerConfig, log: &SharedEventLog) -> Result<(), HoshiError> {
    let Some(video) = dom::optional_by_id::<HtmlVideoElement>(document, VIDEO_ID) else {
        tracing::debug!("no video element on this page, player controls inactive");
        return Ok(());
    };
    let surface = DomSurface::find(document)?;
    // The markup decides which rates exist.
    let config = config.clone().with_offered_speeds(surface.offered_rates());
    let media = VideoMedia {
        video: video.clone(),
        log: log.clone(),
    };
    let speeds = config.speeds.len();

    let controller: Shared = Rc::new_cyclic(|weak: &Weak<RefCell<Controller>>| {
        let weak = weak.clone();
        let on_fire: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(controller) = weak.upgrade() {
                dispatch(&controller, None, Message::HideTimerFired);
            }
        });
        RefCell::new(PlaybackController::new(
            media,
            surface,
            WebTimer { on_fire },
            config,
        ))
    });

    let play_pause: Element = dom::by_id(document, PLAY_PAUSE_ID)?;
    on(&play_pause, "click", &controller, Message::TogglePlay);
    on(&video, "click", &controller, Message::SurfaceClicked);
    on(&video, "ended", &controller, Message::Ended);
    on(&video, "play", &controller, Message::PlaybackChanged);
    on(&video, "pause", &controller, Message::PlaybackChanged);
    on(&video, "timeupdate", &controller, Message::TimeUpdate);
    on(&video, "loadedmetadata", &controller, Message::TimeUpdate);

    let skip_back: Element = dom::by_id(document, SKIP_BACK_ID)?;
    let skip_forward: Element = dom::by_id(document, SKIP_FORWARD_ID)?;
    on(&skip_back, "click", &controller, Message::Skip(Direction::Back));
    on(&skip_forward, "click", &controller, Message::Skip(Direction::Forward));

    let seek: HtmlInputElement = dom::by_id(document, SEEK_ID)?;
    {
        let controller = controller.clone();
        let input = seek.clone();
        dom::listen(&seek, "input", move |event| {
            if let Ok(percent) = input.value().parse::<f64>() {
                dispatch(&controller, Some(event), Message::SeekInput(percent));
            }
        });
    }

    let speed_button: Element = dom::by_id(document, SPEED_BUTTON_ID)?;
    on(&speed_button, "click", &controller, Message::SpeedButton);
    let speed_menu: Element = dom::by_id(document, SPEED_MENU_ID)?;
    for (option, rate) in speed_options(&speed_menu) {
        if let Some(rate) = rate {
            on(&option, "click", &controller, Message::SpeedSelected(rate));
        }
    }
    {
        // Capture phase, so clicks that other components stop still close the
        // menu. Clicks on the menu or its button are left to their own handlers.
        let controller = controller.clone();
        dom::listen_capture(document, "click", move |event| {
            let inside = event
                .target()
                .and_then(|t| t.dyn_into::<Node>().ok())
                .is_some_and(|node| {
                    speed_menu.contains(Some(&node)) || speed_button.contains(Some(&node))
                });
            if !inside {
                dispatch(&controller, Some(event), Message::OutsideClick);
            }
        });
    }

    let player: Element = dom::by_id(document, PLAYER_ID)?;
    on(&player, "mousemove", &controller, Message::Activity);
    on(&player, "touchstart", &controller, Message::Activity);

    let fullscreen: Element = dom::by_id(document, FULLSCREEN_ID)?;
    on(&fullscreen, "click", &controller, Message::ToggleFullscreen);

    {
        let controller = controller.clone();
        dom::listen(document, "keydown", move |event| {
            let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if typing_in_field(event) {
                return;
            }
            if let Some(msg) = map_key(&key_event.key()) {
                event.prevent_default();
                dispatch(&controller, Some(event), msg);
            }
        });
    }

    dispatch(&controller, None, Message::Loaded);
    tracing::info!(speeds, "player controls ready");
    Ok(())
}

fn typing_in_field(event: &Event) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}
