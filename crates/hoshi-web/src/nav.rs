//! Sub/dub switch and previous/next episode controls.

use hoshi_core::error::HoshiError;
use hoshi_core::navigation::{switch_mode, EpisodeNav, Mode};
use web_sys::{Document, Element};

use crate::dom;

const MODE_SELECTOR: &str = "[data-mode]";
const EPISODE_NAV_SELECTOR: &str = "[data-episode-nav]";

pub fn init(document: &Document) -> Result<(), HoshiError> {
    let current = dom::current_url()?;

    for control in dom::query_all(document, MODE_SELECTOR) {
        bind_mode(&control);
    }

    let nav = EpisodeNav::from_url(&current);
    for control in dom::query_all(document, EPISODE_NAV_SELECTOR) {
        let target = nav.as_ref().and_then(|nav| {
            match control.get_attribute("data-episode-nav").as_deref() {
                Some("prev") => nav.previous(&current),
                Some("next") => nav.next(&current),
                _ => None,
            }
        });
        let Some(target) = target else {
            let _ = control.toggle_attribute_with_force("hidden", true);
            continue;
        };
        dom::listen(&control, "click", move |event| {
            event.prevent_default();
            dom::navigate(&target);
        });
    }
    Ok(())
}

fn bind_mode(control: &Element) {
    let Some(mode) = control
        .get_attribute("data-mode")
        .and_then(|m| m.parse::<Mode>().ok())
    else {
        tracing::debug!("mode control without a valid data-mode");
        return;
    };
    let title = control.get_attribute("data-title");

    dom::listen(control, "click", move |event| {
        event.prevent_default();
        // Read at click time: the query may have changed since load.
        match dom::current_url() {
            Ok(current) => {
                let target = switch_mode(&current, mode, title.as_deref());
                tracing::debug!(%mode, url = %target, "switching mode");
                dom::navigate(&target);
            }
            Err(e) => tracing::warn!(error = %e, "cannot read current URL"),
        }
    });
}
