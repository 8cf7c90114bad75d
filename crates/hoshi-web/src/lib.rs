mod dom;
mod logging;
mod nav;
mod player;
mod search;
mod watchlist;

use hoshi_core::config::HoshiConfig;
use hoshi_core::diagnostics::{record, shared_event_log, DiagnosticEvent, SharedEventLog};
use hoshi_core::error::HoshiError;
use wasm_bindgen::prelude::*;

thread_local! {
    static EVENT_LOG: SharedEventLog = shared_event_log();
}

#[wasm_bindgen(start)]
pub fn start() {
    let log = EVENT_LOG.with(SharedEventLog::clone);

    let (config, config_error) = match dom::config_override() {
        Some(text) => match HoshiConfig::from_override(&text) {
            Ok(config) => (config, None),
            Err(e) => (HoshiConfig::default(), Some(e)),
        },
        None => (HoshiConfig::default(), None),
    };
    logging::init(&config.log.filter);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "ignoring page config override");
    }

    let document = match dom::document() {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(error = %e, "no document, nothing to do");
            return;
        }
    };

    // Each component stands alone; one failing leaves the others running.
    run("search", &log, || search::init(&document, &config.suggest, &log));
    run("watchlist", &log, || watchlist::init(&document, &config.watchlist, &log));
    run("player", &log, || player::init(&document, &config.player, &log));
    run("navigation", &log, || nav::init(&document));
}

fn run(component: &str, log: &SharedEventLog, init: impl FnOnce() -> Result<(), HoshiError>) {
    if let Err(e) = init() {
        tracing::warn!(component, error = %e, "component disabled");
        record(
            log,
            DiagnosticEvent::ComponentInert {
                component: component.to_string(),
                missing: e.to_string(),
            },
        );
    }
}

/// Diagnostics recorded so far, as a JSON array.
#[wasm_bindgen]
pub fn diagnostics_json() -> String {
    EVENT_LOG.with(|log| log.borrow().to_json())
}
