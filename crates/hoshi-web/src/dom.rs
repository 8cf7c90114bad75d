//! Small DOM helpers shared by the page components.

use gloo_events::{EventListener, EventListenerOptions};
use hoshi_core::error::HoshiError;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, NodeList, Window};

/// Inline config override: `<script type="application/toml" id="hoshi-config">`.
const CONFIG_ID: &str = "hoshi-config";

pub fn window() -> Result<Window, HoshiError> {
    web_sys::window().ok_or(HoshiError::MissingElement("window"))
}

pub fn document() -> Result<Document, HoshiError> {
    window()?
        .document()
        .ok_or(HoshiError::MissingElement("document"))
}

/// Element `id`, cast to `T`.
pub fn by_id<T: JsCast>(document: &Document, id: &'static str) -> Result<T, HoshiError> {
    optional_by_id(document, id).ok_or(HoshiError::MissingElement(id))
}

pub fn optional_by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
}

/// Every element in `list`, skipping text and comment nodes.
pub fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn query_all(document: &Document, selector: &str) -> Vec<Element> {
    match document.query_selector_all(selector) {
        Ok(list) => elements(&list),
        Err(e) => {
            tracing::warn!(selector, error = %js_message(&e), "bad selector");
            Vec::new()
        }
    }
}

pub fn query_all_within(root: &Element, selector: &str) -> Vec<Element> {
    match root.query_selector_all(selector) {
        Ok(list) => elements(&list),
        Err(e) => {
            tracing::warn!(selector, error = %js_message(&e), "bad selector");
            Vec::new()
        }
    }
}

/// Attach `handler` to `target` for the lifetime of the page.
///
/// Listeners are non-passive so handlers may call `preventDefault`.
pub fn listen(target: &EventTarget, event: &'static str, handler: impl FnMut(&Event) + 'static) {
    EventListener::new_with_options(
        target,
        event,
        EventListenerOptions::enable_prevent_default(),
        handler,
    )
    .forget();
}

/// Like [`listen`], in the capture phase: runs before any target handler can
/// stop the event.
pub fn listen_capture(
    target: &EventTarget,
    event: &'static str,
    handler: impl FnMut(&Event) + 'static,
) {
    EventListener::new_with_options(
        target,
        event,
        EventListenerOptions::run_in_capture_phase(),
        handler,
    )
    .forget();
}

/// Text of the inline config block, if the page has one.
pub fn config_override() -> Option<String> {
    let document = document().ok()?;
    document.get_element_by_id(CONFIG_ID)?.text_content()
}

/// Full navigation to `url`.
pub fn navigate(url: &url::Url) {
    let result = window().and_then(|w| w.location().set_href(url.as_str()).map_err(dom_error));
    if let Err(e) = result {
        tracing::warn!(url = %url, error = %e, "navigation failed");
    }
}

/// The current page URL.
pub fn current_url() -> Result<url::Url, HoshiError> {
    let href = window()?.location().href().map_err(dom_error)?;
    url::Url::parse(&href).map_err(|e| HoshiError::Dom(e.to_string()))
}

pub fn dom_error(err: JsValue) -> HoshiError {
    HoshiError::Dom(js_message(&err))
}

pub fn js_message(err: &JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return format!("{}: {}", String::from(e.name()), String::from(e.message()));
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
