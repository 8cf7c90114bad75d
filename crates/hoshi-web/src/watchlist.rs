//! Watchlist controls bound to `localStorage` and the live document.

use std::rc::{Rc, Weak};

use hoshi_core::config::WatchlistConfig;
use hoshi_core::diagnostics::{record, DiagnosticEvent, SharedEventLog};
use hoshi_core::error::HoshiError;
use hoshi_core::storage::{KeyValueStore, StorageError};
use hoshi_core::watchlist::{Watchlist, WatchlistDom, WatchlistSync};
use gloo_storage::errors::StorageError as GlooStorageError;
use gloo_storage::{LocalStorage, Storage};
use js_sys::Array;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MutationObserver, MutationObserverInit, MutationRecord};

use crate::dom;

const TOGGLE_SELECTOR: &str = "[data-watchlist-id]";
const ID_ATTR: &str = "data-watchlist-id";
const REMOVE_ONLY_CLASS: &str = "remove-only";
const CARD_SELECTOR: &str = ".anime-card";
const DESCRIPTION_ID: &str = "watchlist-desc-btn";
const CONTAINER_ID: &str = "watchlist-container";
const BOUND_ATTR: &str = "data-watchlist-bound";

/// `window.localStorage` through `gloo-storage`.
pub struct LocalStore;

impl LocalStore {
    /// `gloo-storage` panics when `localStorage` is missing, so check first.
    pub fn open() -> Result<Self, StorageError> {
        let window = dom::window().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        match window.local_storage() {
            Ok(Some(_)) => Ok(Self),
            Ok(None) => Err(StorageError::Unavailable("localStorage missing".into())),
            Err(e) => Err(StorageError::Unavailable(dom::js_message(&e))),
        }
    }
}

impl KeyValueStore for LocalStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match LocalStorage::get(key) {
            Ok(value) => Ok(Some(value)),
            Err(GlooStorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(storage_error(e)),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        LocalStorage::set(key, value).map_err(storage_error)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        LocalStorage::delete(key);
        Ok(())
    }
}

fn storage_error(err: GlooStorageError) -> StorageError {
    match err {
        GlooStorageError::SerdeError(e) => StorageError::Json(e),
        GlooStorageError::JsError(e) if e.name == "QuotaExceededError" => {
            StorageError::Quota(e.message)
        }
        other => StorageError::Unavailable(other.to_string()),
    }
}

/// The document's watchlist controls.
pub struct DomWatchlist {
    document: Document,
    sync: Weak<PageSync>,
}

impl DomWatchlist {
    fn is_description(el: &Element) -> bool {
        el.id() == DESCRIPTION_ID
    }
}

impl WatchlistDom for DomWatchlist {
    type Node = Element;

    fn toggles(&self) -> Vec<Element> {
        dom::query_all(&self.document, TOGGLE_SELECTOR)
            .into_iter()
            .filter(|el| !Self::is_description(el))
            .collect()
    }

    fn toggles_within(&self, root: &Element) -> Vec<Element> {
        let mut found = Vec::new();
        if root.matches(TOGGLE_SELECTOR).unwrap_or(false) {
            found.push(root.clone());
        }
        found.extend(dom::query_all_within(root, TOGGLE_SELECTOR));
        found.retain(|el| !Self::is_description(el));
        found
    }

    fn description_toggle(&self) -> Option<Element> {
        self.document.get_element_by_id(DESCRIPTION_ID)
    }

    fn anime_id(&self, toggle: &Element) -> Option<String> {
        toggle.get_attribute(ID_ATTR).filter(|id| !id.is_empty())
    }

    fn is_remove_only(&self, toggle: &Element) -> bool {
        toggle.class_list().contains(REMOVE_ONLY_CLASS)
    }

    fn set_glyph(&self, toggle: &Element, glyph: &str) {
        if toggle.text_content().as_deref() != Some(glyph) {
            toggle.set_text_content(Some(glyph));
        }
    }

    fn set_label(&self, toggle: &Element, label: &str) {
        if toggle.text_content().as_deref() != Some(label) {
            toggle.set_text_content(Some(label));
        }
    }

    fn remove_card(&self, toggle: &Element) {
        match toggle.closest(CARD_SELECTOR) {
            Ok(Some(card)) => card.remove(),
            _ => toggle.remove(),
        }
    }

    fn is_bound(&self, toggle: &Element) -> bool {
        toggle.has_attribute(BOUND_ATTR)
    }

    fn bind_click(&self, toggle: &Element) {
        // The listener outlives `init`, so it holds the synchronizer itself.
        let Some(sync) = self.sync.upgrade() else {
            return;
        };
        let node = toggle.clone();
        dom::listen(toggle, "click", move |event| {
            // Cards are links: the star must not navigate.
            event.prevent_default();
            event.stop_propagation();
            sync.on_click(&node);
        });
        // Marks the node so later scans skip it.
        if let Err(e) = toggle.set_attribute(BOUND_ATTR, "") {
            tracing::warn!(error = %dom::js_message(&e), "could not mark watchlist toggle bound");
        }
    }
}

type PageSync = WatchlistSync<LocalStore, DomWatchlist>;

pub fn init(
    document: &Document,
    config: &WatchlistConfig,
    log: &SharedEventLog,
) -> Result<(), HoshiError> {
    let store = match LocalStore::open() {
        Ok(backend) => Watchlist::open(backend, config.storage_key.clone(), log.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "localStorage unavailable, watchlist will not persist");
            record(
                log,
                DiagnosticEvent::StorageDegraded {
                    reason: e.to_string(),
                },
            );
            Watchlist::inert(config.storage_key.clone(), log.clone())
        }
    };

    let sync: Rc<PageSync> = Rc::new_cyclic(|weak| {
        WatchlistSync::new(
            store,
            DomWatchlist {
                document: document.clone(),
                sync: weak.clone(),
            },
            config.clone(),
        )
    });

    sync.init();

    if let Some(container) = document.get_element_by_id(CONTAINER_ID) {
        observe(&container, sync)?;
    }
    Ok(())
}

/// Re-bind and re-render whenever cards are appended to `container`.
fn observe(container: &Element, sync: Rc<PageSync>) -> Result<(), HoshiError> {
    let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
        move |records: Array, _observer: MutationObserver| {
            let added: Vec<Element> = records
                .iter()
                .filter_map(|r| r.dyn_into::<MutationRecord>().ok())
                .flat_map(|r| dom::elements(&r.added_nodes()))
                .collect();
            if !added.is_empty() {
                sync.on_nodes_added(&added);
            }
        },
    );

    let observer =
        MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(dom::dom_error)?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    observer
        .observe_with_options(container, &options)
        .map_err(dom::dom_error)?;
    callback.forget();
    tracing::debug!("observing watchlist container");
    Ok(())
}
