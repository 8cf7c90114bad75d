//! Autocomplete on the search field.

use std::cell::RefCell;
use std::rc::Rc;

use hoshi_api::{AutocompleteClient, SuggestionItem};
use hoshi_core::config::SuggestConfig;
use hoshi_core::diagnostics::SharedEventLog;
use hoshi_core::error::HoshiError;
use hoshi_core::suggest::{complete, SuggestionFetcher, SuggestionView};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlInputElement};

use crate::dom;

const INPUT_ID: &str = "search-input";
const LIST_ID: &str = "suggestions";
const INDEX_ATTR: &str = "data-index";

pub struct DomSuggestions {
    document: Document,
    input: HtmlInputElement,
    list: Element,
}

impl DomSuggestions {
    fn row(&self, index: usize, item: &SuggestionItem) -> Result<Element, HoshiError> {
        let li = self.document.create_element("li").map_err(dom::dom_error)?;
        li.set_class_name("suggestion");
        li.set_text_content(Some(&item.title));
        li.set_attribute(INDEX_ATTR, &index.to_string())
            .map_err(dom::dom_error)?;
        Ok(li)
    }
}

impl SuggestionView for DomSuggestions {
    fn clear(&mut self) {
        self.list.set_inner_html("");
    }

    fn render(&mut self, items: &[SuggestionItem]) {
        self.list.set_inner_html("");
        for (index, item) in items.iter().enumerate() {
            let appended = self
                .row(index, item)
                .and_then(|li| self.list.append_child(&li).map_err(dom::dom_error));
            if let Err(e) = appended {
                tracing::warn!(error = %e, "could not render suggestion");
            }
        }
    }

    fn set_query(&mut self, text: &str) {
        self.input.set_value(text);
    }
}

type Fetcher = Rc<RefCell<SuggestionFetcher<DomSuggestions>>>;

pub fn init(document: &Document, config: &SuggestConfig, log: &SharedEventLog) -> Result<(), HoshiError> {
    let Some(input) = dom::optional_by_id::<HtmlInputElement>(document, INPUT_ID) else {
        tracing::debug!("no search field on this page");
        return Ok(());
    };
    let list: Element = dom::by_id(document, LIST_ID)?;

    let origin = dom::window()?.location().origin().map_err(dom::dom_error)?;
    let client = Rc::new(AutocompleteClient::new(&origin, &config.endpoint)?);

    let fetcher: Fetcher = Rc::new(RefCell::new(SuggestionFetcher::new(
        DomSuggestions {
            document: document.clone(),
            input: input.clone(),
            list: list.clone(),
        },
        log.clone(),
    )));

    {
        let fetcher = fetcher.clone();
        let field = input.clone();
        dom::listen(&input, "input", move |_| {
            // Clearing on a blank query happens here, before any await.
            let Some(request) = fetcher.borrow_mut().on_input(&field.value()) else {
                return;
            };
            let fetcher = fetcher.clone();
            let client = client.clone();
            wasm_bindgen_futures::spawn_local(async move {
                complete(&*fetcher, client.as_ref(), request).await;
            });
        });
    }

    dom::listen(&list, "click", move |event| {
        let index = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(&format!("[{INDEX_ATTR}]")).ok().flatten())
            .and_then(|row| row.get_attribute(INDEX_ATTR))
            .and_then(|i| i.parse::<usize>().ok());
        let Some(index) = index else {
            return;
        };
        if let Some(title) = fetcher.borrow_mut().select(index) {
            tracing::debug!(title = %title, "suggestion selected");
        }
    });

    tracing::debug!(endpoint = %config.endpoint, "autocomplete ready");
    Ok(())
}
