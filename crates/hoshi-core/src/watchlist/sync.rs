//! Keeps every rendered watchlist control in agreement with the store.
//!
//! Controls are star toggles on anime cards (filled = in the watchlist),
//! "remove-only" toggles on the watchlist page (whose card disappears once the
//! anime is removed), and one optional prose button on the description page.
//! Their appearance is recomputed from the store on every refresh; no control
//! carries state of its own.

use crate::config::WatchlistConfig;
use crate::storage::KeyValueStore;

use super::store::Watchlist;

/// The page as seen by the synchronizer.
///
/// `Node` is a cheap handle (a DOM element in the browser).
pub trait WatchlistDom {
    type Node: Clone;

    /// Every generic toggle currently in the document, in document order.
    /// The description-page button is not included.
    fn toggles(&self) -> Vec<Self::Node>;

    /// Generic toggles inside `root`, including `root` itself if it is one.
    fn toggles_within(&self, root: &Self::Node) -> Vec<Self::Node>;

    /// The description page's prose toggle, if this page has one.
    fn description_toggle(&self) -> Option<Self::Node>;

    /// The anime identifier declared on the control.
    fn anime_id(&self, toggle: &Self::Node) -> Option<String>;

    fn is_remove_only(&self, toggle: &Self::Node) -> bool;

    fn set_glyph(&self, toggle: &Self::Node, glyph: &str);

    fn set_label(&self, toggle: &Self::Node, label: &str);

    /// Detach the card containing `toggle` from the document.
    fn remove_card(&self, toggle: &Self::Node);

    fn is_bound(&self, toggle: &Self::Node) -> bool;

    /// Attach the click handler. Afterwards `is_bound(toggle)` is true.
    fn bind_click(&self, toggle: &Self::Node);
}

/// What a refresh does to one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleRender<N> {
    Glyph { node: N, present: bool },
    Label { node: N, present: bool },
    RemoveCard { node: N },
}

/// Compute the render of every control from the current watchlist.
///
/// `toggles` pairs each generic control with its identifier and remove-only
/// flag; controls without an identifier are skipped.
pub fn render_plan<N: Clone>(
    entries: &[String],
    toggles: &[(N, Option<String>, bool)],
    description: Option<(N, Option<String>)>,
) -> Vec<ToggleRender<N>> {
    let contains = |id: &str| entries.iter().any(|entry| entry == id);
    let mut plan = Vec::with_capacity(toggles.len() + 1);

    for (node, id, remove_only) in toggles {
        let Some(id) = id else {
            continue;
        };
        let present = contains(id);
        if *remove_only && !present {
            plan.push(ToggleRender::RemoveCard { node: node.clone() });
        } else {
            plan.push(ToggleRender::Glyph {
                node: node.clone(),
                present,
            });
        }
    }

    if let Some((node, Some(id))) = description {
        plan.push(ToggleRender::Label {
            present: contains(&id),
            node,
        });
    }

    plan
}

/// The watchlist view synchronizer.
pub struct WatchlistSync<S, D> {
    store: Watchlist<S>,
    dom: D,
    config: WatchlistConfig,
}

impl<S: KeyValueStore, D: WatchlistDom> WatchlistSync<S, D> {
    pub fn new(store: Watchlist<S>, dom: D, config: WatchlistConfig) -> Self {
        Self { store, dom, config }
    }

    pub fn store(&self) -> &Watchlist<S> {
        &self.store
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Bind every control already on the page and render the current state.
    pub fn init(&self) {
        let mut bound = 0;
        for toggle in self.dom.toggles() {
            bound += usize::from(self.bind_one(&toggle));
        }
        if let Some(desc) = self.dom.description_toggle() {
            bound += usize::from(self.bind_one(&desc));
        }
        tracing::debug!(bound, "watchlist controls bound");
        self.refresh_all();
    }

    /// Re-render every control from the store.
    pub fn refresh_all(&self) {
        let entries = self.store.get();
        let toggles: Vec<_> = self
            .dom
            .toggles()
            .into_iter()
            .map(|node| {
                let id = self.dom.anime_id(&node);
                let remove_only = self.dom.is_remove_only(&node);
                (node, id, remove_only)
            })
            .collect();
        let description = self
            .dom
            .description_toggle()
            .map(|node| {
                let id = self.dom.anime_id(&node);
                (node, id)
            });

        for render in render_plan(&entries, &toggles, description) {
            match render {
                ToggleRender::Glyph { node, present } => {
                    let glyph = if present {
                        &self.config.glyph_present
                    } else {
                        &self.config.glyph_absent
                    };
                    self.dom.set_glyph(&node, glyph);
                }
                ToggleRender::Label { node, present } => {
                    let label = if present {
                        &self.config.remove_label
                    } else {
                        &self.config.add_label
                    };
                    self.dom.set_label(&node, label);
                }
                ToggleRender::RemoveCard { node } => self.dom.remove_card(&node),
            }
        }
    }

    /// Bind the click handler on every unbound toggle inside `container`.
    ///
    /// Returns how many toggles were newly bound.
    pub fn bind(&self, container: &D::Node) -> usize {
        self.dom
            .toggles_within(container)
            .iter()
            .filter(|toggle| self.bind_one(toggle))
            .count()
    }

    /// Handle a click on `toggle`: flip its anime in the store and re-render.
    ///
    /// Returns whether the anime is in the watchlist afterwards.
    pub fn on_click(&self, toggle: &D::Node) -> bool {
        let Some(id) = self.dom.anime_id(toggle) else {
            tracing::debug!("watchlist toggle without an anime id clicked");
            return false;
        };
        let present = self.store.toggle(&id);
        self.refresh_all();
        present
    }

    /// Nodes were inserted into the observed container.
    ///
    /// Binds any new toggles among (or inside) them, then re-renders everything
    /// from the store as it is now.
    pub fn on_nodes_added(&self, added: &[D::Node]) {
        let bound: usize = added.iter().map(|node| self.bind(node)).sum();
        tracing::debug!(added = added.len(), bound, "watchlist container changed");
        self.refresh_all();
    }

    fn bind_one(&self, toggle: &D::Node) -> bool {
        if self.dom.is_bound(toggle) {
            return false;
        }
        self.dom.bind_click(toggle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HoshiConfig;
    use crate::diagnostics::shared_event_log;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;

    const KEY: &str = "watchlist";

    #[derive(Debug, Clone, Default)]
    struct FakeNode {
        anime_id: Option<String>,
        toggle: bool,
        remove_only: bool,
        description: bool,
        parent: Option<usize>,
        glyph: String,
        label: String,
        removed: bool,
        listeners: u32,
    }

    #[derive(Default)]
    struct FakeDom {
        nodes: RefCell<Vec<FakeNode>>,
    }

    impl FakeDom {
        fn add(&self, node: FakeNode) -> usize {
            let mut nodes = self.nodes.borrow_mut();
            nodes.push(node);
            nodes.len() - 1
        }

        fn container(&self) -> usize {
            self.add(FakeNode::default())
        }

        fn toggle(&self, id: &str, parent: Option<usize>) -> usize {
            self.add(FakeNode {
                anime_id: Some(id.into()),
                toggle: true,
                parent,
                ..Default::default()
            })
        }

        fn remove_only(&self, id: &str, parent: Option<usize>) -> usize {
            self.add(FakeNode {
                anime_id: Some(id.into()),
                toggle: true,
                remove_only: true,
                parent,
                ..Default::default()
            })
        }

        fn node(&self, n: usize) -> FakeNode {
            self.nodes.borrow()[n].clone()
        }

        fn live(&self, n: usize) -> bool {
            let nodes = self.nodes.borrow();
            !nodes[n].removed && nodes[n].parent.map_or(true, |p| !nodes[p].removed)
        }
    }

    impl WatchlistDom for FakeDom {
        type Node = usize;

        fn toggles(&self) -> Vec<usize> {
            (0..self.nodes.borrow().len())
                .filter(|&n| {
                    let node = self.node(n);
                    node.toggle && !node.description && self.live(n)
                })
                .collect()
        }

        fn toggles_within(&self, root: &usize) -> Vec<usize> {
            self.toggles()
                .into_iter()
                .filter(|&n| n == *root || self.node(n).parent == Some(*root))
                .collect()
        }

        fn description_toggle(&self) -> Option<usize> {
            (0..self.nodes.borrow().len()).find(|&n| self.node(n).description)
        }

        fn anime_id(&self, toggle: &usize) -> Option<String> {
            self.node(*toggle).anime_id
        }

        fn is_remove_only(&self, toggle: &usize) -> bool {
            self.node(*toggle).remove_only
        }

        fn set_glyph(&self, toggle: &usize, glyph: &str) {
            self.nodes.borrow_mut()[*toggle].glyph = glyph.into();
        }

        fn set_label(&self, toggle: &usize, label: &str) {
            self.nodes.borrow_mut()[*toggle].label = label.into();
        }

        fn remove_card(&self, toggle: &usize) {
            self.nodes.borrow_mut()[*toggle].removed = true;
        }

        fn is_bound(&self, toggle: &usize) -> bool {
            self.node(*toggle).listeners > 0
        }

        fn bind_click(&self, toggle: &usize) {
            self.nodes.borrow_mut()[*toggle].listeners += 1;
        }
    }

    fn sync_with(seed: &str) -> WatchlistSync<MemoryStore, FakeDom> {
        let store = Watchlist::open(
            MemoryStore::new().with_item(KEY, seed),
            KEY,
            shared_event_log(),
        );
        WatchlistSync::new(store, FakeDom::default(), HoshiConfig::default().watchlist)
    }

    #[test]
    fn test_init_renders_glyphs() {
        let sync = sync_with(r#"["frieren"]"#);
        let a = sync.dom().toggle("frieren", None);
        let b = sync.dom().toggle("naruto", None);
        sync.init();
        assert_eq!(sync.dom().node(a).glyph, "★");
        assert_eq!(sync.dom().node(b).glyph, "☆");
        assert_eq!(sync.dom().node(a).listeners, 1);
        assert_eq!(sync.dom().node(b).listeners, 1);
    }

    #[test]
    fn test_click_updates_every_control_for_same_anime() {
        let sync = sync_with("[]");
        let a = sync.dom().toggle("frieren", None);
        let b = sync.dom().toggle("frieren", None);
        sync.init();
        assert!(sync.on_click(&a));
        assert_eq!(sync.dom().node(a).glyph, "★");
        assert_eq!(sync.dom().node(b).glyph, "★");
        assert!(!sync.on_click(&b));
        assert_eq!(sync.dom().node(a).glyph, "☆");
        assert!(!sync.store().contains("frieren"));
    }

    #[test]
    fn test_remove_only_card_disappears() {
        let sync = sync_with(r#"["frieren","naruto"]"#);
        let page = sync.dom().container();
        let a = sync.dom().remove_only("frieren", Some(page));
        let b = sync.dom().remove_only("naruto", Some(page));
        sync.init();
        assert_eq!(sync.dom().node(a).glyph, "★");

        sync.on_click(&a);
        assert!(sync.dom().node(a).removed);
        assert!(!sync.dom().node(b).removed);
        assert_eq!(sync.store().get(), vec!["naruto"]);
    }

    #[test]
    fn test_remove_only_absent_on_load_is_removed() {
        let sync = sync_with("[]");
        let a = sync.dom().remove_only("gone", None);
        sync.init();
        assert!(sync.dom().node(a).removed);
        // Display refinement only: the store is untouched.
        assert!(sync.store().get().is_empty());
    }

    #[test]
    fn test_description_label() {
        let sync = sync_with("[]");
        let desc = sync.dom().add(FakeNode {
            anime_id: Some("frieren".into()),
            toggle: true,
            description: true,
            ..Default::default()
        });
        let star = sync.dom().toggle("frieren", None);
        sync.init();
        assert_eq!(sync.dom().node(desc).label, "Add to Watchlist");
        assert_eq!(sync.dom().node(desc).glyph, "");
        assert_eq!(sync.dom().node(desc).listeners, 1);

        sync.on_click(&desc);
        assert_eq!(sync.dom().node(desc).label, "Remove from Watchlist");
        assert_eq!(sync.dom().node(star).glyph, "★");
    }

    #[test]
    fn test_missing_description_is_fine() {
        let sync = sync_with(r#"["x"]"#);
        let star = sync.dom().toggle("x", None);
        sync.init();
        assert_eq!(sync.dom().node(star).glyph, "★");
    }

    #[test]
    fn test_toggle_without_id_is_skipped() {
        let sync = sync_with("[]");
        let bare = sync.dom().add(FakeNode {
            toggle: true,
            ..Default::default()
        });
        sync.init();
        assert_eq!(sync.dom().node(bare).glyph, "");
        assert!(!sync.on_click(&bare));
        assert!(sync.store().get().is_empty());
    }

    #[test]
    fn test_refresh_is_deterministic() {
        let sync = sync_with(r#"["a"]"#);
        let page = sync.dom().container();
        let nodes = [
            sync.dom().toggle("a", Some(page)),
            sync.dom().toggle("b", Some(page)),
            sync.dom().remove_only("a", Some(page)),
            sync.dom().remove_only("b", Some(page)),
        ];
        sync.init();
        let first: Vec<_> = nodes.iter().map(|&n| sync.dom().node(n).glyph).collect();
        let first_removed: Vec<_> = nodes.iter().map(|&n| sync.dom().node(n).removed).collect();
        sync.refresh_all();
        sync.refresh_all();
        let second: Vec<_> = nodes.iter().map(|&n| sync.dom().node(n).glyph).collect();
        let second_removed: Vec<_> = nodes.iter().map(|&n| sync.dom().node(n).removed).collect();
        assert_eq!(first, second);
        assert_eq!(first_removed, second_removed);
        assert_eq!(first_removed, vec![false, false, false, true]);
    }

    #[test]
    fn test_render_plan_is_pure() {
        let entries = vec!["a".to_string()];
        let toggles = vec![
            (1, Some("a".to_string()), false),
            (2, Some("b".to_string()), true),
            (3, None, false),
        ];
        let plan = render_plan(&entries, &toggles, Some((4, Some("b".to_string()))));
        assert_eq!(plan, render_plan(&entries, &toggles, Some((4, Some("b".to_string())))));
        assert_eq!(
            plan,
            vec![
                ToggleRender::Glyph { node: 1, present: true },
                ToggleRender::RemoveCard { node: 2 },
                ToggleRender::Label { node: 4, present: false },
            ]
        );
    }

    #[test]
    fn test_injected_card_is_bound_and_rendered() {
        let sync = sync_with(r#"["new"]"#);
        let container = sync.dom().container();
        let old = sync.dom().toggle("old", Some(container));
        sync.init();

        // Content injected after load by another renderer.
        let card = sync.dom().container();
        sync.dom().nodes.borrow_mut()[card].parent = Some(container);
        let fresh = sync.dom().toggle("new", Some(card));
        sync.on_nodes_added(&[card]);

        assert_eq!(sync.dom().node(fresh).listeners, 1);
        assert_eq!(sync.dom().node(fresh).glyph, "★");
        assert!(!sync.on_click(&fresh));
        assert_eq!(sync.dom().node(fresh).glyph, "☆");
        assert_eq!(sync.dom().node(old).listeners, 1);
    }

    #[test]
    fn test_bind_is_idempotent() {
        let sync = sync_with("[]");
        let container = sync.dom().container();
        let a = sync.dom().toggle("a", Some(container));
        sync.init();
        assert_eq!(sync.bind(&container), 0);
        sync.on_nodes_added(&[container, a]);
        assert_eq!(sync.dom().node(a).listeners, 1);
    }

    #[test]
    fn test_injected_toggle_itself() {
        let sync = sync_with("[]");
        sync.init();
        let t = sync.dom().toggle("solo", None);
        sync.on_nodes_added(&[t]);
        assert_eq!(sync.dom().node(t).listeners, 1);
        assert_eq!(sync.dom().node(t).glyph, "☆");
    }

    #[test]
    fn test_degraded_store_keeps_ui_functional() {
        let store = Watchlist::open(MemoryStore::failing(), KEY, shared_event_log());
        let sync = WatchlistSync::new(store, FakeDom::default(), HoshiConfig::default().watchlist);
        let a = sync.dom().toggle("a", None);
        sync.init();
        assert!(!sync.on_click(&a));
        assert_eq!(sync.dom().node(a).glyph, "☆");
    }
}
