use std::sync::Mutex;

use tracing::debug;

use crate::error::Result;
use crate::models::GraphSummary;
use crate::selection::{SelectionCoordinator, SelectionEffect, SelectionEvent};
use crate::services::TaxonomyService;
use crate::tree::{materialize, FilteredView, TreeFilter, TreeNode};

/// URL-carried state for the editor route: the selected graph id and,
/// when present, the selected node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlState {
    pub graph_id: Option<i64>,
    pub node_id: Option<String>,
}

/// Session-scoped driver that owns the selection coordinator and runs its
/// effects against the fetch service.
///
/// Every fetch is tagged with the graph id it was issued for; the resolution
/// is fed back as `ExportLoaded { graph_id, .. }` and the coordinator
/// discards it when a newer selection superseded the request. In-flight
/// fetches are never cancelled; staleness is handled entirely by the
/// discard rule, so a hung request delays only its own resolution.
///
/// Methods take `&self`; state lives behind mutexes so overlapping async
/// flows (two rapid graph selections) interleave safely. Locks are released
/// across awaits.
pub struct TaxonomySession {
    service: TaxonomyService,
    coordinator: Mutex<SelectionCoordinator>,
    filter: Mutex<TreeFilter>,
    /// The graph id this session last wrote back to the URL
    synced_url: Mutex<Option<i64>>,
}

impl TaxonomySession {
    pub fn new(service: TaxonomyService) -> Self {
        Self {
            service,
            coordinator: Mutex::new(SelectionCoordinator::new()),
            filter: Mutex::new(TreeFilter::new()),
            synced_url: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &TaxonomyService {
        &self.service
    }

    /// Load the graph list and, when the URL names a graph, restore that
    /// selection. Returns the list for display.
    pub async fn initialize(&self, url: &UrlState) -> Result<Vec<GraphSummary>> {
        let graphs = self.service.list_graphs().await?;

        let effects = {
            let mut coordinator = self.coordinator.lock().unwrap();
            coordinator.set_graphs(graphs.clone());
            match url.graph_id {
                Some(graph_id) => coordinator.apply(SelectionEvent::RestoreFromUrl {
                    graph_id,
                    node_id: url.node_id.clone(),
                }),
                None => Vec::new(),
            }
        };

        self.run_effects(effects).await?;
        Ok(graphs)
    }

    /// User-driven graph selection.
    pub async fn select_graph(&self, graph_id: i64) -> Result<()> {
        let effects = self
            .coordinator
            .lock()
            .unwrap()
            .apply(SelectionEvent::SelectGraph(graph_id));
        self.run_effects(effects).await
    }

    /// The URL changed underneath the session (back/forward navigation).
    pub async fn handle_url_change(&self, graph_id: i64) -> Result<()> {
        let effects = self
            .coordinator
            .lock()
            .unwrap()
            .apply(SelectionEvent::UrlChanged(graph_id));
        self.run_effects(effects).await
    }

    pub fn select_node(&self, node_id: impl Into<String>) {
        self.coordinator
            .lock()
            .unwrap()
            .apply(SelectionEvent::SelectNode(node_id.into()));
    }

    pub fn clear_node(&self) {
        self.coordinator
            .lock()
            .unwrap()
            .apply(SelectionEvent::ClearNode);
    }

    /// Run the live search query against the current tree. Returns `None`
    /// when no tree is loaded.
    pub fn apply_filter(&self, query: &str) -> Option<FilteredView> {
        let coordinator = self.coordinator.lock().unwrap();
        let tree = coordinator.tree()?;
        let view = self
            .filter
            .lock()
            .unwrap()
            .apply(tree, query, coordinator.selected_node_id());
        Some(view)
    }

    pub fn selected_graph_id(&self) -> Option<i64> {
        self.coordinator.lock().unwrap().selected_graph_id()
    }

    pub fn selected_node_id(&self) -> Option<String> {
        self.coordinator
            .lock()
            .unwrap()
            .selected_node_id()
            .map(str::to_string)
    }

    pub fn tree_version(&self) -> u64 {
        self.coordinator.lock().unwrap().tree_version()
    }

    pub fn load_error(&self) -> Option<String> {
        self.coordinator
            .lock()
            .unwrap()
            .load_error()
            .map(str::to_string)
    }

    /// Read access to the current tree without cloning it.
    pub fn with_tree<R>(&self, f: impl FnOnce(Option<&TreeNode>) -> R) -> R {
        let coordinator = self.coordinator.lock().unwrap();
        f(coordinator.tree())
    }

    /// The graph id most recently written back to the URL by a user-driven
    /// selection.
    pub fn synced_url(&self) -> Option<i64> {
        *self.synced_url.lock().unwrap()
    }

    async fn run_effects(&self, effects: Vec<SelectionEffect>) -> Result<()> {
        for effect in effects {
            match effect {
                SelectionEffect::SyncUrl(graph_id) => {
                    *self.synced_url.lock().unwrap() = Some(graph_id);
                }
                SelectionEffect::FetchExport(graph_id) => {
                    // Lock is not held across the await; a concurrent
                    // selection can supersede this fetch while it is in
                    // flight and its resolution will then be discarded.
                    match self.load_tree(graph_id).await {
                        Ok(tree) => {
                            self.coordinator
                                .lock()
                                .unwrap()
                                .apply(SelectionEvent::ExportLoaded { graph_id, tree });
                        }
                        Err(e) => {
                            debug!(graph_id, "Export load failed: {}", e);
                            self.coordinator
                                .lock()
                                .unwrap()
                                .apply(SelectionEvent::LoadFailed {
                                    graph_id,
                                    message: e.to_string(),
                                });
                            return Err(e);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn load_tree(&self, graph_id: i64) -> Result<TreeNode> {
        let export = self.service.fetch_export(graph_id).await?;
        materialize(&export)
    }
}
