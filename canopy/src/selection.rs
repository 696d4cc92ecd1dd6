use tracing::debug;

use crate::models::GraphSummary;
use crate::tree::TreeNode;

/// Named transitions of the selection state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    /// User picked a graph in the UI
    SelectGraph(i64),
    /// A fetch started by an earlier transition resolved with a materialized
    /// tree; `graph_id` tags which request this resolution belongs to
    ExportLoaded { graph_id: i64, tree: TreeNode },
    /// The fetch for `graph_id` failed; the message is surfaced locally
    LoadFailed { graph_id: i64, message: String },
    /// User picked a node row; local state only
    SelectNode(String),
    ClearNode,
    /// The URL's graph id changed after initial load
    UrlChanged(i64),
    /// Initial load: the URL is the source of truth
    RestoreFromUrl {
        graph_id: i64,
        node_id: Option<String>,
    },
}

/// Side effects a transition asks the driver to perform.
///
/// The coordinator itself never does I/O; returning effects as values keeps
/// every transition testable without a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    FetchExport(i64),
    SyncUrl(i64),
}

/// Owns "currently selected graph" and "currently selected tree node" and
/// reconciles them against URL state and tree rebuilds.
///
/// Reconciliation is one-directional: the URL drives selection on initial
/// load (`RestoreFromUrl`) and on later `UrlChanged` events; user-driven
/// `SelectGraph` writes back via `SyncUrl`. A `UrlChanged` transition never
/// emits `SyncUrl`, which is what rules out the URL↔selection feedback loop.
/// Lives for the whole session; there is no terminal state.
#[derive(Default)]
pub struct SelectionCoordinator {
    graphs: Vec<GraphSummary>,
    selected_graph_id: Option<i64>,
    selected_node_id: Option<String>,
    /// Node id to re-select once a tree for the current graph arrives
    restore_node_id: Option<String>,
    tree_version: u64,
    tree: Option<TreeNode>,
    load_error: Option<String>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the known graph list used to resolve URL-driven selections.
    pub fn set_graphs(&mut self, graphs: Vec<GraphSummary>) {
        self.graphs = graphs;
    }

    pub fn graphs(&self) -> &[GraphSummary] {
        &self.graphs
    }

    pub fn selected_graph_id(&self) -> Option<i64> {
        self.selected_graph_id
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    pub fn selected_graph(&self) -> Option<&GraphSummary> {
        let id = self.selected_graph_id?;
        self.graphs.iter().find(|graph| graph.graph_id == id)
    }

    /// Bumped on every graph switch; consumers holding node lookups tied to
    /// an older version must drop them.
    pub fn tree_version(&self) -> u64 {
        self.tree_version
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Apply one transition, returning the effects the driver must run.
    pub fn apply(&mut self, event: SelectionEvent) -> Vec<SelectionEffect> {
        match event {
            SelectionEvent::SelectGraph(graph_id) => self.switch_graph(graph_id, true),

            SelectionEvent::RestoreFromUrl { graph_id, node_id } => {
                if !self.is_known_graph(graph_id) {
                    debug!(graph_id, "Ignoring URL restore for unknown graph");
                    return Vec::new();
                }
                let effects = self.switch_graph(graph_id, false);
                self.restore_node_id = node_id;
                effects
            }

            SelectionEvent::UrlChanged(graph_id) => {
                if self.selected_graph_id == Some(graph_id) || !self.is_known_graph(graph_id) {
                    return Vec::new();
                }
                self.switch_graph(graph_id, false)
            }

            SelectionEvent::ExportLoaded { graph_id, tree } => {
                // Stale resolution: a later selection superseded this fetch
                if self.selected_graph_id != Some(graph_id) {
                    debug!(
                        graph_id,
                        current = ?self.selected_graph_id,
                        "Discarding stale export resolution"
                    );
                    return Vec::new();
                }

                if let Some(candidate) = self.restore_node_id.take() {
                    if tree.contains(&candidate) {
                        self.selected_node_id = Some(candidate);
                    }
                }
                self.load_error = None;
                self.tree = Some(tree);
                Vec::new()
            }

            SelectionEvent::LoadFailed { graph_id, message } => {
                if self.selected_graph_id == Some(graph_id) {
                    self.load_error = Some(message);
                }
                Vec::new()
            }

            SelectionEvent::SelectNode(node_id) => {
                self.restore_node_id = None;
                self.selected_node_id = Some(node_id);
                Vec::new()
            }

            SelectionEvent::ClearNode => {
                self.selected_node_id = None;
                Vec::new()
            }
        }
    }

    fn switch_graph(&mut self, graph_id: i64, sync_url: bool) -> Vec<SelectionEffect> {
        self.restore_node_id = self.selected_node_id.take();
        self.selected_graph_id = Some(graph_id);
        self.tree = None;
        self.load_error = None;
        self.tree_version += 1;

        // URL write-back precedes the fetch so a slow export resolution can
        // never clobber the URL of a newer selection
        let mut effects = Vec::new();
        if sync_url {
            effects.push(SelectionEffect::SyncUrl(graph_id));
        }
        effects.push(SelectionEffect::FetchExport(graph_id));
        effects
    }

    fn is_known_graph(&self, graph_id: i64) -> bool {
        self.graphs.iter().any(|graph| graph.graph_id == graph_id)
    }
}
