use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::{GraphExport, NodeRecord};

/// Thread-safe in-memory store of fetched graph exports, keyed by graph id.
///
/// Uses the Arc<Mutex<>> pattern for safe concurrent access. Unbounded with
/// no TTL or eviction: trees are small and usage is session-scoped. Readers
/// receive `Arc<GraphExport>` snapshots, so a cached export is never observed
/// half-written. Construct one per application session and pass clones around;
/// `clear()` is the explicit cache-busting hook.
#[derive(Clone, Default)]
pub struct ExportCache {
    exports: Arc<Mutex<HashMap<i64, Arc<GraphExport>>>>,
}

impl ExportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve the cached export for a graph, if present.
    pub fn get(&self, graph_id: i64) -> Option<Arc<GraphExport>> {
        let exports = self.exports.lock().unwrap();
        exports.get(&graph_id).cloned()
    }

    /// Store an export. An existing entry for the same graph is replaced;
    /// concurrent writers race benignly since payloads for the same id are
    /// identical at a point in time.
    pub fn put(&self, graph_id: i64, export: GraphExport) -> Arc<GraphExport> {
        let export = Arc::new(export);
        let mut exports = self.exports.lock().unwrap();
        exports.insert(graph_id, Arc::clone(&export));
        export
    }

    /// Drop every cached export.
    pub fn clear(&self) {
        let mut exports = self.exports.lock().unwrap();
        exports.clear();
    }

    pub fn len(&self) -> usize {
        self.exports.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.lock().unwrap().is_empty()
    }

    /// Replace a single node record inside a cached export.
    ///
    /// Keeps the cache consistent after a successful node update without
    /// refetching the whole export. The stored snapshot is immutable, so the
    /// export is cloned, patched, and swapped in atomically. Returns false if
    /// the graph is not cached or the node is not part of the export.
    pub fn patch_node(&self, graph_id: i64, record: &NodeRecord) -> bool {
        let mut exports = self.exports.lock().unwrap();
        let Some(current) = exports.get(&graph_id) else {
            return false;
        };

        let Some(position) = current
            .nodes
            .iter()
            .position(|node| node.node_id == record.node_id)
        else {
            return false;
        };

        let mut patched = (**current).clone();
        patched.nodes[position] = record.clone();
        exports.insert(graph_id, Arc::new(patched));
        true
    }
}
