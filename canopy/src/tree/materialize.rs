use std::collections::{HashMap, HashSet};

use crate::error::{CanopyError, Result};
use crate::models::{GraphExport, NodeRecord};

/// A node in the materialized tree.
///
/// The one canonical shape handed to renderers: the node's own record sits
/// under `record`, never nested a second time. Renderers hold a read
/// reference and never mutate it; edits go through the fetch service and
/// produce a re-materialization or a record patch.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Equal to `record.node_id`
    pub id: String,
    pub children: Vec<TreeNode>,
    pub record: NodeRecord,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first search for the first occurrence of a node id.
    ///
    /// In a DAG export the same node can occur at several positions; node
    /// identity, not structural position, is canonical for selection, so the
    /// first occurrence is as good as any.
    pub fn find(&self, node_id: &str) -> Option<&TreeNode> {
        if self.id == node_id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(node_id))
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.find(node_id).is_some()
    }

    /// Total occurrence count, the root included. Multi-parent nodes count
    /// once per occurrence.
    pub fn occurrence_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TreeNode::occurrence_count)
            .sum::<usize>()
    }

    /// The set of distinct node ids reachable in this tree.
    pub fn reachable_ids(&self) -> HashSet<&str> {
        let mut ids = HashSet::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids<'a>(&'a self, ids: &mut HashSet<&'a str>) {
        ids.insert(self.id.as_str());
        for child in &self.children {
            child.collect_ids(ids);
        }
    }

    /// Ids from the root down to the first occurrence of `node_id`,
    /// inclusive. None when the node is not in the tree.
    pub fn path_to(&self, node_id: &str) -> Option<Vec<String>> {
        if self.id == node_id {
            return Some(vec![self.id.clone()]);
        }
        for child in &self.children {
            if let Some(mut path) = child.path_to(node_id) {
                path.insert(0, self.id.clone());
                return Some(path);
            }
        }
        None
    }
}

/// Convert a flat nodes+links export into a rooted tree.
///
/// Pure over its input and deterministic given identical input ordering:
/// children appear in the links array's input order (`link_order` is carried
/// on the wire but not consulted). Permissive by policy: disabled links and
/// links referencing unknown node ids are skipped, so partial or stale
/// exports still materialize. Nodes unreachable from the root are excluded.
/// A node targeted by several enabled links materializes under each parent.
///
/// Fails with `RootNotFound` when no node matches `graph.root_node_id`.
pub fn materialize(export: &GraphExport) -> Result<TreeNode> {
    let records: HashMap<&str, &NodeRecord> = export
        .nodes
        .iter()
        .map(|node| (node.node_id.as_str(), node))
        .collect();

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for link in &export.links {
        if link.is_disabled {
            continue;
        }
        let from = link.from_node_id.as_str();
        let to = link.to_node_id.as_str();
        if !records.contains_key(from) || !records.contains_key(to) {
            continue;
        }
        adjacency.entry(from).or_default().push(to);
    }

    let root_id = export.graph.root_node_id.as_str();
    if !records.contains_key(root_id) {
        return Err(CanopyError::RootNotFound {
            graph_id: export.graph.graph_id,
            root_node_id: export.graph.root_node_id.clone(),
        });
    }

    let mut ancestry = Vec::new();
    Ok(build_subtree(root_id, &records, &adjacency, &mut ancestry))
}

fn build_subtree(
    node_id: &str,
    records: &HashMap<&str, &NodeRecord>,
    adjacency: &HashMap<&str, Vec<&str>>,
    ancestry: &mut Vec<String>,
) -> TreeNode {
    ancestry.push(node_id.to_string());

    let children = adjacency
        .get(node_id)
        .map(|child_ids| {
            // A link placing a node on its own ancestor path is
            // unresolvable in a tree; skipped like other bad links.
            let resolvable: Vec<&str> = child_ids
                .iter()
                .filter(|child_id| !ancestry.iter().any(|a| a == *child_id))
                .copied()
                .collect();
            resolvable
                .into_iter()
                .map(|child_id| build_subtree(child_id, records, adjacency, ancestry))
                .collect()
        })
        .unwrap_or_default();

    ancestry.pop();

    TreeNode {
        id: node_id.to_string(),
        children,
        record: (*records[node_id]).clone(),
    }
}
