use std::collections::HashSet;

use super::TreeNode;

/// Description of how a live text query maps onto a materialized tree.
///
/// The underlying tree is never mutated: the view only names which node ids
/// match and which ancestor chains must stay expanded so every match is
/// visible. `reveal` carries the scroll/expand target when a cleared query
/// should bring the previously selected node back into view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub query: String,

    /// Ids whose name matches the query (case-insensitive substring)
    pub matches: HashSet<String>,

    /// Ancestor ids that must remain expanded to reveal the matches (or, on
    /// a clear transition, the restored selection)
    pub open: HashSet<String>,

    /// Root-to-node path of the selection to scroll back into view; only set
    /// when the query transitions from non-empty to empty while a node is
    /// selected and still present in the tree
    pub reveal: Option<Vec<String>>,
}

impl FilteredView {
    pub fn is_filtering(&self) -> bool {
        !self.query.is_empty()
    }
}

/// Stateful adapter over the tree for live search.
///
/// Holds only the previous query string, enough to detect the non-empty →
/// empty transition that restores the selected node into view instead of
/// resetting user context.
#[derive(Debug, Clone, Default)]
pub struct TreeFilter {
    last_query: String,
}

impl TreeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the filtered view for `query` against `tree`.
    ///
    /// `selected_node_id` is the coordinator's current selection; it is never
    /// changed here, only revealed again when the query clears.
    pub fn apply(
        &mut self,
        tree: &TreeNode,
        query: &str,
        selected_node_id: Option<&str>,
    ) -> FilteredView {
        let query = query.trim();
        let cleared = !self.last_query.is_empty() && query.is_empty();
        self.last_query = query.to_string();

        let mut view = FilteredView {
            query: query.to_string(),
            ..FilteredView::default()
        };

        if !query.is_empty() {
            let needle = query.to_lowercase();
            let mut ancestors = Vec::new();
            collect_matches(tree, &needle, &mut ancestors, &mut view);
            return view;
        }

        if cleared {
            if let Some(path) = selected_node_id.and_then(|id| tree.path_to(id)) {
                // Everything above the selection stays expanded
                for ancestor in &path[..path.len() - 1] {
                    view.open.insert(ancestor.clone());
                }
                view.reveal = Some(path);
            }
        }

        view
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }
}

fn collect_matches(
    node: &TreeNode,
    needle: &str,
    ancestors: &mut Vec<String>,
    view: &mut FilteredView,
) {
    if node.record.name.to_lowercase().contains(needle) {
        view.matches.insert(node.id.clone());
        for ancestor in ancestors.iter() {
            view.open.insert(ancestor.clone());
        }
    }

    ancestors.push(node.id.clone());
    for child in &node.children {
        collect_matches(child, needle, ancestors, view);
    }
    ancestors.pop();
}
