use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Summary row returned by the graph list endpoint.
///
/// Created server-side and fetched as a read-only list; the client never
/// mutates these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphSummary {
    /// Unique graph identifier
    pub graph_id: i64,

    /// Topology the graph belongs to (present in export payloads)
    #[serde(default)]
    pub topology_id: Option<i64>,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub notes: Option<String>,

    /// Node id of the designated root, the single entry point of the tree
    pub root_node_id: String,

    #[serde(default)]
    pub inserted_datetime: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_datetime: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_by: Option<String>,
}

/// A single taxonomy node as stored server-side.
///
/// `metadata` is a serialized JSON object (optionally carrying `image_url`);
/// see [`crate::models::extract_image_url`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    /// UUID, unique within a graph
    pub node_id: String,

    #[serde(default)]
    pub node_type_id: Option<i64>,

    #[serde(default)]
    pub graph_id: Option<i64>,

    /// External source identifier, usable with graph_id as an alternate key
    #[serde(default)]
    pub source_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub notes: Option<String>,

    /// Serialized JSON; kept raw so malformed payloads stay displayable
    #[serde(default)]
    pub metadata: Option<String>,

    #[serde(default)]
    pub inserted_datetime: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_datetime: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_by: Option<String>,
}

/// A directed parent→child edge in an export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkRecord {
    #[serde(default)]
    pub link_id: Option<String>,

    #[serde(default)]
    pub link_type_id: Option<i64>,

    pub from_node_id: String,

    pub to_node_id: String,

    /// Present on the wire but not used as a child sort key; input order of
    /// the links array is preserved during materialization
    #[serde(default)]
    pub link_order: Option<i64>,

    #[serde(default)]
    pub metadata: Option<String>,

    #[serde(default)]
    pub valid_from_datetime: Option<NaiveDateTime>,

    #[serde(default)]
    pub valid_until_datetime: Option<NaiveDateTime>,

    /// Disabled links never produce parent/child edges
    #[serde(default)]
    pub is_disabled: bool,
}

/// Full flat payload needed to reconstruct a graph's tree client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphExport {
    pub graph: GraphSummary,
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

impl GraphExport {
    /// Look up a node by id.
    pub fn find_node(&self, node_id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|node| node.node_id == node_id)
    }

    /// The node designated by `graph.root_node_id`, if it exists in `nodes`.
    pub fn root_node(&self) -> Option<&NodeRecord> {
        self.find_node(&self.graph.root_node_id)
    }
}

/// Banner/graph association row from the banner-graph endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BannerGraphRecord {
    pub banner_graph_id: i64,
    pub banner_id: String,
    pub tenant_id: String,
    pub banner_name: String,
    pub graph_id: i64,
    pub graph_name: String,

    #[serde(default)]
    pub node_id: Option<String>,

    pub graph_purpose_id: i64,
    pub graph_purpose_name: String,
    pub graph_status_id: i64,
    pub graph_status_name: String,

    #[serde(default)]
    pub published_datetime: Option<NaiveDateTime>,

    #[serde(default)]
    pub inserted_datetime: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_datetime: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Sort a graph list alphabetically by name, case-insensitive.
///
/// The list endpoint returns graphs in server order; display consumers want
/// them alphabetized.
pub fn sorted_by_name(mut graphs: Vec<GraphSummary>) -> Vec<GraphSummary> {
    graphs.sort_by_key(|graph| graph.name.to_lowercase());
    graphs
}
