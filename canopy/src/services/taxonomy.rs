use std::sync::Arc;

use tracing::debug;

use crate::cache::ExportCache;
use crate::client::{NodeQuery, TaxonomyApiClient};
use crate::error::{CanopyError, Result};
use crate::models::{BannerGraphRecord, GraphExport, GraphSummary, NodeRecord};

/// Fetch service over the taxonomy API: consults the export cache, validates
/// exports before they are cached, and keeps cached records consistent after
/// node updates.
///
/// Concurrent `fetch_export` calls for the same graph are not de-duplicated;
/// both populate the cache and the last write wins, which is idempotent since
/// same-id payloads are identical at a point in time.
#[derive(Clone)]
pub struct TaxonomyService {
    api: TaxonomyApiClient,
    cache: ExportCache,
}

impl TaxonomyService {
    pub fn new(api: TaxonomyApiClient, cache: ExportCache) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &ExportCache {
        &self.cache
    }

    pub async fn list_graphs(&self) -> Result<Vec<GraphSummary>> {
        self.api.list_graphs().await
    }

    /// Fetch a graph's export, serving repeated calls from the cache.
    ///
    /// On a miss the export is validated before caching: an export whose
    /// `root_node_id` matches no node fails with `RootNotFound` here, so a
    /// bad payload never reaches the materializer ambiguously and is never
    /// cached.
    pub async fn fetch_export(&self, graph_id: i64) -> Result<Arc<GraphExport>> {
        if let Some(cached) = self.cache.get(graph_id) {
            debug!(graph_id, "Export cache hit");
            return Ok(cached);
        }

        let export = self.api.fetch_export(graph_id).await?;
        if export.root_node().is_none() {
            return Err(CanopyError::RootNotFound {
                graph_id,
                root_node_id: export.graph.root_node_id.clone(),
            });
        }

        debug!(
            graph_id,
            nodes = export.nodes.len(),
            links = export.links.len(),
            "Export fetched and cached"
        );
        Ok(self.cache.put(graph_id, export))
    }

    pub async fn get_node(&self, query: &NodeQuery) -> Result<NodeRecord> {
        self.api.get_node(query).await
    }

    /// Update a node and patch the cached export so the edit is visible
    /// without a refetch.
    pub async fn update_node(&self, record: &NodeRecord) -> Result<NodeRecord> {
        let updated = self.api.update_node(record).await?;

        if let Some(graph_id) = updated.graph_id.or(record.graph_id) {
            if self.cache.patch_node(graph_id, &updated) {
                debug!(graph_id, node_id = %updated.node_id, "Patched cached export");
            }
        }

        Ok(updated)
    }

    pub async fn fetch_banner_graphs(
        &self,
        graph_id: Option<i64>,
        graph_purpose_id: Option<i64>,
    ) -> Result<Vec<BannerGraphRecord>> {
        self.api.fetch_banner_graphs(graph_id, graph_purpose_id).await
    }

    pub async fn upload_image(&self, file_name: &str, image_bytes: &[u8]) -> Result<String> {
        self.api.upload_image(file_name, image_bytes).await
    }
}
