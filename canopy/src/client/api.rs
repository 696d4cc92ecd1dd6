use std::time::Duration;

use base64::Engine;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Response,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{CanopyError, Result};
use crate::models::{BannerGraphRecord, GraphExport, GraphSummary, NodeRecord};

/// Identifying parameters for a node lookup.
///
/// A node is addressed either directly by id or by its source id within a
/// graph; requests with neither set are unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeQuery {
    ById { node_id: String },
    BySource { graph_id: i64, source_id: String },
}

impl NodeQuery {
    /// Build a query from loose optional parameters, failing fast when
    /// neither identifying set is supplied.
    pub fn from_parts(
        node_id: Option<String>,
        graph_id: Option<i64>,
        source_id: Option<String>,
    ) -> Result<Self> {
        if let Some(node_id) = node_id {
            return Ok(Self::ById { node_id });
        }
        match (graph_id, source_id) {
            (Some(graph_id), Some(source_id)) => Ok(Self::BySource {
                graph_id,
                source_id,
            }),
            _ => Err(CanopyError::Validation(
                "Either node_id or both graph_id and source_id must be provided".to_string(),
            )),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::ById { node_id } => vec![("node_id", node_id.clone())],
            Self::BySource {
                graph_id,
                source_id,
            } => vec![
                ("graph_id", graph_id.to_string()),
                ("source_id", source_id.clone()),
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageUploadRequest<'a> {
    file_name: &'a str,
    image_data: String,
    image_type: &'static str,
    preserve_filename: bool,
}

#[derive(Debug, Deserialize)]
struct ImageUploadResponse {
    #[serde(default)]
    image_url: Option<String>,
}

/// Raw REST client for the upstream taxonomy API.
///
/// One method per endpoint, no caching or validation beyond the wire
/// contract; [`crate::services::TaxonomyService`] layers the export cache and
/// root checks on top. Failures are never retried here; non-2xx responses
/// surface as `Server`, transport failures as `Http`.
#[derive(Clone)]
pub struct TaxonomyApiClient {
    client: Client,
    base_url: String,
}

impl TaxonomyApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        // Validate early so a bad base URL fails at construction, not on the
        // first request
        Url::parse(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref api_key) = config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                    CanopyError::Validation(format!("Invalid API key header: {e}"))
                })?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /taxonomy/graph/list`
    pub async fn list_graphs(&self) -> Result<Vec<GraphSummary>> {
        let url = format!("{}/taxonomy/graph/list", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /taxonomy/graph/export?graph_id={id}`
    ///
    /// Returns the raw export as the server sent it; root validation happens
    /// in the fetch service before anything is cached.
    pub async fn fetch_export(&self, graph_id: i64) -> Result<GraphExport> {
        let url = format!("{}/taxonomy/graph/export", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("graph_id", graph_id)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /taxonomy/node/get` by node id or (graph id, source id)
    pub async fn get_node(&self, query: &NodeQuery) -> Result<NodeRecord> {
        let url = format!("{}/taxonomy/node/get", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&query.params())
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /taxonomy/node/update` with the full record.
    ///
    /// The server echoes the updated record; an acknowledgement with no body
    /// is a save failure (`EmptyResponse`) so the caller can keep the edit in
    /// an unsaved state and retry.
    pub async fn update_node(&self, record: &NodeRecord) -> Result<NodeRecord> {
        let url = format!("{}/taxonomy/node/update", self.base_url);
        tracing::debug!(node_id = %record.node_id, "Updating node");

        let response = self.client.post(&url).json(record).send().await?;
        let body = Self::check(response).await?.text().await?;

        if body.trim().is_empty() {
            return Err(CanopyError::EmptyResponse(format!(
                "Node update for {} acknowledged with no body",
                record.node_id
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// `GET /taxonomy/banner-graph/get?graph_id={id}&graph_purpose_id={pid}`
    pub async fn fetch_banner_graphs(
        &self,
        graph_id: Option<i64>,
        graph_purpose_id: Option<i64>,
    ) -> Result<Vec<BannerGraphRecord>> {
        let url = format!("{}/taxonomy/banner-graph/get", self.base_url);

        let mut params = Vec::new();
        if let Some(graph_id) = graph_id {
            params.push(("graph_id", graph_id.to_string()));
        }
        if let Some(purpose_id) = graph_purpose_id {
            params.push(("graph_purpose_id", purpose_id.to_string()));
        }

        let response = self.client.get(&url).query(&params).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /image/upload` with base64 image data.
    ///
    /// Returns the hosted image URL, suitable for storing in node metadata.
    pub async fn upload_image(&self, file_name: &str, image_bytes: &[u8]) -> Result<String> {
        let url = format!("{}/image/upload", self.base_url);
        let request = ImageUploadRequest {
            file_name,
            image_data: base64::engine::general_purpose::STANDARD.encode(image_bytes),
            image_type: "categories",
            preserve_filename: true,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let body: ImageUploadResponse = Self::check(response).await?.json().await?;

        body.image_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                CanopyError::EmptyResponse("No image URL in upload response".to_string())
            })
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Taxonomy API error: {}", body);
        Err(CanopyError::Server {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    fn test_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_node_query_by_id() {
        let query =
            NodeQuery::from_parts(Some("n-1".to_string()), None, None).unwrap();
        assert_eq!(
            query,
            NodeQuery::ById {
                node_id: "n-1".to_string()
            }
        );
        assert_eq!(query.params(), vec![("node_id", "n-1".to_string())]);
    }

    #[test]
    fn test_node_query_by_source() {
        let query =
            NodeQuery::from_parts(None, Some(100), Some("src-9".to_string())).unwrap();
        assert_eq!(
            query.params(),
            vec![
                ("graph_id", "100".to_string()),
                ("source_id", "src-9".to_string())
            ]
        );
    }

    #[test]
    fn test_node_query_requires_identifying_params() {
        // Neither set, and graph_id alone, must both fail fast
        assert!(NodeQuery::from_parts(None, None, None).is_err());
        assert!(NodeQuery::from_parts(None, Some(100), None).is_err());
        assert!(NodeQuery::from_parts(None, None, Some("src".to_string())).is_err());
    }

    #[test]
    fn test_node_id_wins_over_source_pair() {
        let query = NodeQuery::from_parts(
            Some("n-1".to_string()),
            Some(100),
            Some("src".to_string()),
        )
        .unwrap();
        assert!(matches!(query, NodeQuery::ById { .. }));
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        let result = TaxonomyApiClient::new(&test_config("not a url"));
        assert!(matches!(result, Err(CanopyError::UrlParse(_))));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client =
            TaxonomyApiClient::new(&test_config("http://localhost:8080/api/")).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_image_upload_request_shape() {
        let request = ImageUploadRequest {
            file_name: "apples.png",
            image_data: base64::engine::general_purpose::STANDARD.encode(b"fake-bytes"),
            image_type: "categories",
            preserve_filename: true,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["file_name"], "apples.png");
        assert_eq!(json["image_type"], "categories");
        assert_eq!(json["preserve_filename"], true);
        assert_eq!(
            json["image_data"],
            base64::engine::general_purpose::STANDARD.encode(b"fake-bytes")
        );
    }
}
