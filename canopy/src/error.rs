use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanopyError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Root node {root_node_id} not found in export of graph {graph_id}")]
    RootNotFound { graph_id: i64, root_node_id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, CanopyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_display() {
        let err = CanopyError::RootNotFound {
            graph_id: 42,
            root_node_id: "abc-123".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Root node abc-123 not found in export of graph 42"
        );
    }

    #[test]
    fn test_server_error_display() {
        let err = CanopyError::Server {
            status: 503,
            body: "upstream unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("upstream unavailable"));
    }
}
