//! Integration tests for the selection session against a mock taxonomy API:
//! URL restore on startup, URL write-back, the rapid-switch fetch race, and
//! the search-clear selection restore.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use canopy::config::ApiConfig;
use canopy::session::{TaxonomySession, UrlState};
use canopy::{ExportCache, TaxonomyApiClient, TaxonomyService};

fn session_for(server: &MockServer) -> TaxonomySession {
    let config = ApiConfig {
        base_url: server.uri(),
        api_key: None,
        timeout_secs: 10,
    };
    let api = TaxonomyApiClient::new(&config).unwrap();
    TaxonomySession::new(TaxonomyService::new(api, ExportCache::new()))
}

fn graph_list() -> serde_json::Value {
    json!([
        { "graph_id": 1, "name": "Animals", "root_node_id": "root-1" },
        { "graph_id": 2, "name": "Plants", "root_node_id": "root-2" }
    ])
}

/// root-N -> branch-N -> leaf-N
fn export_payload(graph_id: i64) -> serde_json::Value {
    json!({
        "graph": {
            "graph_id": graph_id,
            "name": format!("Graph {graph_id}"),
            "root_node_id": format!("root-{graph_id}")
        },
        "nodes": [
            { "node_id": format!("root-{graph_id}"), "name": "Root" },
            { "node_id": format!("branch-{graph_id}"), "name": "Branch" },
            { "node_id": format!("leaf-{graph_id}"), "name": "Leaf" }
        ],
        "links": [
            { "from_node_id": format!("root-{graph_id}"), "to_node_id": format!("branch-{graph_id}") },
            { "from_node_id": format!("branch-{graph_id}"), "to_node_id": format!("leaf-{graph_id}") }
        ]
    })
}

async fn mount_list(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/taxonomy/graph/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(graph_list()))
        .mount(server)
        .await;
}

async fn mount_export(server: &MockServer, graph_id: i64, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path("/taxonomy/graph/export"))
        .and(query_param("graph_id", graph_id.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(export_payload(graph_id))
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_initialize_restores_graph_and_node_from_url() {
    let server = MockServer::start().await;
    mount_list(&server).await;
    mount_export(&server, 1, 0).await;

    let session = session_for(&server);
    let url = UrlState {
        graph_id: Some(1),
        node_id: Some("leaf-1".to_string()),
    };
    let graphs = session.initialize(&url).await.unwrap();

    assert_eq!(graphs.len(), 2);
    assert_eq!(session.selected_graph_id(), Some(1));
    assert_eq!(session.selected_node_id(), Some("leaf-1".to_string()));
    session.with_tree(|tree| {
        assert_eq!(tree.unwrap().id, "root-1");
    });
    // URL-driven restore must not write the URL back
    assert_eq!(session.synced_url(), None);
}

#[tokio::test]
async fn test_initialize_with_unknown_url_graph_selects_nothing() {
    let server = MockServer::start().await;
    mount_list(&server).await;

    let session = session_for(&server);
    let url = UrlState {
        graph_id: Some(404),
        node_id: None,
    };
    session.initialize(&url).await.unwrap();

    assert_eq!(session.selected_graph_id(), None);
    session.with_tree(|tree| assert!(tree.is_none()));
}

#[tokio::test]
async fn test_user_selection_writes_url_back() {
    let server = MockServer::start().await;
    mount_list(&server).await;
    mount_export(&server, 2, 0).await;

    let session = session_for(&server);
    session.initialize(&UrlState::default()).await.unwrap();
    session.select_graph(2).await.unwrap();

    assert_eq!(session.selected_graph_id(), Some(2));
    assert_eq!(session.synced_url(), Some(2));
}

#[tokio::test]
async fn test_url_change_to_same_graph_is_ignored() {
    let server = MockServer::start().await;
    mount_list(&server).await;
    mount_export(&server, 1, 0).await;

    let session = session_for(&server);
    session.initialize(&UrlState::default()).await.unwrap();
    session.select_graph(1).await.unwrap();
    let version = session.tree_version();

    session.handle_url_change(1).await.unwrap();
    assert_eq!(session.tree_version(), version);
}

#[tokio::test]
async fn test_rapid_graph_switch_later_selection_wins() {
    let server = MockServer::start().await;
    mount_list(&server).await;
    // Graph 1's export resolves long after graph 2's
    mount_export(&server, 1, 400).await;
    mount_export(&server, 2, 0).await;

    let session = Arc::new(session_for(&server));
    session.initialize(&UrlState::default()).await.unwrap();

    let slow = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.select_graph(1).await })
    };
    // Let SelectGraph(1) apply before the second selection supersedes it
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fast = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.select_graph(2).await })
    };

    slow.await.unwrap().unwrap();
    fast.await.unwrap().unwrap();

    // Graph 1 resolved last, but its resolution was stale and discarded
    assert_eq!(session.selected_graph_id(), Some(2));
    session.with_tree(|tree| {
        assert_eq!(tree.unwrap().id, "root-2");
    });
    assert_eq!(session.synced_url(), Some(2));
}

#[tokio::test]
async fn test_load_failure_is_surfaced_locally() {
    let server = MockServer::start().await;
    mount_list(&server).await;

    Mock::given(method("GET"))
        .and(path("/taxonomy/graph/export"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.initialize(&UrlState::default()).await.unwrap();

    let result = session.select_graph(1).await;
    assert!(result.is_err());
    assert!(session.load_error().unwrap().contains("502"));
    session.with_tree(|tree| assert!(tree.is_none()));
}

#[tokio::test]
async fn test_search_clear_restores_selected_node() {
    let server = MockServer::start().await;
    mount_list(&server).await;
    mount_export(&server, 1, 0).await;

    let session = session_for(&server);
    session.initialize(&UrlState::default()).await.unwrap();
    session.select_graph(1).await.unwrap();
    session.select_node("leaf-1");

    // A query that hides the selection's whole ancestor chain
    let during = session.apply_filter("no such name").unwrap();
    assert!(during.matches.is_empty());
    assert_eq!(session.selected_node_id(), Some("leaf-1".to_string()));

    // Clearing the query reveals the selection again, chain expanded
    let after = session.apply_filter("").unwrap();
    assert_eq!(
        after.reveal,
        Some(vec![
            "root-1".to_string(),
            "branch-1".to_string(),
            "leaf-1".to_string()
        ])
    );
    assert!(after.open.contains("root-1"));
    assert!(after.open.contains("branch-1"));
    assert_eq!(session.selected_node_id(), Some("leaf-1".to_string()));
}

#[tokio::test]
async fn test_graph_switch_uses_cache_on_return() {
    let server = MockServer::start().await;
    mount_list(&server).await;

    Mock::given(method("GET"))
        .and(path("/taxonomy/graph/export"))
        .and(query_param("graph_id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(export_payload(1)))
        .expect(1)
        .mount(&server)
        .await;
    mount_export(&server, 2, 0).await;

    let session = session_for(&server);
    session.initialize(&UrlState::default()).await.unwrap();

    // 1 -> 2 -> 1: the return to graph 1 is served from the export cache
    session.select_graph(1).await.unwrap();
    session.select_graph(2).await.unwrap();
    session.select_graph(1).await.unwrap();

    assert_eq!(session.selected_graph_id(), Some(1));
    session.with_tree(|tree| {
        assert_eq!(tree.unwrap().id, "root-1");
    });
}
