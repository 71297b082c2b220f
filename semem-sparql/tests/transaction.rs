//! Transaction atomicity and single-writer enforcement, against a mocked
//! SPARQL endpoint.

use semem_core::error::Error;
use semem_sparql::cache::CacheLayer;
use semem_sparql::client::{Endpoints, SparqlClient};
use semem_sparql::transaction::TransactionManager;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoints(base: &str) -> Endpoints {
    Endpoints {
        query: format!("{base}/query"),
        update: format!("{base}/update"),
        gsp: None,
    }
}

fn ask_responds(backup_exists: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(
        serde_json::json!({ "boolean": backup_exists }).to_string(),
    )
}

#[tokio::test]
async fn begin_then_commit_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/query")).respond_with(ask_responds(false)).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = SparqlClient::new(endpoints(&server.uri()), None, None);
    let manager = TransactionManager::new();

    manager.begin(&client, "http://g/main", "http://g/main/__tx__backup").await.unwrap();
    assert!(manager.is_open());

    manager.commit(&client).await.unwrap();
    assert!(!manager.is_open());
}

#[tokio::test]
async fn begin_twice_fails_with_transaction_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/query")).respond_with(ask_responds(false)).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = SparqlClient::new(endpoints(&server.uri()), None, None);
    let manager = TransactionManager::new();

    manager.begin(&client, "http://g/main", "http://g/main/__tx__backup").await.unwrap();
    let second = manager.begin(&client, "http://g/main", "http://g/main/__tx__backup").await;

    assert!(matches!(second, Err(Error::TransactionBusy)));
}

#[tokio::test]
async fn begin_fails_with_stale_backup_when_backup_graph_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/query")).respond_with(ask_responds(true)).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = SparqlClient::new(endpoints(&server.uri()), None, None);
    let manager = TransactionManager::new();

    let result = manager.begin(&client, "http://g/main", "http://g/main/__tx__backup").await;

    assert!(matches!(result, Err(Error::StaleBackup(_))));
    assert!(!manager.is_open());
}

#[tokio::test]
async fn rollback_invalidates_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).and(path("/query")).respond_with(ask_responds(false)).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = SparqlClient::new(endpoints(&server.uri()), None, None);
    let manager = TransactionManager::new();
    let cache = CacheLayer::new(10, 10_000);

    cache.put("SELECT ?s", serde_json::Value::Bool(true));
    manager.begin(&client, "http://g/main", "http://g/main/__tx__backup").await.unwrap();
    manager.rollback(&client, &cache).await.unwrap();

    assert!(!manager.is_open());
    assert!(cache.get("SELECT ?s").is_none());
}

#[tokio::test]
async fn commit_without_open_transaction_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = SparqlClient::new(endpoints(&server.uri()), None, None);
    let manager = TransactionManager::new();

    let result = manager.commit(&client).await;
    assert!(matches!(result, Err(Error::TransactionBusy)));
}
