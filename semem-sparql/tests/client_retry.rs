//! `SparqlClient` retry-on-transient-failure and error classification,
//! against a mocked SPARQL endpoint.

use semem_core::error::Error;
use semem_sparql::client::{Endpoints, SparqlClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoints(base: &str) -> Endpoints {
    Endpoints {
        query: format!("{base}/query"),
        update: format!("{base}/update"),
        gsp: None,
    }
}

#[tokio::test]
async fn retries_transient_5xx_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"results\":{\"bindings\":[]}}"))
        .mount(&server)
        .await;

    let client = SparqlClient::new(endpoints(&server.uri()), None, None);
    let result = client.execute_query("ASK { ?s ?p ?o }").await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn with_retry_policy_honors_configured_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = SparqlClient::with_retry_policy(endpoints(&server.uri()), None, None, 2, 1);
    let result = client.execute_query("ASK { ?s ?p ?o }").await;

    assert!(matches!(result, Err(Error::TransientNetwork(_))));
}

#[tokio::test]
async fn surfaces_auth_failure_without_retrying() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = SparqlClient::new(endpoints(&server.uri()), None, None);
    let result = client.execute_query("ASK { ?s ?p ?o }").await;

    assert!(matches!(result, Err(Error::AuthFailed(_))));
}

#[tokio::test]
async fn surfaces_bad_request_without_retrying() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = SparqlClient::new(endpoints(&server.uri()), None, None);
    let result = client.execute_update("INSERT DATA { <a> <b> <c> }").await;

    assert!(matches!(result, Err(Error::BadRequest(_))));
}
