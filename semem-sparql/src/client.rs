//! Authenticated SPARQL 1.1 Query/Update HTTP client with endpoint discovery
//! and retry-on-transient-failure.

use reqwest::{Client, StatusCode};
use semem_core::constants::defaults;
use semem_core::error::{Error, Result};
use tracing::{debug, warn};

/// The three endpoint URLs a SPARQL store exposes.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// SPARQL 1.1 Query endpoint.
    pub query: String,
    /// SPARQL 1.1 Update endpoint.
    pub update: String,
    /// Graph Store Protocol endpoint, if distinct.
    pub gsp: Option<String>,
}

/// Authenticated HTTP client for SPARQL Query/Update.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    http: Client,
    endpoints: Endpoints,
    user: Option<String>,
    password: Option<String>,
    max_attempts: u32,
    backoff_ms: u64,
}

impl SparqlClient {
    /// Construct a client for `endpoints`, optionally with basic-auth
    /// credentials, using the default retry policy.
    #[must_use]
    pub fn new(endpoints: Endpoints, user: Option<String>, password: Option<String>) -> Self {
        Self::with_retry_policy(
            endpoints,
            user,
            password,
            defaults::RETRY_MAX_ATTEMPTS,
            defaults::RETRY_BACKOFF_MS,
        )
    }

    /// Construct a client with an explicit retry policy, as configured via
    /// [`semem_core::config::SememConfig`].
    #[must_use]
    pub fn with_retry_policy(
        endpoints: Endpoints,
        user: Option<String>,
        password: Option<String>,
        max_attempts: u32,
        backoff_ms: u64,
    ) -> Self {
        Self {
            http: Client::new(),
            endpoints,
            user,
            password,
            max_attempts,
            backoff_ms,
        }
    }

    /// Probe `base/<dataset>` and `base/<dataset>/data` with `ASK { ?s ?p
    /// ?o }` to discover a store's query/update/gsp endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransientNetwork`] if neither candidate responds, or
    /// the error classification from [`Self::execute_query`] otherwise.
    pub async fn discover(http: &Client, base: &str, dataset: &str) -> Result<Endpoints> {
        let query = format!("{base}/{dataset}");
        let update = query.clone();
        let gsp = format!("{base}/{dataset}/data");

        let probe = "ASK { ?s ?p ?o }";
        let resp = http
            .post(&query)
            .header("Accept", "application/sparql-results+json")
            .form(&[("query", probe)])
            .send()
            .await
            .map_err(|e| Error::TransientNetwork(e.to_string()))?;
        classify_status(resp.status())?;

        Ok(Endpoints {
            query,
            update,
            gsp: Some(gsp),
        })
    }

    /// Execute a SPARQL Query, retrying transient failures with exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFailed`], [`Error::BadRequest`],
    /// [`Error::MalformedResponse`], or [`Error::TransientNetwork`] (after
    /// exhausting retries).
    pub async fn execute_query(&self, query: &str) -> Result<String> {
        self.execute(&self.endpoints.query.clone(), query, "application/sparql-query", "application/sparql-results+json")
            .await
    }

    /// Execute a SPARQL Update, retrying transient failures with exponential backoff.
    ///
    /// # Errors
    ///
    /// See [`Self::execute_query`].
    pub async fn execute_update(&self, update: &str) -> Result<String> {
        self.execute(&self.endpoints.update.clone(), update, "application/sparql-update", "text/plain")
            .await
    }

    async fn execute(&self, url: &str, body: &str, content_type: &str, accept: &str) -> Result<String> {
        let mut attempt = 0;
        let mut delay = self.backoff_ms;

        loop {
            attempt += 1;
            let mut request = self
                .http
                .post(url)
                .header("Content-Type", content_type)
                .header("Accept", accept)
                .body(body.to_string());

            if let Some(user) = &self.user {
                request = request.basic_auth(user, self.password.clone());
            }

            let result = request.send().await;

            match result {
                Ok(resp) => match classify_status(resp.status()) {
                    Ok(()) => {
                        return resp
                            .text()
                            .await
                            .map_err(|e| Error::MalformedResponse(e.to_string()));
                    }
                    Err(Error::TransientNetwork(reason)) if attempt < self.max_attempts => {
                        warn!(attempt, reason, "transient SPARQL failure, retrying");
                        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                        delay = (delay as f64 * defaults::RETRY_BACKOFF_MULTIPLIER) as u64;
                        continue;
                    }
                    Err(other) => return Err(other),
                },
                Err(e) if attempt < self.max_attempts => {
                    debug!(attempt, error = %e, "SPARQL request error, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                    delay = (delay as f64 * defaults::RETRY_BACKOFF_MULTIPLIER) as u64;
                    continue;
                }
                Err(e) => return Err(Error::TransientNetwork(e.to_string())),
            }
        }
    }
}

/// Classify an HTTP status into a retryable/terminal error outcome.
fn classify_status(status: StatusCode) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    if status.is_server_error() {
        return Err(Error::TransientNetwork(format!("server error: {status}")));
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::AuthFailed(status.to_string())),
        _ => Err(Error::BadRequest(status.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_status_maps_5xx_to_transient() {
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(Error::TransientNetwork(_))
        ));
    }

    #[test]
    fn classify_status_maps_401_and_403_to_auth_failed() {
        assert!(matches!(classify_status(StatusCode::UNAUTHORIZED), Err(Error::AuthFailed(_))));
        assert!(matches!(classify_status(StatusCode::FORBIDDEN), Err(Error::AuthFailed(_))));
    }

    #[test]
    fn classify_status_maps_other_4xx_to_bad_request() {
        assert!(matches!(classify_status(StatusCode::NOT_FOUND), Err(Error::BadRequest(_))));
    }

    #[test]
    fn classify_status_accepts_2xx() {
        assert!(classify_status(StatusCode::OK).is_ok());
    }
}
