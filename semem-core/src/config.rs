//! Process-wide configuration.
//!
//! The library crates never read files themselves — a host loads this via
//! `toml::from_str` (or any other `serde::Deserialize` source) and passes it
//! down to the components it constructs.

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// A single SPARQL endpoint's query/update/graph-store URLs and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparqlEndpointConfig {
    /// SPARQL 1.1 Query endpoint URL.
    pub query: String,
    /// SPARQL 1.1 Update endpoint URL.
    pub update: String,
    /// Graph Store Protocol endpoint URL, if distinct from `query`/`update`.
    pub gsp: Option<String>,
    /// Basic-auth username, if the endpoint requires authentication.
    pub user: Option<String>,
    /// Basic-auth password, if the endpoint requires authentication.
    pub password: Option<String>,
}

/// Recognized configuration options, with sensible defaults for every field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SememConfig {
    /// Expected embedding dimension for the configured model.
    pub embedding_dimension: usize,
    /// Identifier of the embedding model in use.
    pub embedding_model: String,
    /// Identifier of the chat/completion model in use.
    pub chat_model: String,

    /// `access_count` threshold above which an interaction is promoted to long-term.
    pub promote_threshold: u32,
    /// Per-second (after /1000 on ms age) exponential decay rate.
    pub decay_rate: f64,
    /// Multiplier applied to `decay_factor` on a retrieval miss.
    pub fade_factor: f64,

    /// Minimum adjusted similarity for session-cache hits.
    pub similarity_threshold_session: f32,
    /// Minimum adjusted similarity for persistent-store hits.
    pub similarity_threshold_persistent: f32,

    /// Token budget for `ContextWindow::build`.
    pub context_max_tokens: usize,
    /// Fraction of adjacent sliding-window chunks that overlap.
    pub context_overlap_ratio: f32,

    /// Whether the SPARQL result cache is enabled.
    pub cache_enabled: bool,
    /// Cache entry time-to-live, in milliseconds.
    pub cache_ttl_ms: u64,
    /// Maximum number of cached query results.
    pub cache_max_size: usize,

    /// Configured SPARQL endpoints.
    pub sparql_endpoints: Vec<SparqlEndpointConfig>,
    /// IRI of the named graph holding persisted memory state.
    pub memory_graph_iri: String,

    /// Maximum retry attempts for transient SPARQL failures.
    pub retry_max_attempts: u32,
    /// Base backoff delay between retries, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for SememConfig {
    fn default() -> Self {
        Self {
            embedding_dimension: defaults::EMBEDDING_DIMENSION,
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),

            promote_threshold: defaults::PROMOTE_THRESHOLD,
            decay_rate: defaults::DECAY_RATE,
            fade_factor: defaults::FADE_FACTOR,

            similarity_threshold_session: defaults::SIMILARITY_THRESHOLD_SESSION,
            similarity_threshold_persistent: defaults::SIMILARITY_THRESHOLD_PERSISTENT,

            context_max_tokens: defaults::CONTEXT_MAX_TOKENS_EMBEDDING,
            context_overlap_ratio: defaults::CONTEXT_OVERLAP_RATIO,

            cache_enabled: true,
            cache_ttl_ms: defaults::CACHE_TTL_MS,
            cache_max_size: defaults::CACHE_MAX_SIZE,

            sparql_endpoints: Vec::new(),
            memory_graph_iri: "http://purl.org/semem/graph/memory".to_string(),

            retry_max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            retry_backoff_ms: defaults::RETRY_BACKOFF_MS,
        }
    }
}

impl SememConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not well-formed TOML or does not match
    /// this struct's shape.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = SememConfig::default();
        assert_eq!(cfg.embedding_dimension, 1536);
        assert_eq!(cfg.promote_threshold, 10);
        assert!((cfg.decay_rate - 1e-4).abs() < f64::EPSILON);
        assert!((cfg.similarity_threshold_session - 40.0).abs() < f32::EPSILON);
        assert!((cfg.similarity_threshold_persistent - 30.0).abs() < f32::EPSILON);
        assert_eq!(cfg.cache_ttl_ms, 300_000);
        assert_eq!(cfg.cache_max_size, 1000);
        assert_eq!(cfg.retry_max_attempts, 3);
    }

    #[test]
    fn parses_partial_toml_with_defaults_for_rest() {
        let cfg = SememConfig::from_toml(r#"embedding_model = "nomic-embed-text""#).unwrap();
        assert_eq!(cfg.embedding_model, "nomic-embed-text");
        assert_eq!(cfg.promote_threshold, 10);
    }
}
