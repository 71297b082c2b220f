//! Magic numbers pulled out of the algorithms that use them.

/// Default configuration values.
pub mod defaults {
    /// Default embedding dimension (`text-embedding-3-small`-shaped).
    pub const EMBEDDING_DIMENSION: usize = 1536;

    /// `access_count` threshold above which a short-term interaction is promoted.
    pub const PROMOTE_THRESHOLD: u32 = 10;

    /// Per-millisecond exponential decay rate applied to age in `retrieve`.
    pub const DECAY_RATE: f64 = 1e-4;

    /// Multiplier applied to `decay_factor` on a cache/retrieval miss.
    pub const FADE_FACTOR: f64 = 0.9;

    /// Multiplier applied to `decay_factor` on a retrieval hit (reinforcement).
    pub const REINFORCE_FACTOR: f64 = 1.1;

    /// Minimum adjusted similarity for the in-session cache.
    pub const SIMILARITY_THRESHOLD_SESSION: f32 = 40.0;

    /// Minimum adjusted similarity for the persistent store.
    pub const SIMILARITY_THRESHOLD_PERSISTENT: f32 = 30.0;

    /// Default token budget for embedding-capable models.
    pub const CONTEXT_MAX_TOKENS_EMBEDDING: usize = 8192;

    /// Default token budget for non-embedding-capable models.
    pub const CONTEXT_MAX_TOKENS_DEFAULT: usize = 4096;

    /// Fraction of adjacent sliding-window chunks that overlap.
    pub const CONTEXT_OVERLAP_RATIO: f32 = 0.1;

    /// Default query-result cache TTL, in milliseconds.
    pub const CACHE_TTL_MS: u64 = 300_000;

    /// Default maximum number of cached query results.
    pub const CACHE_MAX_SIZE: usize = 1000;

    /// Default maximum SPARQL retry attempts for transient failures.
    pub const RETRY_MAX_ATTEMPTS: u32 = 3;

    /// Default base backoff delay between SPARQL retries, in milliseconds.
    pub const RETRY_BACKOFF_MS: u64 = 100;

    /// Multiplier applied to the backoff delay after each retry.
    pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

    /// Maximum number of k-means clusters built over the short-term tier.
    pub const MAX_CLUSTERS: usize = 10;

    /// Maximum Lloyd's-algorithm iterations before giving up on convergence.
    pub const MAX_CLUSTER_ITERATIONS: usize = 100;

    /// Floating-point epsilon below which a vector norm is treated as zero.
    pub const NORM_EPSILON: f32 = 1e-9;

    /// Default maximum character length of a single document chunk.
    pub const DOCUMENT_CHUNK_CHARS: usize = 1000;
}
