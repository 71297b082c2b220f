//! Storage-agnostic core of a decaying, concept-tagged semantic memory:
//! vector math, embedding validation, the short/long-term interaction
//! store, token-budgeted context assembly, the ZPT navigation lens, and the
//! `tell`/`ask`/`augment` verb surface.
//!
//! This crate carries no network dependency. Persistence is an injected
//! [`verbs::PersistenceBackend`] implemented elsewhere (see `semem-sparql`),
//! which keeps `MemoryStore` and friends testable without a live endpoint.
//!
//! # Example
//!
//! ```
//! use semem_core::vector_ops;
//!
//! let sim = vector_ops::cosine(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
//! assert!((sim - 1.0).abs() < 1e-6);
//! ```

pub mod chunking;
pub mod config;
pub mod constants;
pub mod context_window;
pub mod embedding_validator;
pub mod error;
pub mod memory_store;
pub mod session_cache;
pub mod types;
pub mod vector_ops;
pub mod verbs;
pub mod zpt;

pub use config::SememConfig;
pub use error::{Error, Result};
pub use memory_store::MemoryStore;
pub use types::{Chunk, Cluster, Concept, Interaction, RetrievalHit, Tier};
pub use zpt::ZptState;
