//! SPARQL 1.1-backed persistence for `semem-core`'s `MemoryStore`: a
//! templated query/update client, a TTL/LRU result cache, and
//! backup-and-restore transactions over named graphs.
//!
//! [`store::SemanticStore`] implements `semem_core::verbs::PersistenceBackend`,
//! which is how a host wires this crate into `semem-core`'s `VerbsService`
//! without `semem-core` itself depending on HTTP or SPARQL.

pub mod cache;
pub mod client;
pub mod store;
pub mod templates;
pub mod transaction;
pub mod vocab;

pub use cache::CacheLayer;
pub use client::{Endpoints, SparqlClient};
pub use store::SemanticStore;
pub use templates::QueryTemplateStore;
pub use transaction::TransactionManager;
