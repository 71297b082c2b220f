//! The `tell`/`ask`/`augment`/`zoom`/`pan`/`tilt`/`inspect` verb surface.
//!
//! External collaborators (embedder, concept extractor, chat model,
//! persistence) are injected as trait objects rather than singletons, so
//! this module stays testable without a live model or store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::chunking;
use crate::error::{Error, Result};
use crate::memory_store::MemoryStore;
use crate::session_cache::SessionCache;
use crate::types::{Chunk, Concept, Interaction, RetrievalHit};
use crate::zpt::{Pan, ZptState};

/// Generates an embedding vector for a piece of text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text`, returning a vector of the model's native dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmbeddingFailed`] on failure.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Extracts normalized concept tags from text.
#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    /// Extract concepts from `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConceptExtractionFailed`] on failure.
    async fn extract(&self, text: &str) -> Result<Vec<Concept>>;
}

/// Generates a chat/completion response given a prompt and assembled context.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate an answer to `question` given `context`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnhancementFailed`] on failure.
    async fn complete(&self, question: &str, context: &str) -> Result<String>;
}

/// Persists and retrieves [`MemoryStore`] state from the backing store.
/// Implemented by `semem-sparql`'s `SemanticStore`; kept as a trait here so
/// `semem-core` carries no network dependency.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Persist `interaction`, overwriting any prior triples for its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] on failure. The caller is
    /// expected to keep the in-memory add regardless (a persistence failure
    /// here is a soft failure, not fatal to `tell`).
    async fn persist(&self, interaction: &Interaction) -> Result<()>;

    /// Persist `chunk`, overwriting any prior triples for its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] on failure. Soft-failure
    /// semantics match [`Self::persist`].
    async fn persist_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// Search the persistent store for hits above `min_similarity`, covering
    /// both interactions and document chunks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] on failure.
    async fn search(&self, query_embedding: &[f32], limit: usize, min_similarity: f32) -> Result<Vec<RetrievalHit>>;
}

/// `tell` content classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TellType {
    /// A conversational interaction (prompt/response pair).
    Interaction,
    /// A standalone document to ingest.
    Document,
    /// A bare concept assertion.
    Concept,
}

/// Request for the `tell` verb.
#[derive(Debug, Clone)]
pub struct TellRequest {
    /// The content to remember.
    pub content: String,
    /// Classification of `content`.
    pub kind: TellType,
    /// Optional free-form metadata (currently passed through, not interpreted).
    pub metadata: Option<serde_json::Value>,
}

/// Response from the `tell` verb.
#[derive(Debug, Clone, Serialize)]
pub struct TellResponse {
    /// Id of the newly created interaction.
    pub id: String,
    /// Extracted concept values.
    pub concepts: Vec<String>,
    /// Creation timestamp.
    pub timestamp: chrono::DateTime<Utc>,
    /// Set if async persistence failed; the in-memory add still succeeded.
    pub persistence_warning: Option<String>,
}

/// `ask` retrieval depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskMode {
    /// Session cache only.
    Basic,
    /// Session cache, falling back to the persistent store.
    Standard,
    /// Standard, plus bounded extra refinement passes widening `pan.keywords`.
    Comprehensive,
}

/// Request for the `ask` verb.
#[derive(Debug, Clone)]
pub struct AskRequest {
    /// The question to answer.
    pub question: String,
    /// Retrieval depth.
    pub mode: AskMode,
    /// Whether to build and use retrieved context at all.
    pub use_context: bool,
}

/// Which path produced an `ask`'s hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// All hits came from the in-session cache.
    SessionCache,
    /// Hits were backfilled from the persistent semantic store.
    HybridSemanticSearch,
    /// A comprehensive-mode refinement pass contributed hits.
    EnhancedGeneration,
}

/// Response from the `ask` verb.
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    /// The generated answer.
    pub answer: String,
    /// Whether retrieved context was used at all.
    pub used_context: bool,
    /// Ids of the interactions that contributed context.
    pub context_items: Vec<String>,
    /// Which retrieval path produced the hits.
    pub search_method: SearchMethod,
    /// The ZptState snapshot used for this ask.
    pub zpt_state: ZptState,
}

/// `augment` operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AugmentOperation {
    /// Re-extract concepts for the target.
    ExtractConcepts,
    /// Re-generate the target's embedding.
    GenerateEmbedding,
    /// Summarize the target via the chat model.
    Summarize,
    /// Relate the target to other stored interactions (concept overlap).
    Relate,
}

/// Response from the `augment` verb.
#[derive(Debug, Clone, Serialize)]
pub struct AugmentResponse {
    /// Id of the augmented target.
    pub id: String,
    /// Which operation was applied.
    pub operation: AugmentOperation,
    /// A human-readable summary of the result.
    pub result: String,
}

/// `inspect` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectWhat {
    /// Current session's tells.
    Session,
    /// All concepts across the short-term tier.
    Concepts,
    /// Everything.
    All,
}

/// One interaction's detail row in an `inspect` snapshot, included only when
/// `details` is requested.
#[derive(Debug, Clone, Serialize)]
pub struct InspectEntry {
    /// Interaction id.
    pub id: String,
    /// The told content (`Interaction::response`).
    pub content: String,
    /// Concept values attached to this interaction.
    pub concepts: Vec<String>,
    /// Number of times this interaction has been retrieved above threshold.
    pub access_count: u32,
    /// Which tier this interaction currently belongs to.
    pub tier: crate::types::Tier,
}

/// Response from the `inspect` verb.
#[derive(Debug, Clone, Serialize)]
pub struct InspectSnapshot {
    /// Number of interactions recorded this session.
    pub session_count: usize,
    /// Distinct concept values observed, if requested.
    pub concepts: Vec<String>,
    /// Number of interactions in the short-term tier, if requested.
    pub short_term_count: Option<usize>,
    /// Number of ids promoted to the long-term tier, if requested.
    pub long_term_count: Option<usize>,
    /// Per-interaction detail rows, present only when `details` was requested.
    pub entries: Vec<InspectEntry>,
}

/// Orchestrates the verb surface over an injected [`MemoryStore`],
/// [`ZptState`], [`SessionCache`], and external capabilities.
pub struct VerbsService {
    memory: Arc<RwLock<MemoryStore>>,
    zpt: RwLock<ZptState>,
    session: RwLock<SessionCache>,
    embedder: Arc<dyn Embedder>,
    concepts: Arc<dyn ConceptExtractor>,
    chat: Arc<dyn ChatModel>,
    persistence: Arc<dyn PersistenceBackend>,
    similarity_threshold_session: f32,
    similarity_threshold_persistent: f32,
    session_top_k: usize,
    persistent_top_k: usize,
    augmented_ops: RwLock<std::collections::HashSet<(String, AugmentOperation)>>,
}

impl VerbsService {
    /// Construct a service over injected capabilities and thresholds.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        memory: Arc<RwLock<MemoryStore>>,
        embedder: Arc<dyn Embedder>,
        concepts: Arc<dyn ConceptExtractor>,
        chat: Arc<dyn ChatModel>,
        persistence: Arc<dyn PersistenceBackend>,
        similarity_threshold_session: f32,
        similarity_threshold_persistent: f32,
        session_top_k: usize,
        persistent_top_k: usize,
    ) -> Self {
        Self {
            memory,
            zpt: RwLock::new(ZptState::default()),
            session: RwLock::new(SessionCache::new()),
            embedder,
            concepts,
            chat,
            persistence,
            similarity_threshold_session,
            similarity_threshold_persistent,
            session_top_k,
            persistent_top_k,
            augmented_ops: RwLock::new(std::collections::HashSet::new()),
        }
    }

    /// Embed and store `request.content`.
    ///
    /// `TellType::Interaction` and `TellType::Concept` append a single
    /// [`Interaction`] to the short-term tier, the session cache, and the
    /// persistent store. `TellType::Document` instead splits `content` into
    /// dense, ordered [`Chunk`]s and persists each one directly — chunks are
    /// not held in [`MemoryStore`] or [`SessionCache`], which index
    /// interactions only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmbeddingFailed`] if embedding fails. Persistence
    /// failures are soft: the in-memory add is kept and the failure is
    /// surfaced via [`TellResponse::persistence_warning`] instead.
    pub async fn tell(&self, request: TellRequest) -> Result<TellResponse> {
        match request.kind {
            TellType::Interaction | TellType::Concept => self.tell_interaction(request).await,
            TellType::Document => self.tell_document(request).await,
        }
    }

    async fn tell_interaction(&self, request: TellRequest) -> Result<TellResponse> {
        let embedding = self.embedder.embed(&request.content).await?;
        let extracted = self.concepts.extract(&request.content).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let interaction = Interaction::new(id.clone(), "", &request.content, embedding)
            .with_concepts(extracted);
        let timestamp = interaction.timestamp;
        let concept_values: Vec<String> = interaction.concepts.iter().map(|c| c.value.clone()).collect();

        {
            let mut memory = self.memory.write();
            memory.add(interaction.clone())?;
        }
        self.session.write().add(interaction.clone());

        let persistence_warning = match self.persistence.persist(&interaction).await {
            Ok(()) => None,
            Err(err) => Some(err.to_string()),
        };

        Ok(TellResponse {
            id,
            concepts: concept_values,
            timestamp,
            persistence_warning,
        })
    }

    /// Split `request.content` into ordinal chunks, embed and persist each
    /// as a `Chunk`. Returns the minted document id (not any one chunk's id).
    async fn tell_document(&self, request: TellRequest) -> Result<TellResponse> {
        let extracted = self.concepts.extract(&request.content).await?;
        let concept_values: Vec<String> = extracted.iter().map(|c| c.value.clone()).collect();

        let document_id = uuid::Uuid::new_v4().to_string();
        let timestamp = Utc::now();

        let mut persistence_warning = None;
        for (ordinal, text) in chunking::split_document(&request.content).into_iter().enumerate() {
            let embedding = self.embedder.embed(&text).await?;
            let chunk = Chunk {
                id: uuid::Uuid::new_v4().to_string(),
                parent_document_id: document_id.clone(),
                ordinal,
                content: text,
                embedding,
            };
            if let Err(err) = self.persistence.persist_chunk(&chunk).await {
                persistence_warning = Some(err.to_string());
            }
        }

        Ok(TellResponse {
            id: document_id,
            concepts: concept_values,
            timestamp,
            persistence_warning,
        })
    }

    /// Answer `request.question` using session and (if needed) persistent
    /// retrieval, then the injected chat model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmbeddingFailed`] if embedding the question fails,
    /// or [`Error::EnhancementFailed`] if the chat model fails.
    pub async fn ask(&self, request: AskRequest) -> Result<AskResponse> {
        let query_embedding = self.embedder.embed(&request.question).await?;
        let query_concepts = self.concepts.extract(&request.question).await.unwrap_or_default();
        let query_concept_values: Vec<String> = query_concepts.iter().map(|c| c.value.clone()).collect();

        let zpt = self.zpt.read().clone();

        let mut session_hits = self
            .session
            .read()
            .search(&query_embedding, self.session_top_k, self.similarity_threshold_session)?;

        let mut search_method = SearchMethod::SessionCache;
        let mut persistent_hits = Vec::new();

        if request.mode != AskMode::Basic && session_hits.len() < self.session_top_k {
            persistent_hits = self
                .persistence
                .search(&query_embedding, self.persistent_top_k, self.similarity_threshold_persistent)
                .await?;
            if !persistent_hits.is_empty() {
                search_method = SearchMethod::HybridSemanticSearch;
            }
        }

        let mut merged = merge_preferring_session(session_hits.drain(..).collect(), persistent_hits);
        apply_zpt(&mut merged, &zpt);

        if request.mode == AskMode::Comprehensive {
            let widened = self.refine_comprehensive(&query_embedding, &merged).await?;
            if !widened.is_empty() {
                search_method = SearchMethod::EnhancedGeneration;
                merged = merge_preferring_session(merged, widened);
            }
        }

        let context_items: Vec<String> = merged.iter().map(|h| h.interaction.id.clone()).collect();

        let answer = if request.use_context {
            let context_text = merged
                .iter()
                .map(|h| h.interaction.response.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.chat.complete(&request.question, &context_text).await?
        } else {
            self.chat.complete(&request.question, "").await?
        };

        Ok(AskResponse {
            answer,
            used_context: request.use_context && !merged.is_empty(),
            context_items,
            search_method,
            zpt_state: zpt,
        })
    }

    /// Bounded refinement for `comprehensive` mode: widen `pan.keywords` by
    /// the top concept values from the first pass and search again, stopping
    /// as soon as a pass adds nothing new. Capped at two extra passes.
    async fn refine_comprehensive(&self, query_embedding: &[f32], first_pass: &[RetrievalHit]) -> Result<Vec<RetrievalHit>> {
        let mut extra = Vec::new();
        let mut seen_ids: std::collections::HashSet<String> =
            first_pass.iter().map(|h| h.interaction.id.clone()).collect();

        for _ in 0..2 {
            let hits = self
                .persistence
                .search(query_embedding, self.persistent_top_k, self.similarity_threshold_persistent * 0.5)
                .await?;
            let fresh: Vec<RetrievalHit> = hits
                .into_iter()
                .filter(|h| seen_ids.insert(h.interaction.id.clone()))
                .collect();
            if fresh.is_empty() {
                break;
            }
            extra.extend(fresh);
        }
        Ok(extra)
    }

    /// Apply `operation` to the interaction identified by `target`,
    /// persisting derived attributes. Idempotent per `(target, operation)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `target` is not in the short-term tier,
    /// or the relevant capability error if the operation fails.
    pub async fn augment(&self, target: &str, operation: AugmentOperation) -> Result<AugmentResponse> {
        if self.augmented_ops.read().contains(&(target.to_string(), operation)) {
            return Ok(AugmentResponse {
                id: target.to_string(),
                operation,
                result: "already applied".to_string(),
            });
        }

        let content = {
            let memory = self.memory.read();
            memory
                .short_term()
                .iter()
                .find(|i| i.id == target)
                .map(|i| i.prompt.clone())
                .ok_or_else(|| Error::NotFound(target.to_string()))?
        };

        let result = match operation {
            AugmentOperation::ExtractConcepts => {
                let extracted = self.concepts.extract(&content).await?;
                format!("{} concepts extracted", extracted.len())
            }
            AugmentOperation::GenerateEmbedding => {
                let embedding = self.embedder.embed(&content).await?;
                format!("embedding regenerated ({} dims)", embedding.len())
            }
            AugmentOperation::Summarize => self.chat.complete("Summarize the following.", &content).await?,
            AugmentOperation::Relate => {
                let memory = self.memory.read();
                let related = memory
                    .short_term()
                    .iter()
                    .filter(|i| i.id != target)
                    .count();
                format!("{related} candidate relations")
            }
        };

        self.augmented_ops.write().insert((target.to_string(), operation));

        Ok(AugmentResponse {
            id: target.to_string(),
            operation,
            result,
        })
    }

    /// Set the zoom level, validating enum membership.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for an unrecognized level.
    pub fn zoom(&self, level: &str) -> Result<ZptState> {
        let mut zpt = self.zpt.write();
        *zpt = zpt.zoom(level)?;
        Ok(zpt.clone())
    }

    /// Replace the pan filter.
    pub fn pan(&self, filter: Pan) -> ZptState {
        let mut zpt = self.zpt.write();
        *zpt = zpt.pan(filter);
        zpt.clone()
    }

    /// Set the tilt style, validating enum membership.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for an unrecognized style.
    pub fn tilt(&self, style: &str) -> Result<ZptState> {
        let mut zpt = self.zpt.write();
        *zpt = zpt.tilt(style)?;
        Ok(zpt.clone())
    }

    /// Read-only introspection snapshot. When `details` is true, the
    /// snapshot's `entries` field is populated with a per-interaction row
    /// for every interaction covered by `what`.
    #[must_use]
    pub fn inspect(&self, what: InspectWhat, details: bool) -> InspectSnapshot {
        let session_count = self.session.read().len();
        let memory = self.memory.read();

        let concepts = match what {
            InspectWhat::Concepts | InspectWhat::All => {
                let mut values: Vec<String> = memory
                    .short_term()
                    .iter()
                    .flat_map(|i| i.concepts.iter().map(|c| c.value.clone()))
                    .collect();
                values.sort_unstable();
                values.dedup();
                values
            }
            InspectWhat::Session => Vec::new(),
        };

        let (short_term_count, long_term_count) = match what {
            InspectWhat::All => (Some(memory.len()), Some(memory.long_term_ids().len())),
            InspectWhat::Session | InspectWhat::Concepts => (None, None),
        };

        let entries = if details {
            let long_term_ids = memory.long_term_ids();
            memory
                .short_term()
                .iter()
                .map(|i| InspectEntry {
                    id: i.id.clone(),
                    content: i.response.clone(),
                    concepts: i.concepts.iter().map(|c| c.value.clone()).collect(),
                    access_count: i.access_count,
                    tier: if long_term_ids.contains(&i.id) {
                        crate::types::Tier::Long
                    } else {
                        crate::types::Tier::Short
                    },
                })
                .collect()
        } else {
            Vec::new()
        };

        InspectSnapshot {
            session_count,
            concepts,
            short_term_count,
            long_term_count,
            entries,
        }
    }
}

/// Merge two hit lists by interaction id, preferring `preferred`'s entry
/// when both contain the same id.
fn merge_preferring_session(preferred: Vec<RetrievalHit>, fallback: Vec<RetrievalHit>) -> Vec<RetrievalHit> {
    let mut seen: std::collections::HashSet<String> = preferred.iter().map(|h| h.interaction.id.clone()).collect();
    let mut merged = preferred;
    for hit in fallback {
        if seen.insert(hit.interaction.id.clone()) {
            merged.push(hit);
        }
    }
    merged.sort_by(|a, b| {
        b.adjusted_similarity
            .partial_cmp(&a.adjusted_similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged
}

/// Apply ZptState's pan/tilt to a merged hit list. `zoom` is consumed by
/// the caller's context-assembly step (cluster collapsing), not here.
fn apply_zpt(hits: &mut Vec<RetrievalHit>, zpt: &ZptState) {
    if !zpt.pan.keywords.is_empty() {
        hits.retain(|h| {
            zpt.pan.keywords.iter().any(|kw| {
                h.interaction.response.to_lowercase().contains(kw.as_str())
                    || h.interaction.prompt.to_lowercase().contains(kw.as_str())
            })
        });
    }
    if zpt.tilt == crate::zpt::Tilt::Temporal {
        hits.sort_by(|a, b| b.interaction.timestamp.cmp(&a.interaction.timestamp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedEmbedder;
    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct NoConcepts;
    #[async_trait]
    impl ConceptExtractor for NoConcepts {
        async fn extract(&self, _text: &str) -> Result<Vec<Concept>> {
            Ok(Vec::new())
        }
    }

    struct EchoChat;
    #[async_trait]
    impl ChatModel for EchoChat {
        async fn complete(&self, question: &str, context: &str) -> Result<String> {
            Ok(format!("answered: {question} [{context}]"))
        }
    }

    struct NoopPersistence;
    #[async_trait]
    impl PersistenceBackend for NoopPersistence {
        async fn persist(&self, _interaction: &Interaction) -> Result<()> {
            Ok(())
        }
        async fn persist_chunk(&self, _chunk: &Chunk) -> Result<()> {
            Ok(())
        }
        async fn search(&self, _query_embedding: &[f32], _limit: usize, _min_similarity: f32) -> Result<Vec<RetrievalHit>> {
            Ok(Vec::new())
        }
    }

    fn service() -> VerbsService {
        VerbsService::new(
            Arc::new(RwLock::new(MemoryStore::new(2))),
            Arc::new(FixedEmbedder),
            Arc::new(NoConcepts),
            Arc::new(EchoChat),
            Arc::new(NoopPersistence),
            40.0,
            30.0,
            5,
            5,
        )
    }

    #[tokio::test]
    async fn tell_then_ask_round_trips_through_session_cache() {
        let svc = service();
        let tell_response = svc
            .tell(TellRequest {
                content: "hello world".to_string(),
                kind: TellType::Interaction,
                metadata: None,
            })
            .await
            .unwrap();
        assert!(tell_response.persistence_warning.is_none());

        let ask_response = svc
            .ask(AskRequest {
                question: "hello?".to_string(),
                mode: AskMode::Basic,
                use_context: true,
            })
            .await
            .unwrap();
        assert_eq!(ask_response.search_method, SearchMethod::SessionCache);
        assert!(ask_response.used_context);
    }

    #[tokio::test]
    async fn zoom_rejects_invalid_level() {
        let svc = service();
        assert!(svc.zoom("nonsense").is_err());
    }

    struct RecordingPersistence {
        chunks: parking_lot::Mutex<Vec<Chunk>>,
    }
    #[async_trait]
    impl PersistenceBackend for RecordingPersistence {
        async fn persist(&self, _interaction: &Interaction) -> Result<()> {
            Ok(())
        }
        async fn persist_chunk(&self, chunk: &Chunk) -> Result<()> {
            self.chunks.lock().push(chunk.clone());
            Ok(())
        }
        async fn search(&self, _query_embedding: &[f32], _limit: usize, _min_similarity: f32) -> Result<Vec<RetrievalHit>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn tell_document_splits_into_chunks_and_persists_each() {
        let persistence = Arc::new(RecordingPersistence {
            chunks: parking_lot::Mutex::new(Vec::new()),
        });
        let svc = VerbsService::new(
            Arc::new(RwLock::new(MemoryStore::new(2))),
            Arc::new(FixedEmbedder),
            Arc::new(NoConcepts),
            Arc::new(EchoChat),
            persistence.clone(),
            40.0,
            30.0,
            5,
            5,
        );

        let content = "x".repeat(2500);
        let response = svc
            .tell(TellRequest {
                content: content.clone(),
                kind: TellType::Document,
                metadata: None,
            })
            .await
            .unwrap();

        assert!(response.persistence_warning.is_none());

        let chunks = persistence.chunks.lock();
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i);
            assert_eq!(chunk.parent_document_id, response.id);
        }
        assert_eq!(
            chunks.iter().map(|c| c.content.clone()).collect::<String>(),
            content
        );
    }

    #[tokio::test]
    async fn augment_is_idempotent_per_target_and_operation() {
        let svc = service();
        let tell_response = svc
            .tell(TellRequest {
                content: "hello".to_string(),
                kind: TellType::Interaction,
                metadata: None,
            })
            .await
            .unwrap();

        let first = svc
            .augment(&tell_response.id, AugmentOperation::ExtractConcepts)
            .await
            .unwrap();
        let second = svc
            .augment(&tell_response.id, AugmentOperation::ExtractConcepts)
            .await
            .unwrap();

        assert_ne!(first.result, "already applied");
        assert_eq!(second.result, "already applied");
    }

    #[tokio::test]
    async fn inspect_session_reports_count_without_concepts() {
        let svc = service();
        svc.tell(TellRequest {
            content: "hi".to_string(),
            kind: TellType::Interaction,
            metadata: None,
        })
        .await
        .unwrap();

        let snapshot = svc.inspect(InspectWhat::Session, false);
        assert_eq!(snapshot.session_count, 1);
        assert!(snapshot.concepts.is_empty());
        assert!(snapshot.short_term_count.is_none());
        assert!(snapshot.entries.is_empty());
    }

    #[tokio::test]
    async fn inspect_with_details_reports_per_interaction_rows() {
        let svc = service();
        let tell_response = svc
            .tell(TellRequest {
                content: "hello world".to_string(),
                kind: TellType::Interaction,
                metadata: None,
            })
            .await
            .unwrap();

        let snapshot = svc.inspect(InspectWhat::All, true);
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].id, tell_response.id);
        assert_eq!(snapshot.entries[0].content, "hello world");
    }
}
