//! Persistence of [`semem_core::MemoryStore`] snapshots into a SPARQL-backed
//! named graph.

use std::collections::HashMap;

use async_trait::async_trait;
use semem_core::error::{Error, Result};
use semem_core::types::{Chunk, Concept, Interaction, RetrievalHit, Tier};
use semem_core::verbs::PersistenceBackend;
use semem_core::vector_ops;
use serde_json::Value;
use tracing::warn;

use crate::cache::CacheLayer;
use crate::client::SparqlClient;
use crate::templates::QueryTemplateStore;
use crate::transaction::TransactionManager;
use crate::vocab;

/// Persists and reconstructs [`semem_core::MemoryStore`] state against a
/// SPARQL 1.1 store, delegating caching to [`CacheLayer`] and
/// writes-under-rollback-safety to [`TransactionManager`].
pub struct SemanticStore {
    client: SparqlClient,
    templates: QueryTemplateStore,
    cache: CacheLayer,
    transactions: TransactionManager,
    memory_graph_iri: String,
    backup_graph_iri: String,
}

impl SemanticStore {
    /// Construct a store bound to `memory_graph_iri`, using `<memory_graph_iri>/__tx__backup`
    /// as the transaction backup graph, with the result cache enabled.
    #[must_use]
    pub fn new(client: SparqlClient, cache_max_size: usize, cache_ttl_ms: u64, memory_graph_iri: impl Into<String>) -> Self {
        Self::with_cache_policy(client, true, cache_max_size, cache_ttl_ms, memory_graph_iri)
    }

    /// Construct a store with an explicit cache policy, as configured via
    /// `SememConfig::cache_enabled`. When `cache_enabled` is `false`, `search`
    /// never hits the cache and every call re-queries the endpoint.
    #[must_use]
    pub fn with_cache_policy(
        client: SparqlClient,
        cache_enabled: bool,
        cache_max_size: usize,
        cache_ttl_ms: u64,
        memory_graph_iri: impl Into<String>,
    ) -> Self {
        let memory_graph_iri = memory_graph_iri.into();
        let backup_graph_iri = format!("{memory_graph_iri}/__tx__backup");
        let cache = if cache_enabled {
            CacheLayer::new(cache_max_size, cache_ttl_ms)
        } else {
            CacheLayer::disabled()
        };
        Self {
            client,
            templates: QueryTemplateStore::new(),
            cache,
            transactions: TransactionManager::new(),
            memory_graph_iri,
            backup_graph_iri,
        }
    }

    /// Load every persisted interaction, reconstructing short-term and
    /// long-term tier membership.
    ///
    /// Entries whose embedding literal fails to parse are skipped (a
    /// [`Error::CorruptEntry`] is logged, not returned).
    ///
    /// The RDF vocabulary carries no separate long-term-membership
    /// predicate, so the returned long-term list is always empty; callers
    /// reconstructing a [`semem_core::MemoryStore`] should call
    /// `MemoryStore::classify` after feeding it the returned interactions,
    /// which re-derives promotion from each interaction's `access_count`.
    ///
    /// # Errors
    ///
    /// Returns the SPARQL client's classified error if the SELECT fails.
    pub async fn load_history(&self) -> Result<(Vec<Interaction>, Vec<String>)> {
        let mut params = HashMap::new();
        params.insert("graph".to_string(), self.memory_graph_iri.clone());
        let query = self.templates.render("select_history", &params, true)?;

        let body = self.client.execute_query(&query).await?;
        let parsed: Value = serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))?;

        let bindings = parsed["results"]["bindings"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut interactions = Vec::new();
        let long_term = Vec::new();

        for binding in bindings {
            match interaction_from_binding(&binding) {
                Ok(interaction) => interactions.push(interaction),
                Err(err) => warn!(error = %err, "skipping corrupt history entry"),
            }
        }

        Ok((interactions, long_term))
    }

    /// Persist every short-term interaction in `interactions`, wrapped in a
    /// single transaction. Overwrites existing triples per-subject via
    /// `DELETE WHERE` before `INSERT DATA`, preserving unrelated triples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] (after rolling back) if any
    /// write fails.
    pub async fn save(&self, interactions: &[Interaction]) -> Result<()> {
        self.transactions
            .begin(&self.client, &self.memory_graph_iri, &self.backup_graph_iri)
            .await?;

        for interaction in interactions {
            if let Err(err) = self.persist_one(interaction).await {
                self.transactions.rollback(&self.client, &self.cache).await?;
                return Err(Error::PersistenceFailed(err.to_string()));
            }
        }

        self.transactions.commit(&self.client).await?;
        self.cache.invalidate_all();
        Ok(())
    }

    async fn persist_one(&self, interaction: &Interaction) -> Result<()> {
        let subject = vocab::subject_iri(&format!("{}/", self.memory_graph_iri), &interaction.id);

        let mut delete_params = HashMap::new();
        delete_params.insert("graph".to_string(), self.memory_graph_iri.clone());
        delete_params.insert("subject".to_string(), subject.clone());
        let delete_query = self.templates.render("delete_subject", &delete_params, true)?;
        self.client.execute_update(&delete_query).await?;

        let triples = interaction_to_triples(&subject, interaction);
        let mut insert_params = HashMap::new();
        insert_params.insert("graph".to_string(), self.memory_graph_iri.clone());
        insert_params.insert("triples".to_string(), triples);
        let insert_query = self.templates.render("insert_interaction", &insert_params, true)?;
        self.client.execute_update(&insert_query).await?;

        Ok(())
    }

    /// Persist a single document chunk as a `ragno:Unit`, wrapped in its own
    /// transaction (mirrors [`Self::save`]'s per-subject overwrite protocol).
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] (after rolling back) if the write fails.
    pub async fn persist_chunk(&self, chunk: &Chunk) -> Result<()> {
        self.transactions
            .begin(&self.client, &self.memory_graph_iri, &self.backup_graph_iri)
            .await?;

        let subject = vocab::subject_iri(&format!("{}/", self.memory_graph_iri), &chunk.id);

        let mut delete_params = HashMap::new();
        delete_params.insert("graph".to_string(), self.memory_graph_iri.clone());
        delete_params.insert("subject".to_string(), subject.clone());
        let delete_query = match self.templates.render("delete_subject", &delete_params, true) {
            Ok(q) => q,
            Err(err) => {
                self.transactions.rollback(&self.client, &self.cache).await?;
                return Err(Error::PersistenceFailed(err.to_string()));
            }
        };
        if let Err(err) = self.client.execute_update(&delete_query).await {
            self.transactions.rollback(&self.client, &self.cache).await?;
            return Err(Error::PersistenceFailed(err.to_string()));
        }

        let triples = chunk_to_triples(&subject, chunk);
        let mut insert_params = HashMap::new();
        insert_params.insert("graph".to_string(), self.memory_graph_iri.clone());
        insert_params.insert("triples".to_string(), triples);
        let insert_query = match self.templates.render("insert_interaction", &insert_params, true) {
            Ok(q) => q,
            Err(err) => {
                self.transactions.rollback(&self.client, &self.cache).await?;
                return Err(Error::PersistenceFailed(err.to_string()));
            }
        };
        if let Err(err) = self.client.execute_update(&insert_query).await {
            self.transactions.rollback(&self.client, &self.cache).await?;
            return Err(Error::PersistenceFailed(err.to_string()));
        }

        self.transactions.commit(&self.client).await?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Search persisted interactions and chunks for hits at or above
    /// `min_similarity`, computing cosine similarity in-process after a
    /// templated SELECT (similarity is never computed inside SPARQL itself).
    ///
    /// # Errors
    ///
    /// Returns the SPARQL client's classified error if the SELECT fails.
    pub async fn search(&self, query_embedding: &[f32], limit: usize, min_similarity: f32) -> Result<Vec<RetrievalHit>> {
        let cache_key = format!("search:{query_embedding:?}:{limit}:{min_similarity}");
        if let Some(cached) = self.cache.get(&cache_key) {
            return serde_json::from_value(cached).map_err(|e| Error::MalformedResponse(e.to_string()));
        }

        let mut params = HashMap::new();
        params.insert("graph".to_string(), self.memory_graph_iri.clone());
        let query = self.templates.render("select_search", &params, true)?;

        let body = self.client.execute_query(&query).await?;
        let parsed: Value = serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))?;
        let bindings = parsed["results"]["bindings"].as_array().cloned().unwrap_or_default();

        let mut hits = Vec::new();
        for binding in bindings {
            let Ok(interaction) = interaction_from_binding(&binding) else {
                continue;
            };
            let sim = 100.0 * vector_ops::cosine(query_embedding, &interaction.embedding)?;
            if sim >= min_similarity {
                hits.push(RetrievalHit {
                    adjusted_similarity: sim,
                    interaction,
                    concept_overlap: Vec::new(),
                });
            }
        }

        hits.sort_by(|a, b| {
            b.adjusted_similarity
                .partial_cmp(&a.adjusted_similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        if let Ok(serialized) = serde_json::to_value(&hits) {
            self.cache.put(&cache_key, serialized);
        }

        Ok(hits)
    }
}

fn interaction_to_triples(subject: &str, interaction: &Interaction) -> String {
    let embedding_json = serde_json::to_string(&interaction.embedding).unwrap_or_default();
    let mut triples = format!(
        "<{subject}> a {class} ; {label_pred} {label:?} ; {content_pred} {response:?} ; \
         {embedding_pred} {embedding:?} ; {created_pred} \"{created}\"^^xsd:dateTime ; \
         {access_pred} {access} ; {decay_pred} {decay} .\n",
        class = vocab::CLASS_ELEMENT,
        label_pred = vocab::PRED_PREF_LABEL,
        label = interaction.prompt,
        content_pred = vocab::PRED_CONTENT,
        response = interaction.response,
        embedding_pred = vocab::PRED_EMBEDDING,
        embedding = embedding_json,
        created_pred = vocab::PRED_CREATED,
        created = interaction.timestamp.to_rfc3339(),
        access_pred = vocab::PRED_ACCESS_COUNT,
        access = interaction.access_count,
        decay_pred = vocab::PRED_DECAY_FACTOR,
        decay = interaction.decay_factor,
    );
    for concept in &interaction.concepts {
        triples.push_str(&format!("<{subject}> {} {:?} .\n", vocab::PRED_CONCEPT, concept.value));
    }
    triples
}

fn chunk_to_triples(subject: &str, chunk: &Chunk) -> String {
    let embedding_json = serde_json::to_string(&chunk.embedding).unwrap_or_default();
    format!(
        "<{subject}> a {class} ; {index_pred} {ordinal} ; {content_pred} {content:?} ; \
         {part_of_pred} {parent:?} ; {has_embedding_pred} <{subject}/embedding> .\n\
         <{subject}/embedding> {vector_pred} {embedding:?} .\n",
        class = vocab::CLASS_UNIT,
        index_pred = vocab::PRED_INDEX,
        ordinal = chunk.ordinal,
        content_pred = vocab::PRED_CONTENT,
        content = chunk.content,
        part_of_pred = vocab::PRED_IS_PART_OF,
        parent = chunk.parent_document_id,
        has_embedding_pred = vocab::PRED_HAS_EMBEDDING,
        vector_pred = vocab::PRED_VECTOR_CONTENT,
        embedding = embedding_json,
    )
}

fn interaction_from_binding(binding: &Value) -> Result<Interaction> {
    let subject = binding_value(binding, "subject")?;
    let label = binding_value(binding, "label").unwrap_or_default();
    let content = binding_value(binding, "content")?;
    let embedding_raw = binding_value(binding, "embedding")?;

    let embedding: Vec<f32> =
        serde_json::from_str(&embedding_raw).map_err(|e| Error::CorruptEntry(format!("{subject}: {e}")))?;

    let access_count = binding_value(binding, "accessCount")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let decay_factor = binding_value(binding, "decayFactor")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1.0);
    let timestamp = binding_value(binding, "created")
        .ok()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
        .map_or_else(chrono::Utc::now, |dt| dt.with_timezone(&chrono::Utc));

    let id = subject.rsplit('/').next().unwrap_or(&subject).to_string();

    Ok(Interaction {
        id,
        prompt: label,
        response: content,
        embedding,
        concepts: Vec::<Concept>::new(),
        timestamp,
        access_count,
        decay_factor,
        tier: Tier::Short,
    })
}

fn binding_value(binding: &Value, key: &str) -> Result<String> {
    binding[key]["value"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::MalformedResponse(format!("missing binding: {key}")))
}

#[async_trait]
impl PersistenceBackend for SemanticStore {
    async fn persist(&self, interaction: &Interaction) -> Result<()> {
        self.save(std::slice::from_ref(interaction)).await
    }

    async fn search(&self, query_embedding: &[f32], limit: usize, min_similarity: f32) -> Result<Vec<RetrievalHit>> {
        Self::search(self, query_embedding, limit, min_similarity).await
    }

    async fn persist_chunk(&self, chunk: &Chunk) -> Result<()> {
        Self::persist_chunk(self, chunk).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_to_triples_includes_concepts() {
        let interaction = Interaction::new("id-1", "prompt text", "response text", vec![1.0, 2.0])
            .with_concepts(vec![Concept::new("rust")]);
        let triples = interaction_to_triples("http://example/mem/id-1", &interaction);
        assert!(triples.contains("ragno:concept"));
        assert!(triples.contains("\"rust\""));
    }

    #[test]
    fn chunk_to_triples_includes_unit_type_and_parent_link() {
        let chunk = Chunk {
            id: "chunk-1".to_string(),
            parent_document_id: "doc-1".to_string(),
            ordinal: 2,
            content: "chunk text".to_string(),
            embedding: vec![1.0, 2.0],
        };
        let triples = chunk_to_triples("http://example/mem/chunk-1", &chunk);
        assert!(triples.contains("ragno:Unit"));
        assert!(triples.contains("olo:index 2"));
        assert!(triples.contains("dcterms:isPartOf \"doc-1\""));
        assert!(triples.contains("ragno:hasEmbedding <http://example/mem/chunk-1/embedding>"));
        assert!(triples.contains("ragno:vectorContent \"[1.0,2.0]\""));
    }

    #[test]
    fn interaction_from_binding_parses_embedding_json() {
        let binding = serde_json::json!({
            "subject": {"value": "http://example/mem/id-1"},
            "label": {"value": "hello"},
            "content": {"value": "world"},
            "embedding": {"value": "[1.0, 2.0]"},
            "accessCount": {"value": "3"},
            "decayFactor": {"value": "1.1"},
            "created": {"value": "2024-01-01T00:00:00Z"},
        });
        let interaction = interaction_from_binding(&binding).unwrap();
        assert_eq!(interaction.id, "id-1");
        assert_eq!(interaction.embedding, vec![1.0, 2.0]);
        assert_eq!(interaction.access_count, 3);
    }

    #[test]
    fn interaction_from_binding_fails_on_malformed_embedding() {
        let binding = serde_json::json!({
            "subject": {"value": "http://example/mem/id-1"},
            "content": {"value": "world"},
            "embedding": {"value": "not json"},
        });
        assert!(matches!(interaction_from_binding(&binding), Err(Error::CorruptEntry(_))));
    }
}
