//! Core data model: [`Interaction`], [`Concept`], [`Chunk`], [`Cluster`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which tier an [`Interaction`] currently belongs to.
///
/// `long_term` is a superset index, not a move: an interaction promoted to
/// long-term stays in `short_term` too, so this field is informational —
/// membership is authoritative in `MemoryStore`'s parallel arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Only in the short-term tier.
    Short,
    /// Promoted into the long-term tier (and still present in short-term).
    Long,
}

/// A normalized concept tag extracted from content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Lowercased canonical value.
    pub value: String,
    /// Optional finer-grained classification (e.g. "technology", "person").
    pub subtype: Option<String>,
    /// Optional extractor confidence in `[0, 1]`.
    pub confidence: Option<f32>,
}

impl Concept {
    /// Construct a concept from raw text, lowercasing it to the canonical form.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        Self {
            value: value.as_ref().to_lowercase(),
            subtype: None,
            confidence: None,
        }
    }
}

/// De-duplicate concepts by value, keeping the first occurrence of each.
#[must_use]
pub fn dedupe_concepts(concepts: Vec<Concept>) -> Vec<Concept> {
    let mut seen = std::collections::HashSet::new();
    concepts
        .into_iter()
        .filter(|c| seen.insert(c.value.clone()))
        .collect()
}

/// A stored unit pairing a prompt with a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Opaque, immutable identifier.
    pub id: String,
    /// The prompt text.
    pub prompt: String,
    /// The response text.
    pub response: String,
    /// Embedding vector; `embedding.len()` must equal the configured dimension `D`.
    pub embedding: Vec<f32>,
    /// De-duplicated concept tags.
    pub concepts: Vec<Concept>,
    /// When this interaction was created or last touched by a retrieval hit.
    pub timestamp: DateTime<Utc>,
    /// Number of times this interaction has been retrieved above threshold.
    pub access_count: u32,
    /// Decay/reinforcement scalar, multiplied by 1.1 on hits and 0.9 on misses.
    pub decay_factor: f64,
    /// Which tier this interaction currently belongs to.
    pub tier: Tier,
}

impl Interaction {
    /// Construct a new short-term interaction with bookkeeping fields at
    /// their initial values (`access_count = 0`, `decay_factor = 1.0`).
    #[must_use]
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, response: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            response: response.into(),
            embedding,
            concepts: Vec::new(),
            timestamp: Utc::now(),
            access_count: 0,
            decay_factor: 1.0,
            tier: Tier::Short,
        }
    }

    /// Attach concepts, de-duplicating by value.
    #[must_use]
    pub fn with_concepts(mut self, concepts: Vec<Concept>) -> Self {
        self.concepts = dedupe_concepts(concepts);
        self
    }

    /// Age of this interaction relative to `now`, in seconds.
    #[must_use]
    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.timestamp).num_milliseconds() as f64 / 1000.0
    }
}

/// An immutable, ordered fragment of an ingested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque identifier.
    pub id: String,
    /// Identifier of the document this chunk was split from.
    pub parent_document_id: String,
    /// Zero-based position among the parent document's chunks; dense per document.
    pub ordinal: usize,
    /// The chunk's text content.
    pub content: String,
    /// Embedding vector for this chunk's content.
    pub embedding: Vec<f32>,
}

/// A k-means cluster over short-term interaction embeddings. Transient — not
/// required to be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Opaque identifier, typically the cluster's index as a string.
    pub id: String,
    /// Arithmetic mean of member embeddings at build time.
    pub centroid: Vec<f32>,
    /// Interaction ids assigned to this cluster.
    pub member_ids: Vec<String>,
}

/// A retrieval hit: adjusted similarity plus the interaction and the query's
/// concept overlap (informational — not part of the similarity score itself).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Adjusted similarity: `cosine * 100 * decay * reinforcement`.
    pub adjusted_similarity: f32,
    /// The matched interaction.
    pub interaction: Interaction,
    /// Concepts shared between the query and this interaction.
    pub concept_overlap: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_new_lowercases_value() {
        let c = Concept::new("Rust");
        assert_eq!(c.value, "rust");
    }

    #[test]
    fn dedupe_concepts_keeps_first_occurrence() {
        let a = Concept {
            value: "rust".into(),
            subtype: None,
            confidence: Some(0.9),
        };
        let b = Concept {
            value: "rust".into(),
            subtype: Some("language".into()),
            confidence: Some(0.1),
        };
        let result = dedupe_concepts(vec![a.clone(), b]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].confidence, Some(0.9));
    }

    #[test]
    fn interaction_new_has_default_bookkeeping() {
        let i = Interaction::new("id-1", "p", "r", vec![0.0; 4]);
        assert_eq!(i.access_count, 0);
        assert_eq!(i.decay_factor, 1.0);
        assert_eq!(i.tier, Tier::Short);
    }
}
