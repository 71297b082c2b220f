//! Short-lived, in-memory index of the current session's tells, consulted
//! before the persistent store during `ask`.

use crate::error::Result;
use crate::types::{Interaction, RetrievalHit};
use crate::vector_ops;

/// An in-memory index of interactions told during the current session.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: Vec<Interaction>,
}

impl SessionCache {
    /// Construct an empty session cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `interaction` as part of this session.
    pub fn add(&mut self, interaction: Interaction) {
        self.entries.push(interaction);
    }

    /// Number of interactions recorded this session.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the session has recorded any interactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search the session's interactions by cosine similarity (scaled to
    /// `[0, 100]`, unlike the decay-adjusted score in `MemoryStore::retrieve`
    /// since session entries have no meaningful age yet), returning the top
    /// `limit` hits at or above `min_similarity`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::InvalidNumeric`] if `query_embedding`
    /// contains a non-finite element.
    pub fn search(&self, query_embedding: &[f32], limit: usize, min_similarity: f32) -> Result<Vec<RetrievalHit>> {
        let mut scored = Vec::with_capacity(self.entries.len());
        for interaction in &self.entries {
            let sim = 100.0 * vector_ops::cosine(query_embedding, &interaction.embedding)?;
            if sim >= min_similarity {
                scored.push(RetrievalHit {
                    adjusted_similarity: sim,
                    interaction: interaction.clone(),
                    concept_overlap: Vec::new(),
                });
            }
        }
        scored.sort_by(|a, b| {
            b.adjusted_similarity
                .partial_cmp(&a.adjusted_similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    /// All interactions recorded this session, in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[Interaction] {
        &self.entries
    }
}
