//! The (zoom, pan, tilt) navigation lens maintained per session.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Granularity level of retrieval and context assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zoom {
    /// Individual named entities.
    Entity,
    /// Single interaction/chunk units.
    Unit,
    /// Full text spans.
    Text,
    /// Clusters of related units.
    Community,
    /// The whole corpus.
    Corpus,
}

impl Zoom {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "entity" => Ok(Self::Entity),
            "unit" => Ok(Self::Unit),
            "text" => Ok(Self::Text),
            "community" => Ok(Self::Community),
            "corpus" => Ok(Self::Corpus),
            other => Err(Error::ValidationError(format!("unknown zoom level: {other}"))),
        }
    }
}

/// Retrieval style applied when ranking/ordering candidate hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tilt {
    /// Rank by embedding similarity (the default).
    Embedding,
    /// Rank by keyword overlap.
    Keywords,
    /// Rank by graph relationship proximity.
    Graph,
    /// Reorder by recency.
    Temporal,
}

impl Tilt {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "embedding" => Ok(Self::Embedding),
            "keywords" => Ok(Self::Keywords),
            "graph" => Ok(Self::Graph),
            "temporal" => Ok(Self::Temporal),
            other => Err(Error::ValidationError(format!("unknown tilt style: {other}"))),
        }
    }
}

/// A domain filter applied during retrieval and context assembly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pan {
    /// Optional free-text domain/subject label.
    pub domain: Option<String>,
    /// De-duplicated, lowercased keyword set.
    pub keywords: BTreeSet<String>,
    /// Optional inclusive time window.
    pub time_window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Optional entity-id allowlist.
    pub entities: Vec<String>,
}

impl Pan {
    /// Build a pan filter from raw keyword strings, lowercasing and
    /// de-duplicating them.
    #[must_use]
    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.keywords = keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect();
        self
    }
}

/// The (zoom, pan, tilt) lens, defaulting to `(entity, {}, keywords)`.
///
/// Always valid: there is no restricted transition between verb calls.
/// Mutation methods consume `self` and return a new state (copy-on-read:
/// callers observe a consistent snapshot even under concurrent mutation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZptState {
    /// Current zoom level.
    pub zoom: Zoom,
    /// Current pan filter.
    pub pan: Pan,
    /// Current tilt style.
    pub tilt: Tilt,
}

impl Default for ZptState {
    fn default() -> Self {
        Self {
            zoom: Zoom::Entity,
            pan: Pan::default(),
            tilt: Tilt::Keywords,
        }
    }
}

impl ZptState {
    /// Set the zoom level by name, validating enum membership.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `level` is not a recognized zoom value.
    pub fn zoom(&self, level: &str) -> Result<Self> {
        Ok(Self {
            zoom: Zoom::parse(level)?,
            ..self.clone()
        })
    }

    /// Replace the pan filter.
    #[must_use]
    pub fn pan(&self, filter: Pan) -> Self {
        Self {
            pan: filter,
            ..self.clone()
        }
    }

    /// Set the tilt style by name, validating enum membership.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `style` is not a recognized tilt value.
    pub fn tilt(&self, style: &str) -> Result<Self> {
        Ok(Self {
            tilt: Tilt::parse(style)?,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_matches_spec() {
        let state = ZptState::default();
        assert_eq!(state.zoom, Zoom::Entity);
        assert_eq!(state.tilt, Tilt::Keywords);
        assert!(state.pan.keywords.is_empty());
    }

    #[test]
    fn zoom_rejects_unknown_level() {
        let state = ZptState::default();
        assert!(state.zoom("planet").is_err());
    }

    #[test]
    fn zoom_accepts_known_level_and_returns_new_state() {
        let state = ZptState::default();
        let next = state.zoom("community").unwrap();
        assert_eq!(next.zoom, Zoom::Community);
        assert_eq!(state.zoom, Zoom::Entity, "original state is untouched");
    }

    #[test]
    fn pan_keywords_are_lowercased_and_deduped() {
        let pan = Pan::default().with_keywords(["Rust", "rust", "Memory"]);
        assert_eq!(pan.keywords.len(), 2);
        assert!(pan.keywords.contains("rust"));
    }

    #[test]
    fn tilt_rejects_unknown_style() {
        let state = ZptState::default();
        assert!(state.tilt("vibes").is_err());
    }
}
