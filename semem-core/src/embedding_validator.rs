//! Per-model expected embedding dimension, numeric validity, and
//! dimension-coercion on top of [`crate::vector_ops`].

use std::collections::HashMap;

use crate::constants::defaults::EMBEDDING_DIMENSION;
use crate::error::{Error, Result};
use crate::vector_ops;

/// Maps a model identifier to its expected embedding dimension.
#[derive(Debug, Clone)]
pub struct EmbeddingValidator {
    dimensions: HashMap<String, usize>,
    default_dimension: usize,
}

impl EmbeddingValidator {
    /// Construct a validator seeded with common embedding model dimensions.
    #[must_use]
    pub fn new() -> Self {
        let mut dimensions = HashMap::new();
        dimensions.insert("text-embedding-3-small".to_string(), 1536);
        dimensions.insert("text-embedding-3-large".to_string(), 3072);
        dimensions.insert("text-embedding-ada-002".to_string(), 1536);
        dimensions.insert("nomic-embed-text".to_string(), 768);
        dimensions.insert("all-MiniLM-L6-v2".to_string(), 384);
        Self {
            dimensions,
            default_dimension: EMBEDDING_DIMENSION,
        }
    }

    /// Construct a validator with a caller-supplied model→dimension table.
    #[must_use]
    pub fn with_dimensions(dimensions: HashMap<String, usize>, default_dimension: usize) -> Self {
        Self {
            dimensions,
            default_dimension,
        }
    }

    /// The expected dimension for `model`, or the configured default if unknown.
    #[must_use]
    pub fn expected_dimension(&self, model: &str) -> usize {
        self.dimensions
            .get(model)
            .copied()
            .unwrap_or(self.default_dimension)
    }

    /// Register or override the expected dimension for `model`.
    pub fn register(&mut self, model: impl Into<String>, dimension: usize) {
        self.dimensions.insert(model.into(), dimension);
    }

    /// Validate that `v` has exactly `dim` finite elements.
    pub fn validate(&self, v: &[f32], dim: usize) -> Result<()> {
        if v.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidNumeric);
        }
        Ok(())
    }

    /// Pad/truncate `v` to the dimension expected by `model`.
    #[must_use]
    pub fn standardize_for_model(&self, v: &[f32], model: &str) -> Vec<f32> {
        vector_ops::standardize(v, self.expected_dimension(model))
    }
}

impl Default for EmbeddingValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_dimension_is_looked_up() {
        let validator = EmbeddingValidator::new();
        assert_eq!(validator.expected_dimension("nomic-embed-text"), 768);
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        let validator = EmbeddingValidator::new();
        assert_eq!(validator.expected_dimension("mystery-model"), EMBEDDING_DIMENSION);
    }

    #[test]
    fn validate_rejects_wrong_length() {
        let validator = EmbeddingValidator::new();
        let v = vec![0.0; 10];
        assert!(matches!(
            validator.validate(&v, 20),
            Err(Error::DimensionMismatch { expected: 20, actual: 10 })
        ));
    }

    #[test]
    fn validate_rejects_nan() {
        let validator = EmbeddingValidator::new();
        let v = vec![f32::NAN; 4];
        assert!(matches!(validator.validate(&v, 4), Err(Error::InvalidNumeric)));
    }

    #[test]
    fn validate_accepts_matching_finite_vector() {
        let validator = EmbeddingValidator::new();
        let v = vec![0.1; 4];
        assert!(validator.validate(&v, 4).is_ok());
    }

    #[test]
    fn standardize_for_model_pads_to_expected_dimension() {
        let validator = EmbeddingValidator::new();
        let v = vec![1.0, 2.0];
        let out = validator.standardize_for_model(&v, "all-MiniLM-L6-v2");
        assert_eq!(out.len(), 384);
    }
}
