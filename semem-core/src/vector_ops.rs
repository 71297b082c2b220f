//! Pure vector arithmetic: normalization, cosine similarity, dimension
//! standardization. No allocation beyond the output vector; no state.

use crate::constants::defaults::NORM_EPSILON;
use crate::error::{Error, Result};

fn assert_finite(v: &[f32]) -> Result<()> {
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidNumeric);
    }
    Ok(())
}

/// L2-normalize `v`. Returns a zero vector (not an error) if the norm is
/// below `NORM_EPSILON`, since a near-zero vector has no meaningful direction.
pub fn normalize(v: &[f32]) -> Result<Vec<f32>> {
    assert_finite(v)?;
    let norm = l2_norm(v);
    if norm < NORM_EPSILON {
        return Ok(vec![0.0; v.len()]);
    }
    Ok(v.iter().map(|x| x / norm).collect())
}

/// Cosine similarity between `a` and `b`. Returns `0.0` if either vector's
/// norm is below `NORM_EPSILON` (no meaningful direction to compare).
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    assert_finite(a)?;
    assert_finite(b)?;

    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < NORM_EPSILON || norm_b < NORM_EPSILON {
        return Ok(0.0);
    }

    let len = a.len().min(b.len());
    let dot: f32 = a[..len].iter().zip(&b[..len]).map(|(x, y)| x * y).sum();
    Ok(dot / (norm_a * norm_b))
}

/// Pad `v` with zeros to length `dim` if shorter, truncate if longer, pass
/// through unchanged if equal.
#[must_use]
pub fn standardize(v: &[f32], dim: usize) -> Vec<f32> {
    match v.len().cmp(&dim) {
        std::cmp::Ordering::Less => {
            let mut out = v.to_vec();
            out.resize(dim, 0.0);
            out
        }
        std::cmp::Ordering::Equal => v.to_vec(),
        std::cmp::Ordering::Greater => v[..dim].to_vec(),
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
