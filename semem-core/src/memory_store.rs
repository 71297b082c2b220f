//! Short-term/long-term interaction store: retrieval with decay and
//! reinforcement, promotion, k-means clustering, and forgetting.

use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::constants::defaults;
use crate::error::{Error, Result};
use crate::types::{Cluster, Interaction, RetrievalHit};
use crate::vector_ops;

/// In-process short-term/long-term interaction store.
///
/// `long_term` is a superset index into `short_term` by id: promotion never
/// removes an interaction from `short_term`.
#[derive(Debug)]
pub struct MemoryStore {
    short_term: Vec<Interaction>,
    long_term: Vec<String>,
    cluster_labels: Option<Vec<usize>>,
    embedding_dimension: usize,
    promote_threshold: u32,
    decay_rate: f64,
    fade_factor: f64,
}

/// How [`MemoryStore::forget`] removes an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgetMode {
    /// Remove the entry entirely from all arrays and from `long_term`.
    Hard,
    /// Multiply `decay_factor` by the configured fade factor, keeping the entry.
    Fade,
}

impl MemoryStore {
    /// Construct an empty store expecting embeddings of `embedding_dimension`,
    /// using the default promotion/decay policy.
    #[must_use]
    pub fn new(embedding_dimension: usize) -> Self {
        Self::with_policy(
            embedding_dimension,
            defaults::PROMOTE_THRESHOLD,
            defaults::DECAY_RATE,
            defaults::FADE_FACTOR,
        )
    }

    /// Construct an empty store with an explicit promotion/decay policy, as
    /// configured via [`crate::config::SememConfig`].
    #[must_use]
    pub fn with_policy(embedding_dimension: usize, promote_threshold: u32, decay_rate: f64, fade_factor: f64) -> Self {
        Self {
            short_term: Vec::new(),
            long_term: Vec::new(),
            cluster_labels: None,
            embedding_dimension,
            promote_threshold,
            decay_rate,
            fade_factor,
        }
    }

    /// Number of interactions held in the short-term tier.
    #[must_use]
    pub fn len(&self) -> usize {
        self.short_term.len()
    }

    /// Whether the short-term tier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.short_term.is_empty()
    }

    /// Ids currently promoted to the long-term tier.
    #[must_use]
    pub fn long_term_ids(&self) -> &[String] {
        &self.long_term
    }

    /// All short-term interactions, in insertion order.
    #[must_use]
    pub fn short_term(&self) -> &[Interaction] {
        &self.short_term
    }

    /// Append `interaction` to the short-term tier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `interaction.embedding` does
    /// not have `embedding_dimension` elements, or [`Error::InvalidNumeric`]
    /// if it contains a non-finite element.
    pub fn add(&mut self, interaction: Interaction) -> Result<()> {
        if interaction.embedding.len() != self.embedding_dimension {
            return Err(Error::DimensionMismatch {
                expected: self.embedding_dimension,
                actual: interaction.embedding.len(),
            });
        }
        if interaction.embedding.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidNumeric);
        }
        self.short_term.push(interaction);
        self.cluster_labels = None;
        Ok(())
    }

    /// Retrieve interactions whose adjusted similarity to `query_embedding`
    /// meets `min_adjusted_similarity`.
    ///
    /// `exclude_last_n` skips the most recently added `n` entries (e.g. to
    /// avoid matching an interaction against itself immediately after
    /// `add`). Reinforces hits (`decay_factor *= 1.1`, `access_count += 1`,
    /// `timestamp = now`) and fades misses (`decay_factor *= 0.9`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNumeric`] if `query_embedding` contains a
    /// non-finite element.
    pub fn retrieve(
        &mut self,
        query_embedding: &[f32],
        query_concepts: &[String],
        min_adjusted_similarity: f32,
        exclude_last_n: usize,
    ) -> Result<Vec<RetrievalHit>> {
        let now = Utc::now();
        let eligible = self.short_term.len().saturating_sub(exclude_last_n);

        let mut hits: Vec<(f32, usize)> = Vec::new();

        for i in 0..eligible {
            let sim = 100.0 * vector_ops::cosine(query_embedding, &self.short_term[i].embedding)?;
            let age_seconds = self.short_term[i].age_seconds(now);
            let decay = self.short_term[i].decay_factor * (-self.decay_rate * age_seconds).exp();
            let reinforcement = (1.0 + f64::from(self.short_term[i].access_count)).ln();
            let adjusted = (f64::from(sim) * decay * reinforcement) as f32;

            if adjusted >= min_adjusted_similarity {
                self.short_term[i].access_count += 1;
                self.short_term[i].timestamp = now;
                self.short_term[i].decay_factor *= defaults::REINFORCE_FACTOR;
                hits.push((adjusted, i));
            } else {
                self.short_term[i].decay_factor *= self.fade_factor;
            }
        }

        // Descending adjusted similarity; tie-break by more recent timestamp,
        // then by lower index (stable sort preserves index order for
        // remaining ties since we iterated in index order).
        hits.sort_by(|(sim_a, idx_a), (sim_b, idx_b)| {
            sim_b
                .partial_cmp(sim_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    self.short_term[*idx_b]
                        .timestamp
                        .cmp(&self.short_term[*idx_a].timestamp)
                })
                .then_with(|| idx_a.cmp(idx_b))
        });

        let results = hits
            .into_iter()
            .map(|(adjusted, i)| {
                let interaction = self.short_term[i].clone();
                let concept_overlap: Vec<String> = interaction
                    .concepts
                    .iter()
                    .map(|c| c.value.clone())
                    .filter(|v| query_concepts.contains(v))
                    .collect();
                RetrievalHit {
                    adjusted_similarity: adjusted,
                    interaction,
                    concept_overlap,
                }
            })
            .collect();

        Ok(results)
    }

    /// Promote every short-term interaction with `access_count >
    /// PROMOTE_THRESHOLD` (and not already promoted) into `long_term`.
    /// Interactions stay in `short_term`; this only extends the superset
    /// index.
    pub fn classify(&mut self) {
        for interaction in &self.short_term {
            if interaction.access_count > self.promote_threshold
                && !self.long_term.contains(&interaction.id)
            {
                self.long_term.push(interaction.id.clone());
            }
        }
    }

    /// Build up to `MAX_CLUSTERS` k-means clusters over short-term
    /// embeddings, via Lloyd's algorithm with an RNG-seeded centroid
    /// initialization. No-op if fewer than 2 interactions are present.
    pub fn cluster(&mut self, seed: u64) -> Vec<Cluster> {
        let n = self.short_term.len();
        if n < 2 {
            return Vec::new();
        }

        let k = defaults::MAX_CLUSTERS.min(n);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut centroids = initialize_centroids(&self.short_term, k, &mut rng);
        let mut assignments = vec![0usize; n];

        for _ in 0..defaults::MAX_CLUSTER_ITERATIONS {
            let mut changed = false;
            for (i, interaction) in self.short_term.iter().enumerate() {
                let nearest = nearest_centroid(&interaction.embedding, &centroids);
                if assignments[i] != nearest {
                    assignments[i] = nearest;
                    changed = true;
                }
            }

            let new_centroids = recompute_centroids(&self.short_term, &assignments, &centroids);
            if !changed && centroids_equal(&centroids, &new_centroids) {
                centroids = new_centroids;
                break;
            }
            centroids = new_centroids;
        }

        self.cluster_labels = Some(assignments.clone());

        (0..k)
            .map(|cluster_idx| {
                let member_ids: Vec<String> = self
                    .short_term
                    .iter()
                    .zip(&assignments)
                    .filter(|(_, &a)| a == cluster_idx)
                    .map(|(interaction, _)| interaction.id.clone())
                    .collect();
                Cluster {
                    id: cluster_idx.to_string(),
                    centroid: centroids[cluster_idx].clone(),
                    member_ids,
                }
            })
            .filter(|c| !c.member_ids.is_empty())
            .collect()
    }

    /// The last computed cluster assignment, one label per short-term index,
    /// if [`Self::cluster`] has been called since the last mutation.
    #[must_use]
    pub fn cluster_labels(&self) -> Option<&[usize]> {
        self.cluster_labels.as_deref()
    }

    /// Forget the interaction with id `id`. `Hard` removes it from all
    /// arrays and from `long_term`; `Fade` multiplies its `decay_factor` by
    /// the configured fade factor without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no interaction with `id` exists.
    pub fn forget(&mut self, id: &str, mode: ForgetMode) -> Result<()> {
        let index = self
            .short_term
            .iter()
            .position(|interaction| interaction.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        match mode {
            ForgetMode::Hard => {
                self.short_term.remove(index);
                self.long_term.retain(|existing| existing != id);
                self.cluster_labels = None;
            }
            ForgetMode::Fade => {
                self.short_term[index].decay_factor *= self.fade_factor;
            }
        }
        Ok(())
    }
}

fn initialize_centroids(interactions: &[Interaction], k: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f32>> {
    use rand::seq::index::sample;
    let indices = sample(rng, interactions.len(), k);
    indices.into_iter().map(|i| interactions[i].embedding.clone()).collect()
}

fn nearest_centroid(embedding: &[f32], centroids: &[Vec<f32>]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, euclidean_distance(embedding, c)))
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(i, _)| i)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    a[..len]
        .iter()
        .zip(&b[..len])
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// Recompute each cluster's centroid as the mean of its assigned members.
/// A cluster left with no members keeps its previous centroid rather than
/// collapsing to the origin.
fn recompute_centroids(interactions: &[Interaction], assignments: &[usize], previous: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let k = previous.len();
    let dim = previous.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0f32; dim]; k];
    let mut counts = vec![0usize; k];

    for (interaction, &cluster) in interactions.iter().zip(assignments) {
        counts[cluster] += 1;
        for (sum, value) in sums[cluster].iter_mut().zip(&interaction.embedding) {
            *sum += value;
        }
    }

    sums.into_iter()
        .zip(counts)
        .enumerate()
        .map(|(cluster, (sum, count))| {
            if count == 0 {
                previous[cluster].clone()
            } else {
                sum.into_iter().map(|v| v / count as f32).collect()
            }
        })
        .collect()
}

fn centroids_equal(a: &[Vec<f32>], b: &[Vec<f32>]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.len() == y.len() && x.iter().zip(y).all(|(p, q)| (p - q).abs() < 1e-6))
}
