//! Pluggable hyperdimensional vector algebra.
//!
//! A [`HdcStrategy`] owns the concrete vector representation and the four
//! primitive operations (`bind`, `bundle`, `similarity`, `top_k`) plus
//! deterministic vector creation. Every binary operation checks that both
//! operands carry the same [`StrategyId`] before touching their payloads,
//! so strategies never need to guard against cross-strategy mixing
//! themselves.

mod dense;
mod sparse;

pub use dense::DenseBipolarStrategy;
pub use sparse::SparseSetStrategy;

use serde::{Deserialize, Serialize};

use crate::error::{ReasonerError, Result};
use crate::vocabulary::Vocabulary;

/// Identifies which concrete algebra produced a [`Vector`]. Checked on
/// every binary operation; a mismatch is a [`ReasonerError::StrategyMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyId {
    DenseBipolar,
    SparseSet,
}

impl StrategyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::DenseBipolar => "dense-bipolar",
            StrategyId::SparseSet => "sparse-set",
        }
    }
}

/// Canonical similarity thresholds, per strategy, used by the holographic
/// engine and by callers classifying a similarity score.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Similarity above which two vectors are considered a confident match.
    pub sim_match_high: f64,
    /// Similarity above which two vectors are considered a plausible match.
    pub sim_match: f64,
    /// Similarity above which two vectors are considered weakly related
    /// (used only for diagnostics, never to accept a candidate).
    pub sim_weak: f64,
}

/// The concrete payload of a vector. Kept as an enum rather than a trait
/// object so that strategies can pattern-match on their own variant without
/// downcasting.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    /// `geometry` bits packed one-per-byte as +1/-1 (bipolar).
    Dense(Vec<i8>),
    /// A sorted, deduplicated set of active dimension indices.
    Sparse(Vec<u32>),
}

/// An immutable hyperdimensional vector tagged with the strategy and
/// geometry (dimensionality) it was created under.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    pub strategy: StrategyId,
    pub geometry: usize,
    pub data: VectorData,
}

impl Vector {
    fn check_strategy(&self, other: &Vector) -> Result<()> {
        if self.strategy != other.strategy {
            return Err(ReasonerError::StrategyMismatch {
                expected: self.strategy.as_str().to_string(),
                found: other.strategy.as_str().to_string(),
            });
        }
        Ok(())
    }

    fn check_geometry(&self, other: &Vector) -> Result<()> {
        if self.geometry != other.geometry {
            return Err(ReasonerError::GeometryMismatch {
                expected: self.geometry,
                found: other.geometry,
            });
        }
        Ok(())
    }

    /// Validates that `self` and `other` can be combined by a binary op.
    pub fn check_compatible(&self, other: &Vector) -> Result<()> {
        self.check_strategy(other)?;
        self.check_geometry(other)
    }
}

/// A pluggable hyperdimensional vector algebra.
///
/// Implementors must guarantee that `create_from_name` is a pure function
/// of `(theory_id, name, geometry)` — identical inputs always produce a
/// bit-for-bit identical vector, and distinct names produce
/// quasi-orthogonal vectors with high probability (see the determinism and
/// quasi-orthogonality properties in the crate's test suite).
pub trait HdcStrategy: std::fmt::Debug + Send + Sync {
    fn id(&self) -> StrategyId;

    fn thresholds(&self) -> Thresholds;

    /// The neutral element for `bundle` under this algebra.
    fn create_zero(&self, geometry: usize) -> Vector;

    /// Deterministically stamp a name into a vector. `theory_id` scopes the
    /// hash so the same name in different theories never collides.
    fn create_from_name(&self, theory_id: &str, name: &str, geometry: usize) -> Vector;

    /// Self-inverse composition: `bind(bind(a, b), b) == a`.
    fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector>;

    /// Superposition of many vectors into one approximate representative.
    fn bundle(&self, vectors: &[Vector]) -> Result<Vector>;

    /// Similarity in `[0.0, 1.0]`, 1.0 meaning identical.
    fn similarity(&self, a: &Vector, b: &Vector) -> Result<f64>;

    /// The `k` vocabulary entries most similar to `query`, sorted
    /// descending by similarity, ties broken by insertion order.
    fn top_k_similar(&self, query: &Vector, vocabulary: &Vocabulary, k: usize) -> Result<Vec<(String, f64)>> {
        let mut scored: Vec<(String, f64)> = Vec::with_capacity(vocabulary.len());
        for atom in vocabulary.iter() {
            let sim = self.similarity(query, &atom.vector)?;
            scored.push((atom.name.clone(), sim));
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn clone_vector(&self, v: &Vector) -> Vector {
        v.clone()
    }

    /// Extend a vector to a larger geometry, preserving existing dimensions.
    /// Strategies that cannot meaningfully extend return
    /// [`ReasonerError::UnsupportedExtension`].
    fn extend(&self, v: &Vector, new_geometry: usize) -> Result<Vector>;
}

/// SHA-256 the `(theory_id, name)` pair and use the digest to seed a
/// `ChaCha8Rng`, so every strategy's `create_from_name` is built on the same
/// deterministic foundation. Strategies differ only in how they consume the
/// resulting stream of randomness.
pub(crate) fn stamping_rng(theory_id: &str, name: &str) -> rand_chacha::ChaCha8Rng {
    use rand::SeedableRng;
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(theory_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    rand_chacha::ChaCha8Rng::from_seed(seed)
}

/// Construct a strategy by its canonical identifier. Used by
/// [`crate::config::SessionConfig`] resolution.
pub fn strategy_for_id(id: StrategyId) -> Box<dyn HdcStrategy> {
    match id {
        StrategyId::DenseBipolar => Box::new(DenseBipolarStrategy::default()),
        StrategyId::SparseSet => Box::new(SparseSetStrategy::default()),
    }
}
