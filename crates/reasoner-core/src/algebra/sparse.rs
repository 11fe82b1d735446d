//! Sparse exact-set strategy.
//!
//! Vectors are sorted, deduplicated sets of active dimension indices, each
//! capped at [`SparseSetStrategy::MAX_ACTIVE`] entries. `bind` is symmetric
//! difference (self-inverse), `bundle` is a frequency-weighted union capped
//! to the same budget, and similarity is the Jaccard index.

use std::collections::HashMap;

use rand::seq::index::sample;

use super::{stamping_rng, HdcStrategy, StrategyId, Thresholds, Vector, VectorData};
use crate::error::{ReasonerError, Result};

#[derive(Debug, Clone, Copy)]
pub struct SparseSetStrategy {
    thresholds: Thresholds,
}

impl SparseSetStrategy {
    /// Maximum number of active dimensions any sparse vector may carry.
    /// Caps the memory/compute cost of `bind`/`bundle` regardless of how
    /// many source vectors are combined.
    pub const MAX_ACTIVE: usize = 500;

    /// Number of active dimensions a freshly stamped atom carries. Kept
    /// well below `MAX_ACTIVE` so that a single `bind` between two atoms
    /// (whose symmetric difference can be up to twice this size) never
    /// hits the cap - that would silently discard elements and break
    /// `bind`'s self-inverse property, which this strategy otherwise
    /// holds exactly rather than approximately.
    const ATOM_DENSITY: usize = 32;
}

impl Default for SparseSetStrategy {
    fn default() -> Self {
        Self {
            thresholds: Thresholds {
                sim_match_high: 0.5,
                sim_match: 0.25,
                sim_weak: 0.12,
            },
        }
    }
}

fn as_sparse(v: &Vector) -> Result<&Vec<u32>> {
    match &v.data {
        VectorData::Sparse(idx) => Ok(idx),
        VectorData::Dense(_) => Err(ReasonerError::StrategyMismatch {
            expected: StrategyId::SparseSet.as_str().to_string(),
            found: StrategyId::DenseBipolar.as_str().to_string(),
        }),
    }
}

impl HdcStrategy for SparseSetStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::SparseSet
    }

    fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn create_zero(&self, geometry: usize) -> Vector {
        Vector {
            strategy: StrategyId::SparseSet,
            geometry,
            data: VectorData::Sparse(Vec::new()),
        }
    }

    fn create_from_name(&self, theory_id: &str, name: &str, geometry: usize) -> Vector {
        let mut rng = stamping_rng(theory_id, name);
        let density = Self::ATOM_DENSITY.min(geometry);
        let mut indices: Vec<u32> = if geometry == 0 {
            Vec::new()
        } else {
            sample(&mut rng, geometry, density).into_iter().map(|i| i as u32).collect()
        };
        indices.sort_unstable();
        Vector {
            strategy: StrategyId::SparseSet,
            geometry,
            data: VectorData::Sparse(indices),
        }
    }

    fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector> {
        a.check_compatible(b)?;
        let av = as_sparse(a)?;
        let bv = as_sparse(b)?;
        let a_set: std::collections::BTreeSet<u32> = av.iter().copied().collect();
        let b_set: std::collections::BTreeSet<u32> = bv.iter().copied().collect();
        let symmetric: Vec<u32> = a_set.symmetric_difference(&b_set).copied().collect();
        Ok(Vector {
            strategy: StrategyId::SparseSet,
            geometry: a.geometry,
            data: VectorData::Sparse(cap(symmetric)),
        })
    }

    fn bundle(&self, vectors: &[Vector]) -> Result<Vector> {
        if vectors.is_empty() {
            return Ok(self.create_zero(0));
        }
        let geometry = vectors[0].geometry;
        for v in &vectors[1..] {
            vectors[0].check_compatible(v)?;
        }
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for v in vectors {
            for idx in as_sparse(v)? {
                *counts.entry(*idx).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(u32, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(SparseSetStrategy::MAX_ACTIVE);
        let mut indices: Vec<u32> = ranked.into_iter().map(|(idx, _)| idx).collect();
        indices.sort_unstable();
        Ok(Vector {
            strategy: StrategyId::SparseSet,
            geometry,
            data: VectorData::Sparse(indices),
        })
    }

    fn similarity(&self, a: &Vector, b: &Vector) -> Result<f64> {
        a.check_compatible(b)?;
        let av = as_sparse(a)?;
        let bv = as_sparse(b)?;
        if av.is_empty() && bv.is_empty() {
            return Ok(1.0);
        }
        let a_set: std::collections::BTreeSet<u32> = av.iter().copied().collect();
        let b_set: std::collections::BTreeSet<u32> = bv.iter().copied().collect();
        let intersection = a_set.intersection(&b_set).count();
        let union = a_set.union(&b_set).count();
        if union == 0 {
            return Ok(1.0);
        }
        Ok(intersection as f64 / union as f64)
    }

    fn extend(&self, v: &Vector, new_geometry: usize) -> Result<Vector> {
        if new_geometry < v.geometry {
            return Err(ReasonerError::UnsupportedExtension(
                "cannot shrink a sparse-set vector's geometry".to_string(),
            ));
        }
        let idx = as_sparse(v)?.clone();
        Ok(Vector {
            strategy: StrategyId::SparseSet,
            geometry: new_geometry,
            data: VectorData::Sparse(idx),
        })
    }
}

fn cap(mut indices: Vec<u32>) -> Vec<u32> {
    indices.sort_unstable();
    indices.truncate(SparseSetStrategy::MAX_ACTIVE);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_from_name_is_deterministic() {
        let s = SparseSetStrategy::default();
        let a = s.create_from_name("t1", "dog", 4096);
        let b = s.create_from_name("t1", "dog", 4096);
        assert_eq!(a, b);
    }

    #[test]
    fn bind_is_self_inverse() {
        let s = SparseSetStrategy::default();
        let a = s.create_from_name("t1", "dog", 4096);
        let b = s.create_from_name("t1", "barks", 4096);
        let bound = s.bind(&a, &b).unwrap();
        let recovered = s.bind(&bound, &b).unwrap();
        assert_eq!(recovered, a);
    }

    #[test]
    fn similarity_of_identical_vectors_is_one() {
        let s = SparseSetStrategy::default();
        let a = s.create_from_name("t1", "dog", 4096);
        assert_eq!(s.similarity(&a, &a).unwrap(), 1.0);
    }

    #[test]
    fn bundle_respects_active_cap() {
        let s = SparseSetStrategy::default();
        let vectors: Vec<Vector> = (0..50)
            .map(|i| s.create_from_name("t1", &format!("atom{i}"), 8192))
            .collect();
        let bundled = s.bundle(&vectors).unwrap();
        match bundled.data {
            VectorData::Sparse(idx) => assert!(idx.len() <= SparseSetStrategy::MAX_ACTIVE),
            _ => panic!("expected sparse data"),
        }
    }
}
