//! Dense bipolar strategy: the default algebra.
//!
//! Vectors are `geometry`-dimensional arrays of `+1`/`-1`. `bind` is
//! dimension-wise multiplication (self-inverse), `bundle` is a majority
//! vote with ties broken deterministically towards `+1`, and similarity is
//! one minus the normalized Hamming distance.

use rand::RngCore;

use super::{stamping_rng, HdcStrategy, StrategyId, Thresholds, Vector, VectorData};
use crate::error::{ReasonerError, Result};
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Copy)]
pub struct DenseBipolarStrategy {
    thresholds: Thresholds,
}

impl Default for DenseBipolarStrategy {
    fn default() -> Self {
        Self {
            thresholds: Thresholds {
                sim_match_high: 0.85,
                sim_match: 0.65,
                sim_weak: 0.55,
            },
        }
    }
}

fn as_dense(v: &Vector) -> Result<&Vec<i8>> {
    match &v.data {
        VectorData::Dense(bits) => Ok(bits),
        VectorData::Sparse(_) => Err(ReasonerError::StrategyMismatch {
            expected: StrategyId::DenseBipolar.as_str().to_string(),
            found: StrategyId::SparseSet.as_str().to_string(),
        }),
    }
}

impl HdcStrategy for DenseBipolarStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::DenseBipolar
    }

    fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn create_zero(&self, geometry: usize) -> Vector {
        Vector {
            strategy: StrategyId::DenseBipolar,
            geometry,
            data: VectorData::Dense(vec![0i8; geometry]),
        }
    }

    fn create_from_name(&self, theory_id: &str, name: &str, geometry: usize) -> Vector {
        let mut rng = stamping_rng(theory_id, name);
        let mut bits = Vec::with_capacity(geometry);
        for _ in 0..geometry {
            bits.push(if rng.next_u32() & 1 == 0 { 1i8 } else { -1i8 });
        }
        Vector {
            strategy: StrategyId::DenseBipolar,
            geometry,
            data: VectorData::Dense(bits),
        }
    }

    fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector> {
        a.check_compatible(b)?;
        let av = as_dense(a)?;
        let bv = as_dense(b)?;
        let bits = av.iter().zip(bv.iter()).map(|(x, y)| x * y).collect();
        Ok(Vector {
            strategy: StrategyId::DenseBipolar,
            geometry: a.geometry,
            data: VectorData::Dense(bits),
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
        let mut sums = vec![0i32; geometry];
        for v in vectors {
            let bits = as_dense(v)?;
            for (sum, bit) in sums.iter_mut().zip(bits.iter()) {
                *sum += *bit as i32;
            }
        }
        // Majority vote; ties (sum == 0) resolve to +1 deterministically.
        let bits = sums.into_iter().map(|s| if s >= 0 { 1i8 } else { -1i8 }).collect();
        Ok(Vector {
            strategy: StrategyId::DenseBipolar,
            geometry,
            data: VectorData::Dense(bits),
        })
    }

    fn similarity(&self, a: &Vector, b: &Vector) -> Result<f64> {
        a.check_compatible(b)?;
        let av = as_dense(a)?;
        let bv = as_dense(b)?;
        if av.is_empty() {
            return Ok(1.0);
        }
        let agree = av.iter().zip(bv.iter()).filter(|(x, y)| x == y).count();
        Ok(agree as f64 / av.len() as f64)
    }

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

    fn extend(&self, v: &Vector, new_geometry: usize) -> Result<Vector> {
        if new_geometry < v.geometry {
            return Err(ReasonerError::UnsupportedExtension(
                "cannot shrink a dense-bipolar vector's geometry".to_string(),
            ));
        }
        let mut bits = as_dense(v)?.clone();
        bits.resize(new_geometry, 1i8);
        Ok(Vector {
            strategy: StrategyId::DenseBipolar,
            geometry: new_geometry,
            data: VectorData::Dense(bits),
        })
    }
}
