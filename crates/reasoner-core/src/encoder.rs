//! Statement encoder: turns a `Statement` into a single composite vector.
//!
//! The encoding is `bind(op, bundle(bind(pos_i, arg_i) for each bound
//! position i))`. Holes (missing positions) are simply omitted from the
//! bundle rather than bound to a placeholder, so a partial composite -
//! encoding a statement with some arguments unknown - is itself a valid
//! vector the holographic engine can probe.
//!
//! Because `bind` is self-inverse, unbinding the operator from a composite
//! recovers the positional bundle exactly; unbinding a given position's
//! stamp from that bundle then recovers an *approximate* candidate for the
//! argument that filled it, since the bundle also carries the (cancelled
//! but noise-contributing) contributions of every other bound position.

use crate::algebra::{HdcStrategy, Vector};
use crate::error::Result;
use crate::stamping::position_atom_name;
use crate::statement::AtomId;
use crate::vocabulary::Vocabulary;

/// One argument slot as seen by the encoder: either bound to a concrete
/// atom, or an empty hole to be filled later.
#[derive(Debug, Clone, Copy)]
pub enum ArgSlot {
    Bound(AtomId),
    Hole,
}

/// Returns the position vector for 1-based `position`, creating and
/// interning it in `vocabulary` on first use.
pub fn position_vector(
    strategy: &dyn HdcStrategy,
    vocabulary: &mut Vocabulary,
    theory_id: &str,
    geometry: usize,
    position: usize,
) -> Vector {
    let name = position_atom_name(position);
    if let Some(atom) = vocabulary.get_by_name(&name) {
        return atom.vector.clone();
    }
    let vector = strategy.create_from_name(theory_id, &name, geometry);
    vocabulary.insert(name, crate::statement::AtomKind::Position, vector.clone());
    vector
}

/// Encodes `operator(args...)` into a single composite vector, skipping
/// any [`ArgSlot::Hole`] entries.
pub fn encode(
    strategy: &dyn HdcStrategy,
    vocabulary: &mut Vocabulary,
    theory_id: &str,
    geometry: usize,
    operator: &Vector,
    args: &[ArgSlot],
) -> Result<Vector> {
    let mut bound_terms = Vec::with_capacity(args.len());
    for (idx, slot) in args.iter().enumerate() {
        if let ArgSlot::Bound(atom_id) = slot {
            let pos_vec = position_vector(strategy, vocabulary, theory_id, geometry, idx + 1);
            let arg_vec = vocabulary
                .get(*atom_id)
                .expect("ArgSlot::Bound must reference an interned atom")
                .vector
                .clone();
            bound_terms.push(strategy.bind(&pos_vec, &arg_vec)?);
        }
    }
    let positional_bundle = if bound_terms.is_empty() {
        strategy.create_zero(geometry)
    } else {
        strategy.bundle(&bound_terms)?
    };
    strategy.bind(operator, &positional_bundle)
}

/// Recovers the positional bundle from a composite by unbinding the
/// operator. Exact (not approximate), since `bind` is self-inverse and the
/// operator was bound exactly once.
pub fn unbind_operator(strategy: &dyn HdcStrategy, composite: &Vector, operator: &Vector) -> Result<Vector> {
    strategy.bind(composite, operator)
}

/// Recovers an approximate candidate vector for the argument that filled
/// `position` (1-based), given the positional bundle already unbound from
/// the operator.
pub fn unbind_position(
    strategy: &dyn HdcStrategy,
    vocabulary: &mut Vocabulary,
    theory_id: &str,
    geometry: usize,
    positional_bundle: &Vector,
    position: usize,
) -> Result<Vector> {
    let pos_vec = position_vector(strategy, vocabulary, theory_id, geometry, position);
    strategy.bind(positional_bundle, &pos_vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::DenseBipolarStrategy;
    use crate::statement::AtomKind;

    fn intern(vocab: &mut Vocabulary, strategy: &dyn HdcStrategy, theory: &str, geometry: usize, name: &str) -> AtomId {
        let v = strategy.create_from_name(theory, name, geometry);
        vocab.insert(name.to_string(), AtomKind::Entity, v)
    }

    #[test]
    fn encoding_is_invertible_per_position() {
        let strategy = DenseBipolarStrategy::default();
        let mut vocab = Vocabulary::new();
        let geometry = 8192;
        let theory = "t1";

        let likes = intern(&mut vocab, &strategy, theory, geometry, "likes");
        let alice = intern(&mut vocab, &strategy, theory, geometry, "alice");
        let bob = intern(&mut vocab, &strategy, theory, geometry, "bob");

        let op_vec = vocab.get(likes).unwrap().vector.clone();
        let composite = encode(
            &strategy,
            &mut vocab,
            theory,
            geometry,
            &op_vec,
            &[ArgSlot::Bound(alice), ArgSlot::Bound(bob)],
        )
        .unwrap();

        let positional_bundle = unbind_operator(&strategy, &composite, &op_vec).unwrap();
        let candidate_1 = unbind_position(&strategy, &mut vocab, theory, geometry, &positional_bundle, 1).unwrap();
        let candidate_2 = unbind_position(&strategy, &mut vocab, theory, geometry, &positional_bundle, 2).unwrap();

        let sim_alice = strategy.similarity(&candidate_1, &vocab.get(alice).unwrap().vector).unwrap();
        let sim_bob = strategy.similarity(&candidate_2, &vocab.get(bob).unwrap().vector).unwrap();
        assert!(sim_alice > strategy.thresholds().sim_match_high, "sim_alice={sim_alice}");
        assert!(sim_bob > strategy.thresholds().sim_match_high, "sim_bob={sim_bob}");
    }

    #[test]
    fn holes_are_omitted_from_the_composite() {
        let strategy = DenseBipolarStrategy::default();
        let mut vocab = Vocabulary::new();
        let geometry = 4096;
        let theory = "t1";
        let likes = intern(&mut vocab, &strategy, theory, geometry, "likes");
        let alice = intern(&mut vocab, &strategy, theory, geometry, "alice");
        let op_vec = vocab.get(likes).unwrap().vector.clone();

        let full = encode(&strategy, &mut vocab, theory, geometry, &op_vec, &[ArgSlot::Bound(alice), ArgSlot::Hole]).unwrap();
        let partial = encode(&strategy, &mut vocab, theory, geometry, &op_vec, &[ArgSlot::Bound(alice)]).unwrap();
        assert_eq!(full, partial);
    }
}
