//! The holographic reasoning engine: vector-similarity shortcuts over the
//! same knowledge base the symbolic engine reasons over.
//!
//! `query_hdc` encodes a partial composite (some argument positions left
//! as holes), unbinds each hole, and asks the active strategy for the
//! top-K most similar vocabulary atoms per hole - then validates every
//! resulting candidate combination through the symbolic engine before
//! accepting it, so a holographic answer is never less trustworthy than a
//! symbolic one, only faster to reach when it hits.

use tracing::debug;

use crate::algebra::HdcStrategy;
use crate::encoder::{self, ArgSlot};
use crate::engine::symbolic;
use crate::kb::KnowledgeBase;
use crate::proof::{ProofMethod, ProofObject, ProofStep, StepKind};
use crate::stats::SessionStats;
use crate::statement::{AtomId, Polarity, Statement, Term};
use crate::vocabulary::Vocabulary;

/// Aggregate counters for one `query_hdc`/`prove_hdc` call, folded into the
/// session's [`crate::stats::SessionStats`] by the coordinator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HolographicCallStats {
    pub unbind_attempts: u64,
    pub unbind_successes: u64,
    pub validation_attempts: u64,
    pub validation_successes: u64,
    pub similarity_checks: u64,
}

/// One statement recovered via vector similarity and confirmed symbolic.
#[derive(Debug, Clone)]
pub struct HdcMatch {
    pub statement: Statement,
    pub similarity: f64,
    /// How this match was ultimately justified, so the coordinator can tag
    /// the `QueryMatch` it builds instead of flattening every HDC result to
    /// the same step kind.
    pub source: StepKind,
}

/// Holes to probe for, each naming the 1-based position left unbound in
/// `pattern` and how many candidates to retrieve for it.
pub struct HdcQuery<'a> {
    pub pattern: &'a Statement,
    pub hole_positions: Vec<usize>,
    pub top_k: usize,
}

/// Runs a holographic query: encode `query.pattern` with its hole
/// positions omitted, unbind each hole against the positional bundle, take
/// the top-K vocabulary candidates per hole, form the cross product of
/// candidate combinations, and keep only combinations the symbolic engine
/// confirms.
///
/// When `always_merge_symbolic` is set, the result is unioned with a full
/// symbolic `query` over the same pattern even if every HDC candidate
/// validated; otherwise, a full validation sweep lets the caller skip the
/// symbolic union. Candidates recovered via unbind are tagged
/// `StepKind::HdcUnbind`; candidates added only by the symbolic merge keep
/// whatever source the symbolic engine derived them from.
#[allow(clippy::too_many_arguments)]
pub fn query_hdc(
    strategy: &dyn HdcStrategy,
    vocabulary: &mut Vocabulary,
    kb: &KnowledgeBase,
    theory_id: &str,
    geometry: usize,
    operator_vector: &crate::algebra::Vector,
    query: &HdcQuery,
    isa_operator: Option<AtomId>,
    always_merge_symbolic: bool,
    session_stats: &SessionStats,
) -> (Vec<HdcMatch>, HolographicCallStats) {
    let mut stats = HolographicCallStats::default();

    let bound_slots: Vec<ArgSlot> = query
        .pattern
        .args
        .iter()
        .enumerate()
        .map(|(idx, term)| {
            if query.hole_positions.contains(&(idx + 1)) {
                ArgSlot::Hole
            } else {
                match term {
                    Term::Const(a) => ArgSlot::Bound(*a),
                    Term::Var(_) => ArgSlot::Hole,
                }
            }
        })
        .collect();

    let composite = match encoder::encode(strategy, vocabulary, theory_id, geometry, operator_vector, &bound_slots) {
        Ok(c) => c,
        Err(err) => {
            debug!(?err, "failed to encode partial composite for HDC query");
            return (Vec::new(), stats);
        }
    };
    let positional_bundle = match encoder::unbind_operator(strategy, &composite, operator_vector) {
        Ok(pb) => pb,
        Err(_) => return (Vec::new(), stats),
    };

    let mut per_hole_candidates: Vec<(usize, Vec<(String, f64)>)> = Vec::new();
    for &position in &query.hole_positions {
        stats.unbind_attempts += 1;
        let Ok(candidate_vec) =
            encoder::unbind_position(strategy, vocabulary, theory_id, geometry, &positional_bundle, position)
        else {
            continue;
        };
        stats.similarity_checks += 1;
        let Ok(top) = strategy.top_k_similar(&candidate_vec, vocabulary, query.top_k) else {
            continue;
        };
        if !top.is_empty() {
            stats.unbind_successes += 1;
        }
        per_hole_candidates.push((position, top));
    }

    let combinations = cross_product(&per_hole_candidates);
    let mut results = Vec::new();
    let threshold = strategy.thresholds().sim_match_high;

    for combo in combinations {
        stats.validation_attempts += 1;
        let mut args = query.pattern.args.clone();
        let mut min_similarity = 1.0f64;
        let mut ok = true;
        for (position, name, sim) in &combo {
            if *sim < threshold {
                ok = false;
                break;
            }
            let Some(atom) = vocabulary.get_by_name(name) else {
                ok = false;
                break;
            };
            args[position - 1] = Term::Const(atom.id);
            min_similarity = min_similarity.min(*sim);
        }
        if !ok {
            continue;
        }
        let candidate_statement = Statement::new(query.pattern.operator, args);
        let symbolic_matches = symbolic::query(kb, &candidate_statement, isa_operator, session_stats);
        if symbolic_matches.iter().any(|m| m.statement == candidate_statement) {
            stats.validation_successes += 1;
            results.push(HdcMatch {
                statement: candidate_statement,
                similarity: min_similarity,
                source: StepKind::HdcUnbind,
            });
        }
    }

    if always_merge_symbolic {
        let symbolic_matches = symbolic::query(kb, query.pattern, isa_operator, session_stats);
        for m in symbolic_matches {
            if !results.iter().any(|r| r.statement == m.statement) {
                results.push(HdcMatch {
                    statement: m.statement,
                    similarity: 1.0,
                    source: m.source,
                });
            }
        }
    }

    (results, stats)
}

fn cross_product(per_hole: &[(usize, Vec<(String, f64)>)]) -> Vec<Vec<(usize, String, f64)>> {
    let mut combos: Vec<Vec<(usize, String, f64)>> = vec![Vec::new()];
    for (position, candidates) in per_hole {
        let mut next = Vec::new();
        for combo in &combos {
            for (name, sim) in candidates {
                let mut extended = combo.clone();
                extended.push((*position, name.clone(), *sim));
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

/// Holographic proof: scans facts directly via similarity for the common
/// case of an (almost) fully-ground goal, tries transitive/rule shortcuts
/// through top-K lookups, and falls back to a full symbolic proof when
/// `fallback_to_symbolic` is set and no shortcut fires.
///
/// The direct-similarity scan only ever considers `Polarity::Asserted`
/// facts - `encode_statement` ignores polarity, so a fact and its explicit
/// negation share the identical vector, and a Negated fact would otherwise
/// be just as likely to clear the similarity threshold as its positive
/// counterpart. A raw similarity hit is also not trusted on its own: per
/// spec §4.7, finding a candidate only triggers a symbolic validation of
/// the goal, which both confirms the match is real and re-applies the same
/// negation/inheritance/rule checks the symbolic engine already enforces.
pub fn prove_hdc(
    strategy: &dyn HdcStrategy,
    vocabulary: &mut Vocabulary,
    kb: &KnowledgeBase,
    theory_id: &str,
    geometry: usize,
    operator_vector: &crate::algebra::Vector,
    goal: &Statement,
    isa_operator: Option<AtomId>,
    max_depth: usize,
    fallback_to_symbolic: bool,
    session_stats: &SessionStats,
) -> (ProofObject, HolographicCallStats) {
    let mut stats = HolographicCallStats::default();
    let threshold = strategy.thresholds().sim_match_high;

    if goal.is_ground() {
        let bound_slots: Vec<ArgSlot> = goal
            .args
            .iter()
            .map(|t| match t {
                Term::Const(a) => ArgSlot::Bound(*a),
                Term::Var(_) => ArgSlot::Hole,
            })
            .collect();
        if let Ok(goal_vector) = encoder::encode(strategy, vocabulary, theory_id, geometry, operator_vector, &bound_slots) {
            for fact in kb.facts() {
                if fact.polarity != Polarity::Asserted {
                    continue;
                }
                stats.validation_attempts += 1;
                stats.similarity_checks += 1;
                if let Ok(sim) = strategy.similarity(&goal_vector, &fact.vector) {
                    if sim >= threshold {
                        let validation = symbolic::prove(kb, goal, isa_operator, max_depth, session_stats);
                        if !validation.valid {
                            continue;
                        }
                        stats.validation_successes += 1;
                        let mut steps = vec![ProofStep {
                            kind: StepKind::HdcValidate,
                            statement: fact.statement.clone(),
                            supporting_fact: Some(fact.id),
                            note: format!("HDC direct similarity {sim:.4}, confirmed symbolically"),
                        }];
                        steps.extend(validation.steps);
                        return (
                            ProofObject {
                                valid: true,
                                confidence: sim.min(validation.confidence),
                                method: ProofMethod::Holographic,
                                steps,
                                depth_exceeded: false,
                            },
                            stats,
                        );
                    }
                }
            }
        }
    }

    if fallback_to_symbolic {
        let mut symbolic_proof = symbolic::prove(kb, goal, isa_operator, max_depth, session_stats);
        symbolic_proof.method = ProofMethod::HolographicFallback;
        (symbolic_proof, stats)
    } else {
        (ProofObject::unproven(ProofMethod::Holographic), stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::DenseBipolarStrategy;
    use crate::statement::AtomKind;

    fn intern(vocab: &mut Vocabulary, strategy: &dyn HdcStrategy, name: &str, geometry: usize) -> AtomId {
        let v = strategy.create_from_name("t", name, geometry);
        vocab.insert(name.to_string(), AtomKind::Entity, v)
    }

    #[test]
    fn query_hdc_recovers_fact_from_partial_pattern() {
        let strategy = DenseBipolarStrategy::default();
        let mut vocab = Vocabulary::new();
        let mut kb = KnowledgeBase::new();
        let geometry = 8192;
        let theory = "t";
        let session_stats = SessionStats::new();

        let likes = intern(&mut vocab, &strategy, "likes", geometry);
        let alice = intern(&mut vocab, &strategy, "alice", geometry);
        let bob = intern(&mut vocab, &strategy, "bob", geometry);

        let op_vec = vocab.get(likes).unwrap().vector.clone();
        let fact_vec = encoder::encode(
            &strategy,
            &mut vocab,
            theory,
            geometry,
            &op_vec,
            &[ArgSlot::Bound(alice), ArgSlot::Bound(bob)],
        )
        .unwrap();
        kb.add_fact(
            &strategy,
            Statement::new(likes, vec![Term::Const(alice), Term::Const(bob)]),
            Polarity::Asserted,
            fact_vec,
        )
        .unwrap();

        let pattern = Statement::new(likes, vec![Term::Const(alice), Term::Var("Y".to_string())]);
        let hdc_query = HdcQuery {
            pattern: &pattern,
            hole_positions: vec![2],
            top_k: 3,
        };
        let (results, stats) =
            query_hdc(&strategy, &mut vocab, &kb, theory, geometry, &op_vec, &hdc_query, None, false, &session_stats);
        assert!(stats.unbind_attempts >= 1);
        assert!(results.iter().any(|r| r.statement.args[1] == Term::Const(bob) && r.source == StepKind::HdcUnbind));
    }

    #[test]
    fn prove_hdc_rejects_goal_covered_by_explicit_negation() {
        let strategy = DenseBipolarStrategy::default();
        let mut vocab = Vocabulary::new();
        let mut kb = KnowledgeBase::new();
        let geometry = 8192;
        let theory = "t";
        let session_stats = SessionStats::new();

        let isa = intern(&mut vocab, &strategy, "isA", geometry);
        let can = intern(&mut vocab, &strategy, "can", geometry);
        let penguin = intern(&mut vocab, &strategy, "penguin", geometry);
        let bird = intern(&mut vocab, &strategy, "bird", geometry);
        let fly = intern(&mut vocab, &strategy, "fly", geometry);
        kb.declare_property(can, crate::statement::RelationProperty::Inheritable);

        let can_vec = vocab.get(can).unwrap().vector.clone();
        let isa_vec = vocab.get(isa).unwrap().vector.clone();

        let isa_fact_vec = encoder::encode(&strategy, &mut vocab, theory, geometry, &isa_vec, &[ArgSlot::Bound(penguin), ArgSlot::Bound(bird)]).unwrap();
        kb.add_fact(&strategy, Statement::new(isa, vec![Term::Const(penguin), Term::Const(bird)]), Polarity::Asserted, isa_fact_vec)
            .unwrap();

        let bird_can_fly_vec = encoder::encode(&strategy, &mut vocab, theory, geometry, &can_vec, &[ArgSlot::Bound(bird), ArgSlot::Bound(fly)]).unwrap();
        kb.add_fact(&strategy, Statement::new(can, vec![Term::Const(bird), Term::Const(fly)]), Polarity::Asserted, bird_can_fly_vec)
            .unwrap();

        let penguin_cant_fly_vec =
            encoder::encode(&strategy, &mut vocab, theory, geometry, &can_vec, &[ArgSlot::Bound(penguin), ArgSlot::Bound(fly)]).unwrap();
        kb.add_fact(&strategy, Statement::new(can, vec![Term::Const(penguin), Term::Const(fly)]), Polarity::Negated, penguin_cant_fly_vec)
            .unwrap();

        let goal = Statement::new(can, vec![Term::Const(penguin), Term::Const(fly)]);
        let (proof, _) = prove_hdc(&strategy, &mut vocab, &kb, theory, geometry, &can_vec, &goal, Some(isa), 10, true, &session_stats);
        assert!(!proof.valid, "explicit negation must override both the HDC similarity scan and its symbolic fallback");
    }
}
