//! Reasoning coordinator: dispatches `query`/`prove` to the symbolic or
//! holographic engine per the session's configured priority, and folds
//! each call's local stats into the session-wide [`SessionStats`].

use crate::algebra::HdcStrategy;
use crate::config::{ReasoningPriority, SessionConfig};
use crate::engine::holographic::{self, HdcQuery};
use crate::engine::symbolic::{self, QueryMatch};
use crate::kb::KnowledgeBase;
use crate::proof::ProofObject;
use crate::stats::SessionStats;
use crate::statement::{AtomId, Statement};
use crate::vocabulary::Vocabulary;

/// Owns no state of its own beyond the dispatch policy; the knowledge
/// base, vocabulary and stats it operates over all live on the
/// [`crate::session::Session`] that calls it.
#[derive(Debug, Default)]
pub struct ReasoningCoordinator;

impl ReasoningCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Runs a full query (symbolic always; holographic additionally, per
    /// priority and `hole_positions`) and returns the matches the engine
    /// selected as primary.
    #[allow(clippy::too_many_arguments)]
    pub fn query(
        &self,
        strategy: &dyn HdcStrategy,
        vocabulary: &mut Vocabulary,
        kb: &KnowledgeBase,
        config: &SessionConfig,
        theory_id: &str,
        pattern: &Statement,
        hole_positions: &[usize],
        isa_operator: Option<AtomId>,
        stats: &SessionStats,
    ) -> Vec<QueryMatch> {
        stats.queries.set(stats.queries.get() + 1);

        let run_symbolic = || {
            stats.kb_scans.set(stats.kb_scans.get() + 1);
            symbolic::query(kb, pattern, isa_operator, stats)
        };

        if hole_positions.is_empty() {
            return run_symbolic();
        }

        match config.reasoning_priority {
            ReasoningPriority::Symbolic => run_symbolic(),
            ReasoningPriority::Holographic => {
                stats.hdc_queries.set(stats.hdc_queries.get() + 1);
                let Some(op_atom) = vocabulary.get(pattern.operator) else {
                    return run_symbolic();
                };
                let op_vector = op_atom.vector.clone();
                let hdc_query = HdcQuery {
                    pattern,
                    hole_positions: hole_positions.to_vec(),
                    top_k: config.hdc_top_k,
                };
                let (hdc_matches, call_stats) = holographic::query_hdc(
                    strategy,
                    vocabulary,
                    kb,
                    theory_id,
                    config.geometry,
                    &op_vector,
                    &hdc_query,
                    isa_operator,
                    config.always_merge_symbolic,
                    stats,
                );
                fold_hdc_stats(stats, call_stats);
                if !hdc_matches.is_empty() {
                    stats.hdc_successes.set(stats.hdc_successes.get() + 1);
                }
                hdc_matches
                    .into_iter()
                    .map(|m| QueryMatch {
                        statement: m.statement,
                        source: m.source,
                        confidence: m.similarity,
                    })
                    .collect()
            }
        }
    }

    /// Runs a proof per the session's priority, falling back to the other
    /// engine according to `config.fallback_to_symbolic`.
    #[allow(clippy::too_many_arguments)]
    pub fn prove(
        &self,
        strategy: &dyn HdcStrategy,
        vocabulary: &mut Vocabulary,
        kb: &KnowledgeBase,
        config: &SessionConfig,
        theory_id: &str,
        goal: &Statement,
        isa_operator: Option<AtomId>,
        stats: &SessionStats,
    ) -> ProofObject {
        stats.proofs.set(stats.proofs.get() + 1);

        let proof = match config.reasoning_priority {
            ReasoningPriority::Symbolic => symbolic::prove(kb, goal, isa_operator, config.max_proof_depth, stats),
            ReasoningPriority::Holographic => {
                let Some(op_atom) = vocabulary.get(goal.operator) else {
                    return symbolic::prove(kb, goal, isa_operator, config.max_proof_depth, stats);
                };
                let op_vector = op_atom.vector.clone();
                let (proof, call_stats) = holographic::prove_hdc(
                    strategy,
                    vocabulary,
                    kb,
                    theory_id,
                    config.geometry,
                    &op_vector,
                    goal,
                    isa_operator,
                    config.max_proof_depth,
                    config.fallback_to_symbolic,
                    stats,
                );
                fold_hdc_stats(stats, call_stats);
                if proof.method == crate::proof::ProofMethod::HolographicFallback {
                    stats.symbolic_proof_fallbacks.set(stats.symbolic_proof_fallbacks.get() + 1);
                }
                proof
            }
        };

        if proof.valid {
            stats.hdc_proof_successes.set(
                stats.hdc_proof_successes.get()
                    + u64::from(matches!(
                        proof.method,
                        crate::proof::ProofMethod::Holographic | crate::proof::ProofMethod::HolographicFallback
                    )),
            );
        }
        stats.total_proof_steps.set(stats.total_proof_steps.get() + proof.steps.len() as u64);
        stats.record_proof_depth(proof.steps.len() as u64);
        proof
    }
}

fn fold_hdc_stats(stats: &SessionStats, call: crate::engine::holographic::HolographicCallStats) {
    stats
        .hdc_unbind_attempts
        .set(stats.hdc_unbind_attempts.get() + call.unbind_attempts);
    stats
        .hdc_unbind_successes
        .set(stats.hdc_unbind_successes.get() + call.unbind_successes);
    stats
        .hdc_validation_attempts
        .set(stats.hdc_validation_attempts.get() + call.validation_attempts);
    stats
        .hdc_validation_successes
        .set(stats.hdc_validation_successes.get() + call.validation_successes);
    stats
        .similarity_checks
        .set(stats.similarity_checks.get() + call.similarity_checks);
}
