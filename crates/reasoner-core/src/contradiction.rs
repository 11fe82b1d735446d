//! Contradiction detection.
//!
//! Two sources of contradiction are checked before a fact is committed to
//! the knowledge base: an explicit negation of the same ground statement
//! already asserted (or vice versa), and membership in a declared mutual
//! exclusion group alongside another already-asserted member. Both checks
//! run inside `Session::learn`'s transactional boundary - nothing is
//! inserted into the knowledge base unless every check passes.

use crate::engine::symbolic::{unify, Substitution};
use crate::kb::KnowledgeBase;
use crate::statement::{FactId, Polarity, Statement};

/// Returns the id of the first existing fact that contradicts the
/// candidate statement/polarity pair, if any.
pub fn find_contradiction(kb: &KnowledgeBase, statement: &Statement, polarity: Polarity) -> Option<FactId> {
    if let Some(existing) = explicit_negation_conflict(kb, statement, polarity) {
        return Some(existing);
    }
    mutual_exclusion_conflict(kb, statement, polarity)
}

fn explicit_negation_conflict(kb: &KnowledgeBase, statement: &Statement, polarity: Polarity) -> Option<FactId> {
    let opposite = match polarity {
        Polarity::Asserted => Polarity::Negated,
        Polarity::Negated => Polarity::Asserted,
    };
    kb.find_exact(statement).and_then(|fact| {
        if fact.polarity == opposite {
            Some(fact.id)
        } else {
            None
        }
    })
}

/// Two patterns in the same group conflict for a given (candidate,
/// existing-fact) pair only when they bind any *shared* variable (e.g. the
/// subject `X` in `hasState(X, open)` / `hasState(X, closed)`) to the same
/// value on both sides. Without this check, two facts about unrelated
/// subjects that each happen to match a distinct pattern in the group
/// would be flagged as contradictory, which is not what "mutually
/// exclusive" means.
fn bindings_agree(a: &Substitution, b: &Substitution) -> bool {
    a.iter().all(|(var, value)| match b.get(var) {
        Some(other) => value == other,
        None => true,
    })
}

fn mutual_exclusion_conflict(kb: &KnowledgeBase, statement: &Statement, polarity: Polarity) -> Option<FactId> {
    if polarity != Polarity::Asserted {
        return None;
    }
    for group in kb.mutual_exclusions() {
        for (i, pattern_i) in group.patterns.iter().enumerate() {
            let Some(subst_i) = unify(pattern_i, statement, &Substitution::new()) else {
                continue;
            };
            for (j, pattern_j) in group.patterns.iter().enumerate() {
                if i == j {
                    continue;
                }
                for fact in kb.facts() {
                    if fact.polarity != Polarity::Asserted || &fact.statement == statement {
                        continue;
                    }
                    let Some(subst_j) = unify(pattern_j, &fact.statement, &Substitution::new()) else {
                        continue;
                    };
                    if bindings_agree(&subst_i, &subst_j) {
                        return Some(fact.id);
                    }
                }
            }
        }
    }
    None
}
