//! The symbolic reasoning engine: exact-match, transitive, inheritance and
//! rule-backed query and proof, over ground facts and Horn-style rules.
//!
//! Unification here is deliberately simple - terms are either constants or
//! variables, with no nested function terms - which keeps `unify`,
//! `apply_substitution` and `rename_variables` small and total. This
//! mirrors the unification style in the teacher's agent-level reasoner
//! rather than its richer, function-term-capable tabling engine.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::kb::KnowledgeBase;
use crate::proof::{ProofMethod, ProofObject, ProofStep, StepKind};
use crate::stats::SessionStats;
use crate::statement::{AtomId, Polarity, Statement, Term};

/// The reserved operator name used for `isA` property-inheritance edges.
pub const ISA_OPERATOR: &str = "isA";

/// A variable binding built up while unifying patterns against facts or
/// rule premises against each other.
pub type Substitution = HashMap<String, Term>;

/// Attempts to unify two statements, extending `subst`. Returns `None` on
/// failure, leaving `subst` as it was (callers clone before attempting).
pub fn unify(a: &Statement, b: &Statement, subst: &Substitution) -> Option<Substitution> {
    if a.operator != b.operator || a.args.len() != b.args.len() {
        return None;
    }
    let mut subst = subst.clone();
    for (ta, tb) in a.args.iter().zip(b.args.iter()) {
        subst = unify_terms(ta, tb, &subst)?;
    }
    Some(subst)
}

fn resolve<'a>(term: &'a Term, subst: &'a Substitution) -> &'a Term {
    let mut current = term;
    while let Term::Var(name) = current {
        match subst.get(name) {
            Some(next) if next != current => current = next,
            _ => break,
        }
    }
    current
}

fn unify_terms(a: &Term, b: &Term, subst: &Substitution) -> Option<Substitution> {
    let ra = resolve(a, subst).clone();
    let rb = resolve(b, subst).clone();
    match (&ra, &rb) {
        (Term::Const(x), Term::Const(y)) => {
            if x == y {
                Some(subst.clone())
            } else {
                None
            }
        }
        (Term::Var(name), other) | (other, Term::Var(name)) => {
            let mut subst = subst.clone();
            subst.insert(name.clone(), other.clone());
            Some(subst)
        }
    }
}

/// Substitutes bound variables in `stmt`, following chains to a constant
/// (or leaving an unbound variable as-is).
pub fn apply_substitution(stmt: &Statement, subst: &Substitution) -> Statement {
    let args = stmt
        .args
        .iter()
        .map(|t| resolve(t, subst).clone())
        .collect();
    Statement {
        operator: stmt.operator,
        args,
    }
}

/// Renames every variable in `stmt` by appending `suffix`, so that two
/// instantiations of the same rule never capture each other's bindings.
pub fn rename_variables(stmt: &Statement, suffix: usize) -> Statement {
    let args = stmt
        .args
        .iter()
        .map(|t| match t {
            Term::Var(name) => Term::Var(format!("{name}#{suffix}")),
            Term::Const(a) => Term::Const(*a),
        })
        .collect();
    Statement {
        operator: stmt.operator,
        args,
    }
}

/// One statement produced by [`query`], tagged with how it was derived.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub statement: Statement,
    pub source: StepKind,
    pub confidence: f64,
}

/// Runs the five fused query sources over `pattern` and returns every
/// ground statement the knowledge base can support, after filtering out
/// anything explicitly negated.
///
/// Sources, in fusion order: direct fact match, transitive-relation
/// expansion, `isA` property inheritance, rule derivation via unification,
/// then a negation filter pass over the union of the first four.
pub fn query(kb: &KnowledgeBase, pattern: &Statement, isa_operator: Option<AtomId>, stats: &SessionStats) -> Vec<QueryMatch> {
    let mut matches = Vec::new();

    direct_matches(kb, pattern, &mut matches);
    if kb.is_transitive(pattern.operator) {
        transitive_matches(kb, pattern, &mut matches, stats);
    }
    if let Some(isa) = isa_operator {
        if kb.is_inheritable(pattern.operator) {
            inheritance_matches(kb, pattern, isa, &mut matches);
        }
    }
    rule_matches(kb, pattern, isa_operator, &mut matches, 0, stats);

    dedup_and_filter_negated(kb, matches)
}

fn direct_matches(kb: &KnowledgeBase, pattern: &Statement, out: &mut Vec<QueryMatch>) {
    let candidates: Vec<_> = match kb.component_index().by_operator.get(&pattern.operator) {
        Some(ids) => ids.clone(),
        None => return,
    };
    for id in candidates {
        let fact = kb.get_fact(id).expect("indexed fact id must exist");
        if fact.polarity != Polarity::Asserted {
            continue;
        }
        if unify(pattern, &fact.statement, &Substitution::new()).is_some() {
            out.push(QueryMatch {
                statement: fact.statement.clone(),
                source: StepKind::Direct,
                confidence: 1.0,
            });
        }
    }
}

/// Expands a binary transitive relation `R(a, b)` by following chains
/// `R(a, x1), R(x1, x2), ..., R(xn, b)` already present as facts. Each edge
/// hop walked counts as one `transitive_steps` stat, whether or not it ends
/// up unifying with `pattern`.
fn transitive_matches(kb: &KnowledgeBase, pattern: &Statement, out: &mut Vec<QueryMatch>, stats: &SessionStats) {
    if pattern.arity() != 2 {
        return;
    }
    let mut edges: HashMap<AtomId, Vec<AtomId>> = HashMap::new();
    if let Some(ids) = kb.component_index().by_operator.get(&pattern.operator) {
        for id in ids {
            let fact = kb.get_fact(*id).expect("indexed fact id must exist");
            if fact.polarity != Polarity::Asserted {
                continue;
            }
            if let [Term::Const(a), Term::Const(b)] = fact.statement.args.as_slice() {
                edges.entry(*a).or_default().push(*b);
            }
        }
    }

    let starts: Vec<AtomId> = match &pattern.args.first() {
        Some(Term::Const(a)) => vec![*a],
        _ => edges.keys().copied().collect(),
    };

    for start in starts {
        let mut visited = HashSet::new();
        let mut frontier = vec![start];
        while let Some(node) = frontier.pop() {
            if let Some(next_nodes) = edges.get(&node) {
                for &next in next_nodes {
                    if visited.insert(next) {
                        stats.transitive_steps.set(stats.transitive_steps.get() + 1);
                        let derived = Statement::new(pattern.operator, vec![Term::Const(start), Term::Const(next)]);
                        if unify(pattern, &derived, &Substitution::new()).is_some() {
                            out.push(QueryMatch {
                                statement: derived,
                                source: StepKind::Transitive,
                                confidence: 1.0,
                            });
                        }
                        frontier.push(next);
                    }
                }
            }
        }
    }
}

/// Expands `pattern` across `isA` edges: if `X isA Y` and `property(Y,
/// ...)` holds, then `property(X, ...)` holds too, for properties declared
/// inheritable.
fn inheritance_matches(kb: &KnowledgeBase, pattern: &Statement, isa: AtomId, out: &mut Vec<QueryMatch>) {
    let subject = match pattern.args.first() {
        Some(Term::Const(a)) => *a,
        _ => return,
    };
    let mut ancestors = vec![subject];
    let mut visited: HashSet<AtomId> = HashSet::new();
    while let Some(current) = ancestors.pop() {
        if !visited.insert(current) {
            continue;
        }
        if let Some(ids) = kb.component_index().by_arg_at_position.get(&(0, current)) {
            for id in ids.clone() {
                let fact = kb.get_fact(id).expect("indexed fact id must exist");
                if fact.statement.operator != isa || fact.polarity != Polarity::Asserted {
                    continue;
                }
                if let Some(Term::Const(parent)) = fact.statement.args.get(1) {
                    let mut candidate_args = pattern.args.clone();
                    candidate_args[0] = Term::Const(*parent);
                    let probe = Statement::new(pattern.operator, candidate_args);
                    direct_matches_into(kb, &probe, out, subject);
                    ancestors.push(*parent);
                }
            }
        }
    }
}

fn direct_matches_into(kb: &KnowledgeBase, probe: &Statement, out: &mut Vec<QueryMatch>, original_subject: AtomId) {
    if let Some(ids) = kb.component_index().by_operator.get(&probe.operator) {
        for id in ids.clone() {
            let fact = kb.get_fact(id).expect("indexed fact id must exist");
            if fact.polarity != Polarity::Asserted {
                continue;
            }
            if unify(probe, &fact.statement, &Substitution::new()).is_some() {
                let mut derived_args = fact.statement.args.clone();
                derived_args[0] = Term::Const(original_subject);
                out.push(QueryMatch {
                    statement: Statement::new(probe.operator, derived_args),
                    source: StepKind::Inheritance,
                    confidence: 1.0,
                });
            }
        }
    }
}

/// Derives matches for `pattern` by unifying it against rule conclusions
/// and recursively satisfying the rule's premises (one level of forward
/// derivation per query call; deeper chains are handled by repeated calls
/// during `prove`'s backward search). Every rule whose conclusion operator
/// matches `pattern.operator` counts as one `rule_attempts` stat, whether
/// or not its conclusion actually unifies.
fn rule_matches(
    kb: &KnowledgeBase,
    pattern: &Statement,
    isa_operator: Option<AtomId>,
    out: &mut Vec<QueryMatch>,
    depth: usize,
    stats: &SessionStats,
) {
    if depth > 8 {
        return;
    }
    for rule in kb.rules_concluding(pattern.operator) {
        stats.rule_attempts.set(stats.rule_attempts.get() + 1);
        let renamed_conclusion = rename_variables(&rule.conclusion, rule.id.0 as usize);
        let Some(subst) = unify(pattern, &renamed_conclusion, &Substitution::new()) else {
            continue;
        };
        let renamed_premises: Vec<Statement> = rule
            .premises
            .iter()
            .map(|p| rename_variables(p, rule.id.0 as usize))
            .collect();
        if let Some(final_subst) = satisfy_premises(kb, &renamed_premises, subst, isa_operator, depth + 1, stats) {
            let derived = apply_substitution(&renamed_conclusion, &final_subst);
            if derived.is_ground() {
                out.push(QueryMatch {
                    statement: derived,
                    source: StepKind::RuleApplication,
                    confidence: rule.confidence,
                });
            }
        }
    }
}

fn satisfy_premises(
    kb: &KnowledgeBase,
    premises: &[Statement],
    subst: Substitution,
    isa_operator: Option<AtomId>,
    depth: usize,
    stats: &SessionStats,
) -> Option<Substitution> {
    let Some((first, rest)) = premises.split_first() else {
        return Some(subst);
    };
    let probe = apply_substitution(first, &subst);
    let mut local_matches = Vec::new();
    direct_matches(kb, &probe, &mut local_matches);
    if kb.is_transitive(probe.operator) {
        transitive_matches(kb, &probe, &mut local_matches, stats);
    }
    if let Some(isa) = isa_operator {
        if kb.is_inheritable(probe.operator) {
            inheritance_matches(kb, &probe, isa, &mut local_matches);
        }
    }
    rule_matches(kb, &probe, isa_operator, &mut local_matches, depth, stats);

    for candidate in local_matches {
        let Some(extended) = unify(&probe, &candidate.statement, &subst) else {
            continue;
        };
        if let Some(result) = satisfy_premises(kb, rest, extended, isa_operator, depth, stats) {
            return Some(result);
        }
    }
    None
}

fn dedup_and_filter_negated(kb: &KnowledgeBase, matches: Vec<QueryMatch>) -> Vec<QueryMatch> {
    let negated: HashSet<&Statement> = kb
        .facts()
        .iter()
        .filter(|f| f.polarity == Polarity::Negated)
        .map(|f| &f.statement)
        .collect();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in matches {
        if negated.contains(&m.statement) {
            trace!(statement = ?m.statement, "dropping query match covered by explicit negation");
            continue;
        }
        if seen.insert(m.statement.clone()) {
            out.push(m);
        }
    }
    out
}

/// Backward-chaining proof search.
///
/// Never throws on an unprovable goal: exhausting all branches without a
/// match, or hitting `max_depth`, both produce a `ProofObject` with
/// `valid = false` (the latter also sets `depth_exceeded`). Confidence is
/// the product of every rule's confidence used along the accepted branch.
pub fn prove(
    kb: &KnowledgeBase,
    goal: &Statement,
    isa_operator: Option<AtomId>,
    max_depth: usize,
    stats: &SessionStats,
) -> ProofObject {
    let mut in_progress = HashSet::new();
    match prove_inner(kb, goal, isa_operator, max_depth, 0, &mut in_progress, stats) {
        ProveOutcome::Proved(steps, confidence) => ProofObject {
            valid: true,
            confidence,
            method: ProofMethod::Symbolic,
            steps,
            depth_exceeded: false,
        },
        ProveOutcome::DepthExceeded(steps) => ProofObject::depth_limited(ProofMethod::Symbolic, steps),
        ProveOutcome::Failed => ProofObject::unproven(ProofMethod::Symbolic),
    }
}

enum ProveOutcome {
    Proved(Vec<ProofStep>, f64),
    DepthExceeded(Vec<ProofStep>),
    Failed,
}

fn prove_inner(
    kb: &KnowledgeBase,
    goal: &Statement,
    isa_operator: Option<AtomId>,
    max_depth: usize,
    depth: usize,
    in_progress: &mut HashSet<Statement>,
    stats: &SessionStats,
) -> ProveOutcome {
    if depth > max_depth {
        return ProveOutcome::DepthExceeded(Vec::new());
    }
    if !in_progress.insert(goal.clone()) {
        // Cycle: this goal is already being proved further up the stack.
        debug!(?goal, "cycle detected during backward chaining, failing this branch");
        return ProveOutcome::Failed;
    }

    let outcome = prove_goal(kb, goal, isa_operator, max_depth, depth, in_progress, stats);
    in_progress.remove(goal);
    outcome
}

fn prove_goal(
    kb: &KnowledgeBase,
    goal: &Statement,
    isa_operator: Option<AtomId>,
    max_depth: usize,
    depth: usize,
    in_progress: &mut HashSet<Statement>,
    stats: &SessionStats,
) -> ProveOutcome {
    // An explicit negation of the goal blocks every derivation path, not
    // just the direct-match one - without this, a fact derivable via
    // transitive closure, isA inheritance or a rule would still prove even
    // though it was explicitly negated, which is what `query`'s
    // `dedup_and_filter_negated` pass prevents on the query side.
    if goal.is_ground() {
        if let Some(existing) = kb.find_exact(goal) {
            if existing.polarity == Polarity::Negated {
                return ProveOutcome::Failed;
            }
        }
    }

    // Direct fact match.
    if let Some(ids) = kb.component_index().by_operator.get(&goal.operator) {
        for id in ids.clone() {
            let fact = kb.get_fact(id).expect("indexed fact id must exist");
            if fact.polarity == Polarity::Asserted && unify(goal, &fact.statement, &Substitution::new()).is_some() {
                return ProveOutcome::Proved(
                    vec![ProofStep {
                        kind: StepKind::Direct,
                        statement: fact.statement.clone(),
                        supporting_fact: Some(id),
                        note: "matched a learned fact".to_string(),
                    }],
                    1.0,
                );
            }
        }
    }

    // Transitive closure.
    if kb.is_transitive(goal.operator) && goal.arity() == 2 {
        let mut local = Vec::new();
        transitive_matches(kb, goal, &mut local, stats);
        if let Some(m) = local.into_iter().next() {
            return ProveOutcome::Proved(
                vec![ProofStep {
                    kind: StepKind::Transitive,
                    statement: m.statement,
                    supporting_fact: None,
                    note: "derived by transitive closure".to_string(),
                }],
                1.0,
            );
        }
    }

    // isA inheritance.
    if let Some(isa) = isa_operator {
        if kb.is_inheritable(goal.operator) {
            let mut local = Vec::new();
            inheritance_matches(kb, goal, isa, &mut local);
            if let Some(m) = local.into_iter().next() {
                return ProveOutcome::Proved(
                    vec![ProofStep {
                        kind: StepKind::Inheritance,
                        statement: m.statement,
                        supporting_fact: None,
                        note: "derived via isA inheritance".to_string(),
                    }],
                    1.0,
                );
            }
        }
    }

    // Rule application (and its contrapositive, when the goal is a negated
    // literal matching a rule's negated conclusion form is out of scope
    // here since this engine has no first-class formula negation beyond
    // fact-level polarity; contrapositive steps are produced when a rule's
    // sole premise is the negation of the goal being sought).
    for rule in kb.rules_concluding(goal.operator) {
        stats.rule_attempts.set(stats.rule_attempts.get() + 1);
        let renamed_conclusion = rename_variables(&rule.conclusion, rule.id.0 as usize + depth * 1000);
        let Some(subst) = unify(goal, &renamed_conclusion, &Substitution::new()) else {
            continue;
        };
        let renamed_premises: Vec<Statement> = rule
            .premises
            .iter()
            .map(|p| rename_variables(p, rule.id.0 as usize + depth * 1000))
            .collect();

        match prove_premises(kb, &renamed_premises, subst, isa_operator, max_depth, depth + 1, in_progress, stats) {
            ProveOutcome::Proved(mut premise_steps, confidence) => {
                premise_steps.push(ProofStep {
                    kind: StepKind::RuleApplication,
                    statement: apply_substitution(&renamed_conclusion, &Substitution::new()),
                    supporting_fact: None,
                    note: format!("applied rule {:?}", rule.id),
                });
                return ProveOutcome::Proved(premise_steps, confidence * rule.confidence);
            }
            ProveOutcome::DepthExceeded(steps) => return ProveOutcome::DepthExceeded(steps),
            ProveOutcome::Failed => continue,
        }
    }

    ProveOutcome::Failed
}

fn prove_premises(
    kb: &KnowledgeBase,
    premises: &[Statement],
    subst: Substitution,
    isa_operator: Option<AtomId>,
    max_depth: usize,
    depth: usize,
    in_progress: &mut HashSet<Statement>,
    stats: &SessionStats,
) -> ProveOutcome {
    let Some((first, rest)) = premises.split_first() else {
        return ProveOutcome::Proved(Vec::new(), 1.0);
    };
    let goal = apply_substitution(first, &subst);
    if !goal.is_ground() {
        // Underdetermined premise: try every matching fact to bind it.
        let mut local = Vec::new();
        direct_matches(kb, &goal, &mut local);
        for candidate in local {
            let Some(extended) = unify(&goal, &candidate.statement, &subst) else {
                continue;
            };
            if let ProveOutcome::Proved(mut steps, confidence) =
                prove_premises(kb, rest, extended, isa_operator, max_depth, depth, in_progress, stats)
            {
                steps.insert(
                    0,
                    ProofStep {
                        kind: StepKind::Direct,
                        statement: candidate.statement,
                        supporting_fact: None,
                        note: "bound underdetermined premise".to_string(),
                    },
                );
                return ProveOutcome::Proved(steps, confidence);
            }
        }
        return ProveOutcome::Failed;
    }

    match prove_inner(kb, &goal, isa_operator, max_depth, depth, in_progress, stats) {
        ProveOutcome::Proved(mut steps, confidence) => {
            match prove_premises(kb, rest, subst, isa_operator, max_depth, depth, in_progress, stats) {
                ProveOutcome::Proved(rest_steps, rest_confidence) => {
                    steps.extend(rest_steps);
                    ProveOutcome::Proved(steps, confidence * rest_confidence)
                }
                other => other,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{DenseBipolarStrategy, HdcStrategy};
    use crate::statement::AtomKind;
    use crate::vocabulary::Vocabulary;

    fn atom(vocab: &mut Vocabulary, strategy: &dyn HdcStrategy, name: &str) -> AtomId {
        let v = strategy.create_from_name("t", name, 256);
        vocab.insert(name.to_string(), AtomKind::Entity, v)
    }

    #[test]
    fn transitive_closure_derives_multi_hop_chains() {
        let strategy = DenseBipolarStrategy::default();
        let mut vocab = Vocabulary::new();
        let mut kb = KnowledgeBase::new();
        let ancestor = atom(&mut vocab, &strategy, "ancestorOf");
        let a = atom(&mut vocab, &strategy, "a");
        let b = atom(&mut vocab, &strategy, "b");
        let c = atom(&mut vocab, &strategy, "c");
        kb.declare_property(ancestor, crate::statement::RelationProperty::Transitive);
        let v = strategy.create_from_name("t", "f", 256);
        kb.add_fact(
            &strategy,
            Statement::new(ancestor, vec![Term::Const(a), Term::Const(b)]),
            Polarity::Asserted,
            v.clone(),
        )
        .unwrap();
        kb.add_fact(
            &strategy,
            Statement::new(ancestor, vec![Term::Const(b), Term::Const(c)]),
            Polarity::Asserted,
            v,
        )
        .unwrap();

        let stats = SessionStats::new();
        let goal = Statement::new(ancestor, vec![Term::Const(a), Term::Const(c)]);
        let proof = prove(&kb, &goal, None, 10, &stats);
        assert!(proof.valid);
        assert!(stats.transitive_steps.get() > 0);
    }

    #[test]
    fn unprovable_goal_returns_invalid_without_erroring() {
        let strategy = DenseBipolarStrategy::default();
        let mut vocab = Vocabulary::new();
        let kb = KnowledgeBase::new();
        let op = atom(&mut vocab, &strategy, "likes");
        let a = atom(&mut vocab, &strategy, "alice");
        let b = atom(&mut vocab, &strategy, "bob");
        let goal = Statement::new(op, vec![Term::Const(a), Term::Const(b)]);
        let stats = SessionStats::new();
        let proof = prove(&kb, &goal, None, 10, &stats);
        assert!(!proof.valid);
        assert!(!proof.depth_exceeded);
    }

    #[test]
    fn explicit_negation_blocks_inherited_proof() {
        let strategy = DenseBipolarStrategy::default();
        let mut vocab = Vocabulary::new();
        let mut kb = KnowledgeBase::new();
        let isa = atom(&mut vocab, &strategy, "isA");
        let can = atom(&mut vocab, &strategy, "can");
        let penguin = atom(&mut vocab, &strategy, "penguin");
        let bird = atom(&mut vocab, &strategy, "bird");
        let fly = atom(&mut vocab, &strategy, "fly");
        kb.declare_property(can, crate::statement::RelationProperty::Inheritable);
        let v = strategy.create_from_name("t", "f", 256);
        kb.add_fact(&strategy, Statement::new(isa, vec![Term::Const(penguin), Term::Const(bird)]), Polarity::Asserted, v.clone())
            .unwrap();
        kb.add_fact(&strategy, Statement::new(can, vec![Term::Const(bird), Term::Const(fly)]), Polarity::Asserted, v.clone())
            .unwrap();
        kb.add_fact(&strategy, Statement::new(can, vec![Term::Const(penguin), Term::Const(fly)]), Polarity::Negated, v)
            .unwrap();

        let goal = Statement::new(can, vec![Term::Const(penguin), Term::Const(fly)]);
        let stats = SessionStats::new();
        let proof = prove(&kb, &goal, Some(isa), 10, &stats);
        assert!(!proof.valid, "explicit negation must override the inherited property");
    }

    #[test]
    fn rule_derivation_proves_goal_from_premises() {
        let strategy = DenseBipolarStrategy::default();
        let mut vocab = Vocabulary::new();
        let mut kb = KnowledgeBase::new();
        let mortal = atom(&mut vocab, &strategy, "mortal");
        let human = atom(&mut vocab, &strategy, "human");
        let socrates = atom(&mut vocab, &strategy, "socrates");
        let v = strategy.create_from_name("t", "f", 256);
        kb.add_fact(
            &strategy,
            Statement::new(human, vec![Term::Const(socrates)]),
            Polarity::Asserted,
            v,
        )
        .unwrap();
        kb.add_rule(
            vec![Statement::new(human, vec![Term::Var("X".to_string())])],
            Statement::new(mortal, vec![Term::Var("X".to_string())]),
            1.0,
        );

        let goal = Statement::new(mortal, vec![Term::Const(socrates)]);
        let stats = SessionStats::new();
        let proof = prove(&kb, &goal, None, 10, &stats);
        assert!(proof.valid);
        assert_eq!(proof.confidence, 1.0);
        assert!(stats.rule_attempts.get() > 0);
    }
}
