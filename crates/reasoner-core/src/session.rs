//! Session orchestrator: the single entry point a host embeds against.
//!
//! A `Session` owns everything needed to learn, query and prove over one
//! theory - the active strategy, vocabulary, knowledge base, reasoning
//! engines and stats - and exposes no shared/global state. Per the
//! concurrency model, a `Session` may be invoked from any thread provided
//! the caller serializes access; there is no internal locking.

use tracing::{info, instrument, warn};

use crate::algebra::{self, HdcStrategy, StrategyId, Vector};
use crate::config::SessionConfig;
use crate::contradiction;
use crate::encoder::{self, ArgSlot};
use crate::engine::coordinator::ReasoningCoordinator;
use crate::engine::symbolic::{self, ISA_OPERATOR};
use crate::error::{ReasonerError, Result};
use crate::kb::KnowledgeBase;
use crate::proof::ProofObject;
use crate::stats::SessionStats;
use crate::statement::{
    AtomId, AtomKind, FactId, MutualExclusionGroup, ParsedArg, ParsedAtomPattern, ParsedStatement, Polarity, Program,
    RuleId, Statement, Term, Theory,
};
use crate::vocabulary::Vocabulary;

/// What `learn` produced for one statement.
#[derive(Debug, Clone, Copy)]
pub enum LearnOutcome {
    FactAdded(FactId),
    FactAlreadyKnown(FactId),
    RuleAdded(RuleId),
    PropertyDeclared(AtomId),
    MutualExclusionAdded,
}

/// A lightweight, host-facing view of session state for debugging tools.
/// Not part of the reasoning contract itself.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub fact_count: usize,
    pub rule_count: usize,
    pub vocabulary_size: usize,
    pub mutual_exclusion_group_count: usize,
    pub transitive_relation_count: usize,
    pub symmetric_relation_count: usize,
    pub inheritable_property_count: usize,
}

pub struct Session {
    theory_id: String,
    config: SessionConfig,
    strategy: Box<dyn HdcStrategy>,
    vocabulary: Vocabulary,
    kb: KnowledgeBase,
    coordinator: ReasoningCoordinator,
    stats: SessionStats,
}

impl Session {
    pub fn new(theory_id: impl Into<String>, config: SessionConfig) -> Self {
        let theory_id = theory_id.into();
        info!(theory_id = %theory_id, geometry = config.geometry, "opening reasoning session");
        Self {
            theory_id,
            strategy: algebra::strategy_for_id(config.strategy_id),
            config,
            vocabulary: Vocabulary::new(),
            kb: KnowledgeBase::new(),
            coordinator: ReasoningCoordinator::new(),
            stats: SessionStats::new(),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn isa_operator(&self) -> Option<AtomId> {
        self.vocabulary.get_by_name(ISA_OPERATOR).map(|a| a.id)
    }

    /// Resolves an atom name to its id, stamping a fresh vector and
    /// interning it on first use.
    pub fn resolve(&mut self, name: &str) -> AtomId {
        if let Some(atom) = self.vocabulary.get_by_name(name) {
            return atom.id;
        }
        let vector = self.strategy.create_from_name(&self.theory_id, name, self.config.geometry);
        self.vocabulary.insert(name.to_string(), AtomKind::Entity, vector)
    }

    fn resolve_operator(&mut self, name: &str) -> AtomId {
        if let Some(atom) = self.vocabulary.get_by_name(name) {
            return atom.id;
        }
        let vector = self.strategy.create_from_name(&self.theory_id, name, self.config.geometry);
        self.vocabulary.insert(name.to_string(), AtomKind::Operator, vector)
    }

    /// Looks up an already-interned atom by name without creating one.
    /// Used on the `prove` path, where a reference to a name the session
    /// has never seen is a caller error (`ReasonerError::UnknownAtom`)
    /// rather than an implicit declaration - unlike `learn`/`query`, which
    /// intern on first mention.
    fn resolve_existing(&self, name: &str) -> Result<AtomId> {
        self.vocabulary
            .get_by_name(name)
            .map(|atom| atom.id)
            .ok_or_else(|| ReasonerError::UnknownAtom(name.to_string()))
    }

    /// Resolves a pattern against the vocabulary as it already stands,
    /// erroring with `UnknownAtom` instead of interning unseen names. See
    /// [`Session::resolve_existing`].
    fn resolve_pattern_existing(&self, pattern: &ParsedAtomPattern) -> Result<Statement> {
        if pattern.args.len() > self.config.max_positional_arity {
            return Err(ReasonerError::InvalidArity {
                got: pattern.args.len(),
                max: self.config.max_positional_arity,
            });
        }
        let operator = self.resolve_existing(&pattern.operator)?;
        let args = pattern
            .args
            .iter()
            .map(|arg| match arg {
                ParsedArg::Const(name) => self.resolve_existing(name).map(Term::Const),
                ParsedArg::Var(name) => Ok(Term::Var(name.clone())),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Statement::new(operator, args))
    }

    fn resolve_pattern(&mut self, pattern: &ParsedAtomPattern) -> Result<Statement> {
        if pattern.args.len() > self.config.max_positional_arity {
            return Err(ReasonerError::InvalidArity {
                got: pattern.args.len(),
                max: self.config.max_positional_arity,
            });
        }
        let operator = self.resolve_operator(&pattern.operator);
        let args = pattern
            .args
            .iter()
            .map(|arg| match arg {
                ParsedArg::Const(name) => Term::Const(self.resolve(name)),
                ParsedArg::Var(name) => Term::Var(name.clone()),
            })
            .collect();
        Ok(Statement::new(operator, args))
    }

    fn encode_statement(&mut self, statement: &Statement) -> Result<Vector> {
        let op_vector = self
            .vocabulary
            .get(statement.operator)
            .expect("operator must already be resolved")
            .vector
            .clone();
        let slots: Vec<ArgSlot> = statement
            .args
            .iter()
            .map(|t| match t {
                Term::Const(a) => ArgSlot::Bound(*a),
                Term::Var(_) => ArgSlot::Hole,
            })
            .collect();
        encoder::encode(
            self.strategy.as_ref(),
            &mut self.vocabulary,
            &self.theory_id,
            self.config.geometry,
            &op_vector,
            &slots,
        )
    }

    /// Learns one statement. Fact insertion is transactional: when
    /// `reject_contradictions` is set, a contradicting fact is rejected
    /// with `ReasonerError::Contradiction` before anything is written to
    /// the knowledge base.
    #[instrument(skip(self, statement), fields(theory_id = %self.theory_id))]
    pub fn learn(&mut self, statement: ParsedStatement) -> Result<LearnOutcome> {
        match statement {
            ParsedStatement::Fact { operator, args, polarity } => {
                let pattern = ParsedAtomPattern {
                    operator,
                    args: args.into_iter().map(ParsedArg::Const).collect(),
                };
                let ground = self.resolve_pattern(&pattern)?;
                if self.config.reject_contradictions {
                    if let Some(existing) = contradiction::find_contradiction(&self.kb, &ground, polarity) {
                        warn!(fact_id = existing.0, "rejecting contradictory fact");
                        return Err(ReasonerError::Contradiction(existing));
                    }
                }
                if let Some(existing) = self.kb.find_exact(&ground) {
                    if existing.polarity == polarity {
                        return Ok(LearnOutcome::FactAlreadyKnown(existing.id));
                    }
                }
                let vector = self.encode_statement(&ground)?;
                let id = self.kb.add_fact(self.strategy.as_ref(), ground, polarity, vector)?;
                Ok(LearnOutcome::FactAdded(id))
            }
            ParsedStatement::Rule {
                premises,
                conclusion,
                confidence,
            } => {
                let premises = premises
                    .iter()
                    .map(|p| self.resolve_pattern(p))
                    .collect::<Result<Vec<_>>>()?;
                let conclusion = self.resolve_pattern(&conclusion)?;
                let id = self.kb.add_rule(premises, conclusion, confidence);
                Ok(LearnOutcome::RuleAdded(id))
            }
            ParsedStatement::Declare { operator, property } => {
                let operator_id = self.resolve_operator(&operator);
                self.kb.declare_property(operator_id, property);
                Ok(LearnOutcome::PropertyDeclared(operator_id))
            }
            ParsedStatement::MutualExclusion { patterns } => {
                let patterns = patterns
                    .iter()
                    .map(|p| self.resolve_pattern(p))
                    .collect::<Result<Vec<_>>>()?;
                self.kb.add_mutual_exclusion(MutualExclusionGroup { patterns });
                Ok(LearnOutcome::MutualExclusionAdded)
            }
        }
    }

    /// Learns every statement in `program`, in order. The whole batch is
    /// one `learn` transaction: if any statement fails (most commonly a
    /// rejected contradiction), every fact, rule and declaration the batch
    /// had already committed is rolled back and the KB is left exactly as
    /// it was before this call - per the "Contradiction transactionality"
    /// property, a batch containing one bad statement leaves `factCount`
    /// unchanged, not partially advanced.
    pub fn learn_program(&mut self, program: Program) -> Result<Vec<LearnOutcome>> {
        let checkpoint = self.kb.checkpoint();
        let mut outcomes = Vec::with_capacity(program.statements.len());
        for statement in program.statements {
            match self.learn(statement) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    self.kb.rollback(checkpoint);
                    return Err(err);
                }
            }
        }
        Ok(outcomes)
    }

    /// Learns every program in `theory`, in order. Each program within the
    /// theory is its own transaction (see [`Session::learn_program`]); a
    /// failure in a later program does not roll back programs already
    /// committed earlier in the same theory.
    pub fn learn_theory(&mut self, theory: Theory) -> Result<Vec<LearnOutcome>> {
        let mut outcomes = Vec::new();
        for program in theory.programs {
            outcomes.extend(self.learn_program(program)?);
        }
        Ok(outcomes)
    }

    /// Queries the knowledge base for statements matching `pattern`.
    /// Variables in `pattern` (`ParsedArg::Var`) are treated as holes.
    pub fn query(&mut self, pattern: &ParsedAtomPattern) -> Result<Vec<Statement>> {
        let statement = self.resolve_pattern(pattern)?;
        let hole_positions: Vec<usize> = statement
            .args
            .iter()
            .enumerate()
            .filter_map(|(idx, t)| if t.is_var() { Some(idx + 1) } else { None })
            .collect();
        let isa = self.isa_operator();
        let matches = self.coordinator.query(
            self.strategy.as_ref(),
            &mut self.vocabulary,
            &self.kb,
            &self.config,
            &self.theory_id,
            &statement,
            &hole_positions,
            isa,
            &self.stats,
        );
        Ok(matches.into_iter().map(|m| m.statement).collect())
    }

    /// Attempts to prove `goal`, never erroring on failure to derive it -
    /// see [`ProofObject`]. A goal referencing an operator or argument name
    /// the session has never interned errors with `ReasonerError::UnknownAtom`
    /// instead: unlike `learn`/`query`, `prove` does not implicitly create
    /// atoms on first mention.
    pub fn prove(&mut self, goal: &ParsedAtomPattern) -> Result<ProofObject> {
        let statement = self.resolve_pattern_existing(goal)?;
        let isa = self.isa_operator();
        Ok(self.coordinator.prove(
            self.strategy.as_ref(),
            &mut self.vocabulary,
            &self.kb,
            &self.config,
            &self.theory_id,
            &statement,
            isa,
            &self.stats,
        ))
    }

    /// Cosine/Hamming/Jaccard similarity (strategy-dependent) between two
    /// already-known atom names.
    pub fn similarity(&self, a: &str, b: &str) -> Result<f64> {
        let atom_a = self
            .vocabulary
            .get_by_name(a)
            .ok_or_else(|| ReasonerError::UnknownAtom(a.to_string()))?;
        let atom_b = self
            .vocabulary
            .get_by_name(b)
            .ok_or_else(|| ReasonerError::UnknownAtom(b.to_string()))?;
        self.stats.similarity_checks.set(self.stats.similarity_checks.get() + 1);
        self.strategy.similarity(&atom_a.vector, &atom_b.vector)
    }

    /// Decodes a vector into the `top_k` vocabulary atoms most similar to
    /// it, descending by similarity.
    pub fn decode(&self, vector: &Vector, top_k: usize) -> Result<Vec<(String, f64)>> {
        self.stats.similarity_checks.set(self.stats.similarity_checks.get() + 1);
        self.strategy.top_k_similar(vector, &self.vocabulary, top_k)
    }

    pub fn inspect(&self) -> SessionSnapshot {
        SessionSnapshot {
            fact_count: self.kb.facts().len(),
            rule_count: self.kb.rules().len(),
            vocabulary_size: self.vocabulary.len(),
            mutual_exclusion_group_count: self.kb.mutual_exclusions().len(),
            transitive_relation_count: self.kb.transitive_relation_count(),
            symmetric_relation_count: self.kb.symmetric_relation_count(),
            inheritable_property_count: self.kb.inheritable_property_count(),
        }
    }

    /// Returns every learned fact and rule, for host-side debugging or
    /// serialization. Not a persistence mechanism: this crate has no
    /// facility to load a dump back in.
    pub fn dump(&self) -> (&[crate::statement::Fact], &[crate::statement::Rule]) {
        (self.kb.facts(), self.kb.rules())
    }

    pub fn strategy_id(&self) -> StrategyId {
        self.strategy.id()
    }

    /// Consumes the session, releasing the vocabulary, knowledge base and
    /// engines it owns. There is no background task to join - the
    /// reasoning core performs no internal parallelism.
    pub fn close(self) {
        info!(theory_id = %self.theory_id, "closing reasoning session");
    }
}

/// Convenience constructor mirroring [`symbolic::ISA_OPERATOR`] so callers
/// can declare the inheritance operator without spelling the literal name.
pub fn isa_declaration() -> ParsedStatement {
    ParsedStatement::Declare {
        operator: symbolic::ISA_OPERATOR.to_string(),
        property: crate::statement::RelationProperty::Inheritable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReasoningPriority;
    use crate::statement::RelationProperty;

    fn pattern(operator: &str, args: &[&str]) -> ParsedAtomPattern {
        ParsedAtomPattern {
            operator: operator.to_string(),
            args: args.iter().map(|a| ParsedArg::Const(a.to_string())).collect(),
        }
    }

    fn var_pattern(operator: &str, args: &[ParsedArg]) -> ParsedAtomPattern {
        ParsedAtomPattern {
            operator: operator.to_string(),
            args: args.to_vec(),
        }
    }

    fn session() -> Session {
        let config = SessionConfig::new(4096, StrategyId::DenseBipolar, ReasoningPriority::Symbolic);
        Session::new("test-theory", config)
    }

    #[test]
    fn learn_and_query_round_trip() {
        let mut s = session();
        s.learn(ParsedStatement::Fact {
            operator: "likes".to_string(),
            args: vec!["alice".to_string(), "bob".to_string()],
            polarity: Polarity::Asserted,
        })
        .unwrap();

        let results = s
            .query(&var_pattern("likes", &[ParsedArg::Const("alice".to_string()), ParsedArg::Var("Y".to_string())]))
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn contradiction_is_rejected_transactionally() {
        let mut s = session();
        s.learn(ParsedStatement::Fact {
            operator: "likes".to_string(),
            args: vec!["alice".to_string(), "bob".to_string()],
            polarity: Polarity::Asserted,
        })
        .unwrap();
        let err = s
            .learn(ParsedStatement::Fact {
                operator: "likes".to_string(),
                args: vec!["alice".to_string(), "bob".to_string()],
                polarity: Polarity::Negated,
            })
            .unwrap_err();
        assert!(matches!(err, ReasonerError::Contradiction(_)));
        assert_eq!(s.dump().0.len(), 1);
    }

    #[test]
    fn contradictory_statement_rolls_back_the_whole_learn_batch() {
        let mut s = session();
        s.learn(ParsedStatement::MutualExclusion {
            patterns: vec![
                var_pattern("hasState", &[ParsedArg::Var("X".to_string()), ParsedArg::Const("open".to_string())]),
                var_pattern("hasState", &[ParsedArg::Var("X".to_string()), ParsedArg::Const("closed".to_string())]),
            ],
        })
        .unwrap();
        s.learn(ParsedStatement::Fact {
            operator: "hasState".to_string(),
            args: vec!["door".to_string(), "open".to_string()],
            polarity: Polarity::Asserted,
        })
        .unwrap();
        assert_eq!(s.dump().0.len(), 1);

        let program = Program {
            statements: vec![
                ParsedStatement::Fact {
                    operator: "hasState".to_string(),
                    args: vec!["door".to_string(), "closed".to_string()],
                    polarity: Polarity::Asserted,
                },
                ParsedStatement::Fact {
                    operator: "hasState".to_string(),
                    args: vec!["window".to_string(), "open".to_string()],
                    polarity: Polarity::Asserted,
                },
            ],
        };
        let err = s.learn_program(program).unwrap_err();
        assert!(matches!(err, ReasonerError::Contradiction(_)));
        assert_eq!(s.dump().0.len(), 1, "KB must retain only the initial fact");
    }

    #[test]
    fn inheritance_derives_property_through_isa() {
        let mut s = session();
        s.learn(isa_declaration()).unwrap();
        s.learn(ParsedStatement::Declare {
            operator: "mortal".to_string(),
            property: RelationProperty::Inheritable,
        })
        .unwrap();
        s.learn(ParsedStatement::Fact {
            operator: "isA".to_string(),
            args: vec!["socrates".to_string(), "human".to_string()],
            polarity: Polarity::Asserted,
        })
        .unwrap();
        s.learn(ParsedStatement::Fact {
            operator: "mortal".to_string(),
            args: vec!["human".to_string()],
            polarity: Polarity::Asserted,
        })
        .unwrap();

        let results = s.query(&pattern("mortal", &["socrates"])).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn prove_rejects_unknown_atom_instead_of_interning_it() {
        let mut s = session();
        let err = s.prove(&pattern("likes", &["nobody", "nothing"])).unwrap_err();
        assert!(matches!(err, ReasonerError::UnknownAtom(_)));
    }

    #[test]
    fn prove_never_errors_on_unprovable_but_known_goal() {
        let mut s = session();
        s.learn(ParsedStatement::Fact {
            operator: "likes".to_string(),
            args: vec!["nobody".to_string(), "nothing".to_string()],
            polarity: Polarity::Asserted,
        })
        .unwrap();
        let proof = s.prove(&pattern("likes", &["nothing", "nobody"])).unwrap();
        assert!(!proof.valid);
    }
}
