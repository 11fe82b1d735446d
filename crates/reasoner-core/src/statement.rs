//! Core data model: atoms, terms, statements, facts and rules.
//!
//! This module intentionally has no notion of surface syntax. A host DSL
//! parser or theory loader builds [`ParsedStatement`] values directly and
//! hands them to [`crate::session::Session::learn`]; no text ever passes
//! through this crate.

use serde::{Deserialize, Serialize};

/// Index into a session's [`crate::vocabulary::Vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AtomId(pub u32);

/// Index of a learned fact within a [`crate::kb::KnowledgeBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactId(pub u32);

/// Index of a learned rule within a [`crate::kb::KnowledgeBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u32);

/// What an atom represents. Carried mainly so diagnostics and `inspect()`
/// can group vocabulary entries without a second index structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomKind {
    /// An ordinary entity or operator name introduced by a statement.
    Entity,
    /// An operator (predicate/relation) name.
    Operator,
    /// A reserved `__POS_N__` positional-binding atom (see
    /// [`crate::stamping`]).
    Position,
}

/// A single interned name together with its stamped vector.
#[derive(Debug, Clone)]
pub struct Atom {
    pub id: AtomId,
    pub name: String,
    pub kind: AtomKind,
    pub vector: crate::algebra::Vector,
}

/// One argument slot in a statement: either bound to a concrete atom, or a
/// named logic variable to be unified when the statement appears in a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Const(AtomId),
    Var(String),
}

impl Term {
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }
}

/// A relation applied to a fixed-order argument list: `operator(args...)`.
///
/// Used both for ground facts (no `Term::Var` arguments) and for rule
/// premises/conclusions (which may contain variables to be unified).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub operator: AtomId,
    pub args: Vec<Term>,
}

impl Statement {
    pub fn new(operator: AtomId, args: Vec<Term>) -> Self {
        Self { operator, args }
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(|t| !t.is_var())
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// Polarity of an asserted statement. Negation is the only modality this
/// crate understands; grammatical modality (tense, necessity, etc.) is
/// explicitly out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Asserted,
    Negated,
}

/// A learned ground fact.
#[derive(Debug, Clone)]
pub struct Fact {
    pub id: FactId,
    pub statement: Statement,
    pub polarity: Polarity,
    pub vector: crate::algebra::Vector,
}

/// A learned rule: `premises... => conclusion`, with a confidence weight
/// used to scale proof confidence on application.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: RuleId,
    pub premises: Vec<Statement>,
    pub conclusion: Statement,
    pub confidence: f64,
}

/// A relational property declared over an operator, rather than over a
/// specific fact. Declarations are learned through the same external
/// interface as facts and rules (see [`ParsedStatement`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationProperty {
    Transitive,
    Symmetric,
    /// Properties reachable through `isA`-style inheritance edges.
    Inheritable,
}

/// A group of statement patterns that can never all simultaneously hold;
/// used by the contradiction detector in addition to explicit negation.
#[derive(Debug, Clone)]
pub struct MutualExclusionGroup {
    pub patterns: Vec<Statement>,
}

/// The external-interface contract a host (DSL executor, theory loader,
/// NL bridge) uses to feed this crate. Distinct from [`Fact`]/[`Rule`] so
/// that atom names may still be strings at the boundary; `Session::learn`
/// resolves/creates vocabulary entries as it ingests a `ParsedStatement`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParsedStatement {
    Fact {
        operator: String,
        args: Vec<String>,
        polarity: Polarity,
    },
    Rule {
        premises: Vec<ParsedAtomPattern>,
        conclusion: ParsedAtomPattern,
        confidence: f64,
    },
    Declare {
        operator: String,
        property: RelationProperty,
    },
    MutualExclusion {
        patterns: Vec<ParsedAtomPattern>,
    },
}

/// A statement pattern at the parsing boundary: arguments are either a
/// concrete atom name or a variable name (by convention, anything starting
/// with an uppercase letter or `?`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedAtomPattern {
    pub operator: String,
    pub args: Vec<ParsedArg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParsedArg {
    Const(String),
    Var(String),
}

/// An ordered batch of statements, as produced by a theory loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<ParsedStatement>,
}

/// A named, ordered collection of programs. `theory_id` seeds the
/// deterministic atom-stamping hash (see [`crate::stamping`]), so the same
/// name in two different theories stamps to different vectors.
#[derive(Debug, Clone, Default)]
pub struct Theory {
    pub id: String,
    pub programs: Vec<Program>,
}
