//! Proof object schema shared by the symbolic and holographic engines.
//!
//! Both engines produce the same `ProofObject` shape for the same query,
//! differing only in `method`, `confidence` and the step trace - callers
//! that only care about `valid` can treat the two engines interchangeably.

use crate::statement::{FactId, Statement};

/// Which engine (or combination) produced a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofMethod {
    Symbolic,
    Holographic,
    /// The holographic engine exhausted its shortcuts and fell back to a
    /// full symbolic proof (`fallback_to_symbolic = true`).
    HolographicFallback,
}

/// What justified a single step of a proof.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// The goal matched a learned fact exactly.
    Direct,
    /// The goal was derived by transitive closure over a declared
    /// transitive relation.
    Transitive,
    /// The goal was derived via `isA` property inheritance.
    Inheritance,
    /// The goal was derived by applying a rule.
    RuleApplication,
    /// A candidate argument was recovered by unbinding a composite vector.
    HdcUnbind,
    /// An HDC-recovered candidate was confirmed by the symbolic engine.
    HdcValidate,
    /// The goal was derived from a rule's contrapositive under `prove`'s
    /// backward search.
    Contrapositive,
}

/// One step in a proof trace.
#[derive(Debug, Clone)]
pub struct ProofStep {
    pub kind: StepKind,
    pub statement: Statement,
    pub supporting_fact: Option<FactId>,
    /// Human-readable note, e.g. which rule or relation licensed this step.
    pub note: String,
}

/// The result of `query` or `prove`: whether the goal holds, how confident
/// the engine is, which method produced the answer, and the trace of
/// steps taken. `prove` never throws on an unprovable goal - it returns
/// `valid = false` with whatever partial trace was explored.
#[derive(Debug, Clone)]
pub struct ProofObject {
    pub valid: bool,
    pub confidence: f64,
    pub method: ProofMethod,
    pub steps: Vec<ProofStep>,
    /// Set when the search stopped because it hit the configured
    /// `max_proof_depth` rather than exhausting all alternatives.
    pub depth_exceeded: bool,
}

impl ProofObject {
    pub fn unproven(method: ProofMethod) -> Self {
        Self {
            valid: false,
            confidence: 0.0,
            method,
            steps: Vec::new(),
            depth_exceeded: false,
        }
    }

    pub fn depth_limited(method: ProofMethod, steps: Vec<ProofStep>) -> Self {
        Self {
            valid: false,
            confidence: 0.0,
            method,
            steps,
            depth_exceeded: true,
        }
    }
}
