//! Error types for the reasoning core.
//!
//! Every fallible operation in this crate returns [`Result`]. Proof failure
//! (an unprovable goal, or a proof that hits the depth limit) is *not*
//! modeled as an error: both cases are valid outcomes surfaced as fields on
//! `ProofObject` (see [`crate::proof`]).

use thiserror::Error;

use crate::statement::FactId;

/// Errors surfaced by the vector algebra, knowledge base, encoder and
/// reasoning engines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReasonerError {
    /// Two vectors created under different strategies were combined.
    #[error("strategy mismatch: expected `{expected}`, got `{found}`")]
    StrategyMismatch { expected: String, found: String },

    /// An extension operation is not supported by the active strategy.
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),

    /// Two vectors of different geometry (dimensionality) were combined.
    #[error("geometry mismatch: expected {expected}, got {found}")]
    GeometryMismatch { expected: usize, found: usize },

    /// A referenced atom name does not exist in the session vocabulary.
    #[error("unknown atom: `{0}`")]
    UnknownAtom(String),

    /// Learning a fact would contradict an existing fact.
    #[error("contradiction with existing fact {0:?}")]
    Contradiction(FactId),

    /// A backward-chaining proof exceeded the configured maximum depth.
    ///
    /// This variant exists for completeness and internal plumbing; it is
    /// never returned from `prove`/`query` — those surface depth exhaustion
    /// through `ProofObject` instead.
    #[error("maximum proof depth exceeded")]
    MaxDepthExceeded,

    /// A statement was built with more positional arguments than the
    /// session's declared maximum arity.
    #[error("invalid arity: {got} arguments exceed the maximum of {max}")]
    InvalidArity { got: usize, max: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReasonerError>;
