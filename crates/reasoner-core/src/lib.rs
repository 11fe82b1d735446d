//! Neuro-symbolic reasoning core: hyperdimensional vector algebra fused
//! with a symbolic knowledge base and two cooperating reasoning engines.
//!
//! This crate implements the reasoning substrate only. Surface syntax
//! (parsing a DSL or natural language into the [`statement::ParsedStatement`]
//! values this crate consumes), persistence, and any host-facing server or
//! UI are deliberately out of scope - see [`session::Session`] for the
//! single entry point a host embeds against.

pub mod algebra;
pub mod config;
pub mod contradiction;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod kb;
pub mod proof;
pub mod session;
pub mod stamping;
pub mod statement;
pub mod stats;
pub mod vocabulary;

pub use config::{ReasoningPriority, SessionConfig};
pub use error::{ReasonerError, Result};
pub use proof::{ProofMethod, ProofObject, ProofStep, StepKind};
pub use session::{LearnOutcome, Session, SessionSnapshot};
pub use statement::{ParsedArg, ParsedAtomPattern, ParsedStatement, Polarity, Program, RelationProperty, Theory};
