//! Session configuration.
//!
//! Modeled on the teacher's typed-config pattern (`BeagleConfig` in
//! `beagle-config`): a flat `serde`-derived struct with named default
//! functions for every optional field. Unlike `BeagleConfig`, this type has
//! no `from_env()` - no environment variables are part of this crate's
//! contract; a host embedding this crate is free to populate
//! `SessionConfig` from its own environment or file layer and pass the
//! result in.

use serde::{Deserialize, Serialize};

use crate::algebra::StrategyId;

/// Which engine a session consults first for `query`/`prove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasoningPriority {
    Symbolic,
    Holographic,
}

fn default_reject_contradictions() -> bool {
    true
}

fn default_max_proof_depth() -> usize {
    10
}

fn default_fallback_to_symbolic() -> bool {
    true
}

fn default_always_merge_symbolic() -> bool {
    true
}

fn default_max_positional_arity() -> usize {
    16
}

fn default_hdc_top_k() -> usize {
    8
}

/// The configuration contract for one [`crate::session::Session`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Vector dimensionality. Every vector created in this session shares
    /// this geometry.
    pub geometry: usize,
    /// Which [`StrategyId`] this session's algebra uses.
    pub strategy_id: StrategyId,
    /// Which engine `query`/`prove` consult first.
    pub reasoning_priority: ReasoningPriority,
    #[serde(default = "default_reject_contradictions")]
    pub reject_contradictions: bool,
    #[serde(default = "default_max_proof_depth")]
    pub max_proof_depth: usize,
    #[serde(default = "default_fallback_to_symbolic")]
    pub fallback_to_symbolic: bool,
    #[serde(default = "default_always_merge_symbolic")]
    pub always_merge_symbolic: bool,
    /// Maximum number of positional arguments a statement may declare.
    /// Exceeding this is an explicit [`crate::error::ReasonerError::InvalidArity`],
    /// a deliberate decision for a case the source left implicit.
    #[serde(default = "default_max_positional_arity")]
    pub max_positional_arity: usize,
    /// Default `top_k` used by holographic queries that don't specify one.
    #[serde(default = "default_hdc_top_k")]
    pub hdc_top_k: usize,
}

impl SessionConfig {
    pub fn new(geometry: usize, strategy_id: StrategyId, reasoning_priority: ReasoningPriority) -> Self {
        Self {
            geometry,
            strategy_id,
            reasoning_priority,
            reject_contradictions: default_reject_contradictions(),
            max_proof_depth: default_max_proof_depth(),
            fallback_to_symbolic: default_fallback_to_symbolic(),
            always_merge_symbolic: default_always_merge_symbolic(),
            max_positional_arity: default_max_positional_arity(),
            hdc_top_k: default_hdc_top_k(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(32_768, StrategyId::DenseBipolar, ReasoningPriority::Symbolic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_contract_defaults() {
        let config = SessionConfig::default();
        assert!(config.reject_contradictions);
        assert_eq!(config.max_proof_depth, 10);
        assert!(config.fallback_to_symbolic);
        assert!(config.always_merge_symbolic);
    }

    #[test]
    fn optional_fields_fall_back_to_defaults_when_omitted() {
        let json = r#"{"geometry": 1024, "strategy_id": "DenseBipolar", "reasoning_priority": "Symbolic"}"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.geometry, 1024);
        assert_eq!(config.max_proof_depth, 10);
        assert!(config.always_merge_symbolic);
    }
}
