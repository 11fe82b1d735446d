//! Session-local statistics counters.
//!
//! Unlike the teacher's `LlmStatsRegistry`, which keyed stats by `run_id`
//! in a `Mutex<HashMap<..>>` because a single process serves many
//! concurrent LLM call sites, a [`Session`](crate::session::Session) never
//! shares state across sessions (see the crate's concurrency model), so
//! `SessionStats` is a single flat counter struct incremented synchronously
//! at call sites rather than a registry.

use std::cell::Cell;

/// Counters accumulated over the lifetime of one session.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub queries: Cell<u64>,
    pub proofs: Cell<u64>,
    pub kb_scans: Cell<u64>,
    pub similarity_checks: Cell<u64>,
    pub rule_attempts: Cell<u64>,
    pub transitive_steps: Cell<u64>,
    pub hdc_queries: Cell<u64>,
    pub hdc_successes: Cell<u64>,
    pub hdc_unbind_attempts: Cell<u64>,
    pub hdc_unbind_successes: Cell<u64>,
    pub hdc_validation_attempts: Cell<u64>,
    pub hdc_validation_successes: Cell<u64>,
    pub hdc_proof_successes: Cell<u64>,
    pub symbolic_proof_fallbacks: Cell<u64>,
    pub max_proof_depth: Cell<u64>,
    pub min_proof_depth: Cell<u64>,
    pub total_proof_steps: Cell<u64>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_proof_depth(&self, depth: u64) {
        if depth > self.max_proof_depth.get() {
            self.max_proof_depth.set(depth);
        }
        if self.min_proof_depth.get() == 0 || depth < self.min_proof_depth.get() {
            self.min_proof_depth.set(depth);
        }
    }

    /// Holographic validation hit rate, rounded to 4 decimal places using
    /// round-half-to-even (the documented tie-break for every ratio this
    /// type reports, since the original implementation left the rounding
    /// policy unspecified).
    pub fn hdc_validation_hit_rate(&self) -> f64 {
        round4(ratio(self.hdc_validation_successes.get(), self.hdc_validation_attempts.get()))
    }

    pub fn hdc_unbind_hit_rate(&self) -> f64 {
        round4(ratio(self.hdc_unbind_successes.get(), self.hdc_unbind_attempts.get()))
    }

    pub fn hdc_query_hit_rate(&self) -> f64 {
        round4(ratio(self.hdc_successes.get(), self.hdc_queries.get()))
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
