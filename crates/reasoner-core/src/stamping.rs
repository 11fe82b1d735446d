//! Position & atom stamping.
//!
//! Every atom name — including the reserved positional-binding names used
//! by the [`crate::encoder`] — is stamped into a vector the same way:
//! deterministically, from `(theory_id, name)`, through the active
//! strategy. This module only owns the naming convention for position
//! atoms; the actual hashing lives in [`crate::algebra::stamping_rng`].

/// Name of the positional-binding atom for 1-based argument position `n`.
pub fn position_atom_name(position: usize) -> String {
    format!("__POS_{position}__")
}

/// Returns `Some(position)` if `name` is a reserved position atom name.
pub fn parse_position_atom_name(name: &str) -> Option<usize> {
    let inner = name.strip_prefix("__POS_")?.strip_suffix("__")?;
    inner.parse::<usize>().ok()
}
