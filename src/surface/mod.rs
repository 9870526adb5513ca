//! Reusable display surfaces (list-row containers).

/// Bounded reuse pool keyed by surface kind.
pub mod pool;
