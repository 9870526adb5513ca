//! Easing used by detail-view animations.

/// Easing curves and time normalization.
pub mod ease;
