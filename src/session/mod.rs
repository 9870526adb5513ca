//! Detail-view sessions and the cooperative tick loop that drives them.
//!
//! A [`controller::SessionController`] owns its tick handle, its asset and its detail surface.
//! The tick body it schedules only holds a weak back-reference to the session data, so dropping
//! the controller frees everything immediately, whether or not a tick is scheduled.

/// `SessionController` state machine.
pub mod controller;
/// Host-driven periodic task scheduler.
pub mod ticker;
