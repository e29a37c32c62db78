//! # TraceArc DRC
//!
//! The beautification engine: optimistic corner smoothing, the design-check
//! feedback loop that halves the radius of every implicated corner until
//! the check comes back clean (or forces the corner straight once the retry
//! budget runs out), and the independent width-transition post-pass.
//!
//! The engine is best-effort by construction: host failures, oracle
//! outages, and degenerate geometry are recovered per unit and surfaced as
//! report counters, never as a failed pass.

pub mod engine;
pub mod feedback;
pub mod report;
pub mod transition_pass;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::Beautifier;
pub use feedback::LoopState;
pub use report::{BeautifyReport, TransitionReport};
pub use transition_pass::WidthTransitionPass;
