use std::fmt;

use serde::{Deserialize, Serialize};

use crate::feedback::LoopState;

/// Summary of one beautify pass, for user-visible reporting.
///
/// A pass always produces a report, even when individual primitives failed;
/// the counters tell the caller how partial the result is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeautifyReport {
    /// Paths that were extracted and emitted.
    pub paths: usize,
    /// Arcs alive after the final emission.
    pub arcs_created: usize,
    /// Corners whose tangent length hit the leg clamp in the final emission.
    pub corners_clamped: usize,
    /// Corners permanently reverted to sharp joints.
    pub corners_forced_straight: usize,
    /// Design check cycles run (0 when DRC is disabled).
    pub check_cycles: usize,
    /// Violating primitives that did not trace back to a generated corner.
    pub unrelated_violations: usize,
    /// Create/delete calls the host rejected.
    pub host_failures: usize,
    /// Terminal state of the feedback loop, when it ran.
    pub drc_outcome: Option<LoopState>,
}

impl fmt::Display for BeautifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} path(s): {} arc(s) created, {} corner(s) clamped, {} forced straight, \
             {} check cycle(s), {} host failure(s)",
            self.paths,
            self.arcs_created,
            self.corners_clamped,
            self.corners_forced_straight,
            self.check_cycles,
            self.host_failures
        )
    }
}

/// Summary of one width-transition pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionReport {
    /// Junctions that received a taper.
    pub junctions: usize,
    /// Interpolated sub-segments created.
    pub sub_segments_created: usize,
    /// Wide segments shortened at their junction end.
    pub wide_segments_shortened: usize,
    /// Previously generated transitions unwound before regeneration.
    pub transitions_unwound: usize,
    /// Create/delete calls the host rejected.
    pub host_failures: usize,
}

impl fmt::Display for TransitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} junction(s) tapered with {} sub-segment(s), {} wide segment(s) shortened, \
             {} host failure(s)",
            self.junctions, self.sub_segments_created, self.wide_segments_shortened, self.host_failures
        )
    }
}
