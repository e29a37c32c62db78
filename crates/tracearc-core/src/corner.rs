use std::collections::HashMap;
use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Point, Vec2, EPS};
use crate::path::TracePath;

/// Fraction of the shorter adjacent leg a tangent length may occupy.
pub const MAX_LEG_FRACTION: f64 = 0.45;

/// Below this fraction of the requested tangent length a corner counts as
/// radius-clamped.
const CLAMP_FLAG_RATIO: f64 = 0.95;

/// Tangent lengths at or below this are unusable; the corner stays sharp.
pub const MIN_TANGENT: f64 = 0.05;

/// Slack subtracted from the half-width floor before rejecting an arc.
const WIDTH_FLOOR_TOL: f64 = 1e-3;

/// A stub shorter than this multiple of the nominal radius makes a
/// same-direction corner pair a merge candidate.
const MERGE_STUB_FACTOR: f64 = 1.5;

/// Radius scales below this floor are unusable; the corner reverts to a
/// sharp joint for the remainder of the invocation.
pub const MIN_CORNER_SCALE: f64 = 0.1;

/// How the nominal corner radius is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RadiusPolicy {
    /// The same radius at every corner.
    Fixed(f64),
    /// Radius = wider adjacent trace width × this ratio.
    WidthRatio(f64),
}

impl RadiusPolicy {
    pub fn nominal(&self, width_in: f64, width_out: f64) -> f64 {
        match *self {
            RadiusPolicy::Fixed(r) => r,
            RadiusPolicy::WidthRatio(ratio) => width_in.max(width_out) * ratio,
        }
    }
}

/// Per-corner radius adjustment state, mutated by the DRC feedback loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerState {
    /// Fraction of the nominal radius currently in effect, in (0, 1].
    pub scale: f64,
    /// The radius fell below the usability floor; this corner stays a
    /// sharp joint for the rest of the invocation.
    pub forced_straight: bool,
}

impl Default for CornerState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            forced_straight: false,
        }
    }
}

/// Per-corner states keyed by the path-interior point index.
pub type CornerStates = HashMap<usize, CornerState>;

/// Options for one smoothing pass over a path.
#[derive(Debug, Clone, Copy)]
pub struct SmoothOptions {
    pub policy: RadiusPolicy,
    /// Accept arcs whose tangent length was clamped by the leg rule. Never
    /// overrides the width floor.
    pub force_arc: bool,
    /// Merge same-direction corner pairs joined by a short stub into one
    /// arc instead of two nearly-touching ones.
    pub merge_u_turns: bool,
}

/// A drawing instruction derived from a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpKind {
    Line {
        start: Point,
        end: Point,
        width: f64,
    },
    Arc {
        start: Point,
        end: Point,
        /// Signed sweep in degrees; positive turns counter-clockwise.
        sweep_deg: f64,
        width: f64,
    },
}

impl OpKind {
    pub fn width(&self) -> f64 {
        match *self {
            OpKind::Line { width, .. } | OpKind::Arc { width, .. } => width,
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, OpKind::Arc { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathOp {
    pub kind: OpKind,
    /// Interior point index this op is attributed to for DRC feedback.
    /// Straight ops carry the corner they lead into; the tail op carries
    /// none.
    pub corner: Option<usize>,
}

/// What happened at one interior corner during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CornerOutcome {
    /// A tangent arc was fitted at full (scaled) radius.
    Arc,
    /// An arc was fitted although the leg rule clamped the tangent length.
    ClampedArc,
    /// Folded into the preceding corner's merged arc.
    Merged,
    /// The leg clamp rejected the arc and arcs were not forced.
    ClampRejected,
    /// The effective radius fell below the half-width floor.
    FloorRejected,
    /// Kept sharp by the feedback loop.
    ForcedStraight,
    /// Zero-length leg, collinear corner, or unusably small tangent.
    Degenerate,
}

/// Result of smoothing one path.
#[derive(Debug, Clone)]
pub struct SmoothedPath {
    pub ops: Vec<PathOp>,
    /// Outcome per interior corner, in path order.
    pub outcomes: Vec<(usize, CornerOutcome)>,
}

impl SmoothedPath {
    pub fn arc_count(&self) -> usize {
        self.ops.iter().filter(|op| op.kind.is_arc()).count()
    }

    pub fn clamped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, CornerOutcome::ClampedArc | CornerOutcome::ClampRejected))
            .count()
    }
}

struct CornerFit {
    t1: Point,
    t2: Point,
    sweep_deg: f64,
    clamped: bool,
}

/// Replace the sharp corners of a path with tangent-circle arcs.
///
/// Corners the geometry cannot support (short legs, width floor, forced
/// straight by feedback) are kept as sharp joints; the pass never fails.
pub fn smooth_path(path: &TracePath, states: &CornerStates, opts: &SmoothOptions) -> SmoothedPath {
    let pts = &path.points;
    let mut ops: Vec<PathOp> = Vec::new();
    let mut outcomes: Vec<(usize, CornerOutcome)> = Vec::new();
    let mut cursor = pts[0];

    let last = pts.len() - 1;
    let mut i = 1;
    while i < last {
        // A short same-direction stub between two corners would produce two
        // radii nearly touching; try one spanning arc first.
        if opts.merge_u_turns && i + 1 < last {
            let state_a = states.get(&i).copied().unwrap_or_default();
            let state_b = states.get(&(i + 1)).copied().unwrap_or_default();
            if let Some(fit) = fit_merged_pair(path, i, &state_a, &state_b, opts) {
                let outcome = if fit.clamped {
                    CornerOutcome::ClampedArc
                } else {
                    CornerOutcome::Arc
                };
                push_line(&mut ops, cursor, fit.t1, path.leg_width(i - 1), Some(i));
                ops.push(PathOp {
                    kind: OpKind::Arc {
                        start: fit.t1,
                        end: fit.t2,
                        sweep_deg: fit.sweep_deg,
                        width: path.leg_width(i + 1),
                    },
                    corner: Some(i),
                });
                outcomes.push((i, outcome));
                outcomes.push((i + 1, CornerOutcome::Merged));
                cursor = fit.t2;
                i += 2;
                continue;
            }
        }

        let state = states.get(&i).copied().unwrap_or_default();
        match fit_corner(path, i, &state, opts) {
            Ok(fit) => {
                let outcome = if fit.clamped {
                    CornerOutcome::ClampedArc
                } else {
                    CornerOutcome::Arc
                };
                push_line(&mut ops, cursor, fit.t1, path.leg_width(i - 1), Some(i));
                ops.push(PathOp {
                    kind: OpKind::Arc {
                        start: fit.t1,
                        end: fit.t2,
                        sweep_deg: fit.sweep_deg,
                        width: path.leg_width(i),
                    },
                    corner: Some(i),
                });
                outcomes.push((i, outcome));
                cursor = fit.t2;
            }
            Err(outcome) => {
                debug!("corner {} kept sharp: {:?}", i, outcome);
                push_line(&mut ops, cursor, pts[i], path.leg_width(i - 1), Some(i));
                outcomes.push((i, outcome));
                cursor = pts[i];
            }
        }
        i += 1;
    }

    push_line(&mut ops, cursor, pts[last], path.leg_width(last - 1), None);

    SmoothedPath { ops, outcomes }
}

fn push_line(ops: &mut Vec<PathOp>, start: Point, end: Point, width: f64, corner: Option<usize>) {
    // The previous arc's exit tangent can coincide with the next tangent
    // point; a zero-length line would be rejected by the host anyway.
    if start.distance_to(&end) <= EPS {
        return;
    }
    ops.push(PathOp {
        kind: OpKind::Line { start, end, width },
        corner,
    });
}

/// Fit a tangent circle at interior point `i`, or report why the corner
/// stays sharp.
fn fit_corner(
    path: &TracePath,
    i: usize,
    state: &CornerState,
    opts: &SmoothOptions,
) -> Result<CornerFit, CornerOutcome> {
    if state.forced_straight {
        return Err(CornerOutcome::ForcedStraight);
    }

    let prev = path.points[i - 1];
    let p = path.points[i];
    let next = path.points[i + 1];

    let leg1 = Vec2::between(&p, &prev);
    let leg2 = Vec2::between(&p, &next);
    let (u1, u2) = match (leg1.normalized(), leg2.normalized()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(CornerOutcome::Degenerate),
    };
    let angle = match geometry::angle_between(&leg1, &leg2) {
        Some(a) => a,
        None => return Err(CornerOutcome::Degenerate),
    };
    // A collinear corner has nothing to round; the tangent length would be
    // zero there.
    if angle >= PI - 1e-6 {
        return Err(CornerOutcome::Degenerate);
    }

    let width_in = path.leg_width(i - 1);
    let width_out = path.leg_width(i);
    let radius = opts.policy.nominal(width_in, width_out) * state.scale;
    if radius <= EPS {
        return Err(CornerOutcome::Degenerate);
    }

    let half_tan = (angle / 2.0).tan();
    if half_tan <= EPS {
        return Err(CornerOutcome::Degenerate);
    }
    let wanted = radius / half_tan;
    let max_d = MAX_LEG_FRACTION * leg1.length().min(leg2.length());
    let actual_d = wanted.min(max_d);
    let clamped = actual_d < CLAMP_FLAG_RATIO * wanted;

    if actual_d <= MIN_TANGENT {
        return Err(CornerOutcome::Degenerate);
    }

    // The width floor is enforced unconditionally: an arc narrower than the
    // trace itself would pinch the copper at the corner.
    let effective_radius = actual_d * half_tan;
    if effective_radius < width_in.max(width_out) / 2.0 - WIDTH_FLOOR_TOL {
        return Err(CornerOutcome::FloorRejected);
    }

    if clamped && !opts.force_arc {
        return Err(CornerOutcome::ClampRejected);
    }

    let v_in = Vec2::between(&prev, &p);
    let v_out = Vec2::between(&p, &next);
    let sweep_deg = (180.0 - angle.to_degrees()).copysign(v_in.cross(&v_out));

    Ok(CornerFit {
        t1: p.along(&u1, actual_d),
        t2: p.along(&u2, actual_d),
        sweep_deg,
        clamped,
    })
}

/// Try to span corners `i` and `i + 1` with a single arc fitted at the
/// intersection of their outer legs. `None` falls back to per-corner
/// processing.
fn fit_merged_pair(
    path: &TracePath,
    i: usize,
    state_a: &CornerState,
    state_b: &CornerState,
    opts: &SmoothOptions,
) -> Option<CornerFit> {
    if state_a.forced_straight || state_b.forced_straight {
        return None;
    }

    let pts = &path.points;
    let outer1 = pts[i - 1];
    let a = pts[i];
    let b = pts[i + 1];
    let outer2 = pts[i + 2];

    // Both corners must bend the same way.
    let cross_a = Vec2::between(&outer1, &a).cross(&Vec2::between(&a, &b));
    let cross_b = Vec2::between(&a, &b).cross(&Vec2::between(&b, &outer2));
    if cross_a * cross_b <= 0.0 {
        return None;
    }

    let widest = path
        .leg_width(i - 1)
        .max(path.leg_width(i))
        .max(path.leg_width(i + 1));
    let nominal = opts.policy.nominal(widest, widest);
    if nominal <= EPS {
        return None;
    }
    let stub = a.distance_to(&b);
    if stub >= MERGE_STUB_FACTOR * nominal {
        return None;
    }

    let radius = nominal * state_a.scale.min(state_b.scale);

    // Virtual corner: where the outer legs, extended through both corners,
    // meet.
    let dir1 = Vec2::between(&outer1, &a);
    let dir2 = Vec2::between(&outer2, &b);
    let x = geometry::line_intersection(&outer1, &dir1, &outer2, &dir2)?;

    let vx1 = Vec2::between(&x, &outer1);
    let vx2 = Vec2::between(&x, &outer2);
    let (u1, u2) = match (vx1.normalized(), vx2.normalized()) {
        (Some(p), Some(q)) => (p, q),
        _ => return None,
    };
    let angle = geometry::angle_between(&vx1, &vx2)?;
    if angle >= PI - 1e-6 {
        return None;
    }
    let half_tan = (angle / 2.0).tan();
    if half_tan <= EPS {
        return None;
    }

    let wanted = radius / half_tan;
    let max_d = MAX_LEG_FRACTION * vx1.length().min(vx2.length());
    let actual_d = wanted.min(max_d);
    let clamped = actual_d < CLAMP_FLAG_RATIO * wanted;
    if actual_d <= MIN_TANGENT {
        return None;
    }

    // The spanning arc must reach past both original corners, otherwise it
    // leaves the stub poking out.
    if actual_d + EPS < x.distance_to(&a).max(x.distance_to(&b)) {
        return None;
    }

    let effective_radius = actual_d * half_tan;
    if effective_radius < widest / 2.0 - WIDTH_FLOOR_TOL {
        return None;
    }
    if clamped && !opts.force_arc {
        return None;
    }

    let sweep_deg = (180.0 - angle.to_degrees()).copysign(cross_a);
    debug!(
        "merged corners {} and {} into one arc (sweep {:.1} deg)",
        i,
        i + 1,
        sweep_deg
    );

    Some(CornerFit {
        t1: x.along(&u1, actual_d),
        t2: x.along(&u2, actual_d),
        sweep_deg,
        clamped,
    })
}
