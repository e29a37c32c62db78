//! # TraceArc Core
//!
//! Pure geometry engine for trace beautification: recovery of continuous
//! trace paths from unordered segments, tangent-circle corner smoothing
//! with U-turn pair merging, and width-transition profile generation.
//!
//! This crate never talks to the host. It turns segments into drawing
//! instructions and taper plans; creating and deleting primitives is the
//! caller's job.

pub mod geometry;
pub mod segment;
pub mod spatial;
pub mod path;
pub mod corner;
pub mod transition;

pub use geometry::{Point, Vec2};
pub use segment::{group_by_net_layer, CoordKey, LayerId, NetLayerKey, PrimitiveId, Segment};
pub use path::{extract_paths, TracePath};
pub use corner::{
    smooth_path, CornerOutcome, CornerState, CornerStates, OpKind, PathOp, RadiusPolicy,
    SmoothOptions, SmoothedPath,
};
pub use transition::{plan_transitions, SubSegment, TransitionOptions, TransitionPlan};
