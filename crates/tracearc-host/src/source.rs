use serde::{Deserialize, Serialize};

use tracearc_core::Segment;

use crate::error::HostError;

/// Which primitives a pass operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    Selected,
    All,
}

/// Yields straight, line-like segments for a pass.
///
/// Polylines arrive pre-exploded into straight sub-segments, each carrying
/// an `origin` back-reference to the polyline primitive so the engine can
/// delete the whole polyline in one call.
pub trait SegmentSource {
    fn segments(&mut self, scope: Scope) -> Result<Vec<Segment>, HostError>;
}
