use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Vec2};

/// Opaque identifier of a host primitive (line, arc, or source polyline).
pub type PrimitiveId = Uuid;

/// A conductor layer index.
pub type LayerId = u32;

/// Endpoint coordinates are matched at this decimal precision, absorbing
/// float round-trip error from the host.
pub const COORD_DECIMALS: i32 = 3;

/// Quantized endpoint key for adjacency and junction lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey(i64, i64);

impl CoordKey {
    pub fn of(p: &Point) -> Self {
        let scale = 10f64.powi(COORD_DECIMALS);
        Self((p.x * scale).round() as i64, (p.y * scale).round() as i64)
    }
}

/// A straight trace segment as read from the host.
///
/// Orientation is not meaningful; either endpoint may act as "start" during
/// path assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: PrimitiveId,
    pub start: Point,
    pub end: Point,
    pub width: f64,
    pub net: String,
    pub layer: LayerId,
    /// Source polyline primitive when the host pre-exploded this segment.
    pub origin: Option<PrimitiveId>,
}

impl Segment {
    pub fn new(
        id: PrimitiveId,
        start: Point,
        end: Point,
        width: f64,
        net: &str,
        layer: LayerId,
    ) -> Self {
        Self {
            id,
            start,
            end,
            width,
            net: net.to_string(),
            layer,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: PrimitiveId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Both endpoints quantize to the same key: effectively zero length.
    pub fn is_degenerate(&self) -> bool {
        CoordKey::of(&self.start) == CoordKey::of(&self.end)
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// The endpoint farther from `p`. Matching by distance tolerates two
    /// segments carrying slightly different floats for a shared joint.
    pub fn far_end(&self, p: &Point) -> Point {
        if self.start.distance_to(p) <= self.end.distance_to(p) {
            self.end
        } else {
            self.start
        }
    }

    /// Unit direction from endpoint `p` into the segment body.
    pub fn direction_from(&self, p: &Point) -> Option<Vec2> {
        Vec2::between(p, &self.far_end(p)).normalized()
    }

    /// Primitive to delete when this segment is replaced. A pre-exploded
    /// polyline is deleted through its origin primitive.
    pub fn delete_target(&self) -> PrimitiveId {
        self.origin.unwrap_or(self.id)
    }
}

/// Net + layer grouping key; geometry never merges across nets or layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetLayerKey {
    pub net: String,
    pub layer: LayerId,
}

impl NetLayerKey {
    pub fn of(segment: &Segment) -> Self {
        Self {
            net: segment.net.clone(),
            layer: segment.layer,
        }
    }
}

/// Partition segments into independent net+layer groups.
pub fn group_by_net_layer(segments: Vec<Segment>) -> HashMap<NetLayerKey, Vec<Segment>> {
    let mut groups: HashMap<NetLayerKey, Vec<Segment>> = HashMap::new();
    for segment in segments {
        groups
            .entry(NetLayerKey::of(&segment))
            .or_default()
            .push(segment);
    }
    groups
}
