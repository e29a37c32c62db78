use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::Point;
use crate::segment::Segment;

/// One endpoint of one segment, as stored in the R-tree.
#[derive(Debug, Clone)]
pub struct EndpointEntry {
    /// Index into the group's segment slice.
    pub segment_index: usize,
    /// Whether this entry is the segment's `start` endpoint.
    pub is_start: bool,
    pub position: Point,
}

impl RTreeObject for EndpointEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.position.x, self.position.y])
    }
}

/// Spatial index over segment endpoints, for junction candidate discovery.
pub struct EndpointIndex {
    tree: RTree<EndpointEntry>,
}

impl EndpointIndex {
    /// Build the index from a group of segments. Degenerate segments are
    /// skipped; they never form a meaningful junction.
    pub fn build(segments: &[Segment]) -> Self {
        let entries: Vec<EndpointEntry> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_degenerate())
            .flat_map(|(i, s)| {
                [
                    EndpointEntry {
                        segment_index: i,
                        is_start: true,
                        position: s.start,
                    },
                    EndpointEntry {
                        segment_index: i,
                        is_start: false,
                        position: s.end,
                    },
                ]
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// All endpoints within `tol` of the given point.
    pub fn near(&self, point: &Point, tol: f64) -> Vec<&EndpointEntry> {
        let envelope = AABB::from_corners(
            [point.x - tol, point.y - tol],
            [point.x + tol, point.y + tol],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|e| e.position.distance_to(point) <= tol)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
