use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::geometry::Point;
use crate::segment::{CoordKey, Segment};

/// A maximal simple chain of connected segments on one net+layer.
///
/// Consecutive points are the two endpoints of exactly one contributing
/// segment; `segments[k]` spans `points[k]` → `points[k + 1]`. Chains stop
/// at branch points (coordinate degree > 2) and never revisit their own
/// first point.
#[derive(Debug, Clone)]
pub struct TracePath {
    pub points: Vec<Point>,
    pub segments: Vec<Segment>,
}

impl TracePath {
    /// Number of interior corners (points with a neighbor on both sides).
    pub fn corner_count(&self) -> usize {
        self.points.len().saturating_sub(2)
    }

    /// Width of the leg from `points[leg]` to `points[leg + 1]`.
    pub fn leg_width(&self, leg: usize) -> f64 {
        self.segments[leg].width
    }

    /// Whether the chain closed back onto its own first point.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2
            && CoordKey::of(&self.points[0]) == CoordKey::of(self.points.last().unwrap())
    }
}

/// Recover maximal simple paths from an unordered set of segments.
///
/// Builds an adjacency index over quantized endpoint keys and walks it from
/// each unvisited segment, growing the chain at both ends until a branch
/// point (degree > 2), a dead end, or the chain's own first point is
/// reached. Chains of fewer than 3 points carry no interior corner and are
/// discarded.
pub fn extract_paths(segments: &[Segment]) -> Vec<TracePath> {
    // Zero-length segments would self-loop on a single coordinate key.
    let usable: Vec<&Segment> = segments.iter().filter(|s| !s.is_degenerate()).collect();

    let mut adjacency: HashMap<CoordKey, Vec<usize>> = HashMap::new();
    for (idx, seg) in usable.iter().enumerate() {
        adjacency.entry(CoordKey::of(&seg.start)).or_default().push(idx);
        adjacency.entry(CoordKey::of(&seg.end)).or_default().push(idx);
    }

    let mut visited = vec![false; usable.len()];
    let mut paths = Vec::new();

    for seed in 0..usable.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let seg = usable[seed];

        let mut points: VecDeque<Point> = VecDeque::from([seg.start, seg.end]);
        let mut chain: VecDeque<Segment> = VecDeque::from([(*seg).clone()]);

        extend_end(&mut points, &mut chain, &adjacency, &usable, &mut visited, End::Back);
        extend_end(&mut points, &mut chain, &adjacency, &usable, &mut visited, End::Front);

        if points.len() >= 3 {
            paths.push(TracePath {
                points: points.into(),
                segments: chain.into(),
            });
        }
    }

    debug!(
        "extracted {} path(s) from {} segment(s)",
        paths.len(),
        segments.len()
    );
    paths
}

#[derive(Clone, Copy, PartialEq)]
enum End {
    Front,
    Back,
}

fn extend_end(
    points: &mut VecDeque<Point>,
    chain: &mut VecDeque<Segment>,
    adjacency: &HashMap<CoordKey, Vec<usize>>,
    usable: &[&Segment],
    visited: &mut [bool],
    end: End,
) {
    loop {
        let tip = match end {
            End::Back => *points.back().unwrap(),
            End::Front => *points.front().unwrap(),
        };
        let key = CoordKey::of(&tip);
        let incident = match adjacency.get(&key) {
            Some(list) => list,
            None => return,
        };
        // A tee or cross terminates the chain here.
        if incident.len() > 2 {
            return;
        }
        let next_idx = match incident.iter().find(|&&idx| !visited[idx]) {
            Some(&idx) => idx,
            None => return,
        };
        visited[next_idx] = true;
        let next = usable[next_idx];
        let far = next.far_end(&tip);

        let first = match end {
            End::Back => *points.front().unwrap(),
            End::Front => *points.back().unwrap(),
        };
        let closes_loop = CoordKey::of(&far) == CoordKey::of(&first);

        match end {
            End::Back => {
                points.push_back(far);
                chain.push_back((*next).clone());
            }
            End::Front => {
                points.push_front(far);
                chain.push_front((*next).clone());
            }
        }
        // Closing the chain onto its own first point must terminate the
        // walk, not keep orbiting the loop.
        if closes_loop {
            return;
        }
    }
}
