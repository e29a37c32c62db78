use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::{self, cubic_bezier, lerp, smootherstep, Point, EPS};
use crate::segment::Segment;
use crate::spatial::EndpointIndex;

/// Coincident-endpoint tolerance; matches the 3-decimal coordinate keys.
pub const COINCIDENCE_TOL: f64 = 1e-3;

/// Width differences at or below this are not worth a taper.
pub const WIDTH_DELTA_TOL: f64 = 1e-3;

/// Adjoining directions must be within this many degrees of dead-straight.
pub const COLLINEAR_TOL_DEG: f64 = 7.5;

/// Lower bound on generated sub-segments per junction.
pub const MIN_SUB_SEGMENTS: usize = 2;

/// A side never gives up more than this share of its own length.
const MAX_SIDE_FRACTION: f64 = 0.9;

/// Options for one width-transition pass over a net+layer group.
#[derive(Debug, Clone, Copy)]
pub struct TransitionOptions {
    /// Ideal total taper length = width delta × this ratio.
    pub length_ratio: f64,
    /// Upper bound on taper sub-segments per junction.
    pub max_segments: usize,
    /// Length split across the junction: 0 puts the whole taper on the
    /// narrow side, 100 entirely on the wide side.
    pub balance: u8,
}

/// One interpolated piece of a width taper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSegment {
    pub start: Point,
    pub end: Point,
    pub width: f64,
}

/// A planned taper at one junction of differently-wide collinear segments.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub junction: Point,
    /// Index of the wider segment in the input slice.
    pub wide_index: usize,
    /// Index of the narrower segment in the input slice.
    pub narrow_index: usize,
    pub wide_portion: f64,
    pub narrow_portion: f64,
    /// Replacement geometry for the wide segment, pulled back from the
    /// junction. `None` when the balance puts the whole taper on the
    /// narrow side.
    pub shortened_wide: Option<(Point, Point)>,
    /// Interpolated pieces from the wide end to the narrow end; the last
    /// piece's width equals the narrow width exactly.
    pub sub_segments: Vec<SubSegment>,
}

/// Find every junction of two differently-wide, collinear-enough segments
/// in a net+layer group and plan a taper for each.
pub fn plan_transitions(segments: &[Segment], opts: &TransitionOptions) -> Vec<TransitionPlan> {
    let index = EndpointIndex::build(segments);
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut plans = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_degenerate() {
            continue;
        }
        for endpoint in [segment.start, segment.end] {
            for entry in index.near(&endpoint, COINCIDENCE_TOL) {
                let j = entry.segment_index;
                if j == i {
                    continue;
                }
                let pair = (i.min(j), i.max(j));
                if !seen.insert(pair) {
                    continue;
                }
                if let Some(plan) = plan_junction(segments, i, endpoint, j, opts) {
                    plans.push(plan);
                }
            }
        }
    }

    debug!(
        "planned {} width transition(s) across {} segment(s)",
        plans.len(),
        segments.len()
    );
    plans
}

/// Plan the taper for one candidate junction, or reject it.
fn plan_junction(
    segments: &[Segment],
    i: usize,
    junction: Point,
    j: usize,
    opts: &TransitionOptions,
) -> Option<TransitionPlan> {
    let (a, b) = (&segments[i], &segments[j]);
    if (a.width - b.width).abs() <= WIDTH_DELTA_TOL {
        return None;
    }

    // Directions away from the junction, into each segment body.
    let dir_a = a.direction_from(&junction)?;
    let dir_b = b.direction_from(&junction)?;

    // The two traces must run through the junction nearly straight.
    let angle = geometry::angle_between(&dir_a, &dir_b)?;
    if angle.to_degrees() < 180.0 - COLLINEAR_TOL_DEG {
        return None;
    }

    let (wide_index, narrow_index) = if a.width > b.width { (i, j) } else { (j, i) };
    let wide = &segments[wide_index];
    let narrow = &segments[narrow_index];
    let (dir_wide, dir_narrow) = if a.width > b.width {
        (dir_a, dir_b)
    } else {
        (dir_b, dir_a)
    };

    let delta = wide.width - narrow.width;
    let total = delta * opts.length_ratio;
    if total <= EPS {
        return None;
    }

    let balance = (opts.balance.min(100)) as f64 / 100.0;
    let wide_portion = (total * balance).min(MAX_SIDE_FRACTION * wide.length());
    let narrow_portion = (total * (1.0 - balance)).min(MAX_SIDE_FRACTION * narrow.length());
    let run = wide_portion + narrow_portion;
    if run <= EPS {
        return None;
    }

    // One piece per two units of width delta, at least one per four narrow
    // widths of run length, bounded by the configured maximum.
    let by_delta = (delta / 2.0).ceil() as usize;
    let by_length = (run / (4.0 * narrow.width.max(EPS))).ceil() as usize;
    let count = by_delta
        .max(by_length)
        .clamp(MIN_SUB_SEGMENTS, opts.max_segments.max(MIN_SUB_SEGMENTS));

    let taper_start = junction.along(&dir_wide, wide_portion);
    let point_at = |s: f64| -> Point {
        if s < wide_portion {
            junction.along(&dir_wide, wide_portion - s)
        } else {
            junction.along(&dir_narrow, s - wide_portion)
        }
    };

    // Width profile: a cubic Bezier over the width span, evaluated at the
    // smootherstep-eased trailing position of each piece. Evenly spaced
    // control values reduce the curve to a straight blend between the two
    // widths, so the final piece lands on the narrow width exactly.
    let c1 = lerp(wide.width, narrow.width, 1.0 / 3.0);
    let c2 = lerp(wide.width, narrow.width, 2.0 / 3.0);
    let mut sub_segments = Vec::with_capacity(count);
    let mut prev = taper_start;
    for k in 1..=count {
        let t = k as f64 / count as f64;
        let end = point_at(run * t);
        let width = cubic_bezier(wide.width, c1, c2, narrow.width, smootherstep(t));
        sub_segments.push(SubSegment {
            start: prev,
            end,
            width,
        });
        prev = end;
    }

    let shortened_wide = if wide_portion > EPS {
        Some((wide.far_end(&junction), taper_start))
    } else {
        None
    };

    Some(TransitionPlan {
        junction,
        wide_index,
        narrow_index,
        wide_portion,
        narrow_portion,
        shortened_wide,
        sub_segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64, width: f64) -> Segment {
        Segment::new(
            Uuid::new_v4(),
            Point::new(x1, y1),
            Point::new(x2, y2),
            width,
            "SIG",
            1,
        )
    }

    fn opts() -> TransitionOptions {
        TransitionOptions {
            length_ratio: 3.0,
            max_segments: 16,
            balance: 50,
        }
    }

    #[test]
    fn test_balanced_taper_between_wide_and_narrow() {
        // Widths 30 and 10 meeting head-on: delta 20 at ratio 3 gives a
        // 60-unit taper, 30 on each side at balance 50.
        let segments = vec![
            seg(-100.0, 0.0, 0.0, 0.0, 30.0),
            seg(0.0, 0.0, 100.0, 0.0, 10.0),
        ];
        let plans = plan_transitions(&segments, &opts());
        assert_eq!(plans.len(), 1);
        let plan = &plans[0];

        assert_eq!(plan.wide_index, 0);
        assert_eq!(plan.narrow_index, 1);
        assert!((plan.wide_portion - 30.0).abs() < 1e-9);
        assert!((plan.narrow_portion - 30.0).abs() < 1e-9);

        // Taper runs from (-30, 0) to (30, 0).
        let first = plan.sub_segments.first().unwrap();
        let last = plan.sub_segments.last().unwrap();
        assert!((first.start.x + 30.0).abs() < 1e-9);
        assert!((last.end.x - 30.0).abs() < 1e-9);

        // The wide segment gives up its junction end.
        let (far, near) = plan.shortened_wide.unwrap();
        assert!((far.x + 100.0).abs() < 1e-9);
        assert!((near.x + 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_widths_strictly_decreasing_to_exact_narrow() {
        let segments = vec![
            seg(-100.0, 0.0, 0.0, 0.0, 30.0),
            seg(0.0, 0.0, 100.0, 0.0, 10.0),
        ];
        let plans = plan_transitions(&segments, &opts());
        let widths: Vec<f64> = plans[0].sub_segments.iter().map(|s| s.width).collect();

        for pair in widths.windows(2) {
            assert!(pair[1] < pair[0]);
        }
        assert!(widths[0] < 30.0);
        // Exact seam: no visible step against the narrow trace.
        assert_eq!(*widths.last().unwrap(), 10.0);
    }

    #[test]
    fn test_equal_widths_not_tapered() {
        let segments = vec![
            seg(-100.0, 0.0, 0.0, 0.0, 10.0),
            seg(0.0, 0.0, 100.0, 0.0, 10.0),
        ];
        assert!(plan_transitions(&segments, &opts()).is_empty());
    }

    #[test]
    fn test_right_angle_junction_not_tapered() {
        let segments = vec![
            seg(-100.0, 0.0, 0.0, 0.0, 30.0),
            seg(0.0, 0.0, 0.0, 100.0, 10.0),
        ];
        assert!(plan_transitions(&segments, &opts()).is_empty());
    }

    #[test]
    fn test_slightly_bent_junction_within_tolerance() {
        // 5 degrees off dead-straight: still a taper candidate.
        let rad = 5.0_f64.to_radians();
        let segments = vec![
            seg(-100.0, 0.0, 0.0, 0.0, 30.0),
            seg(0.0, 0.0, 100.0 * rad.cos(), 100.0 * rad.sin(), 10.0),
        ];
        assert_eq!(plan_transitions(&segments, &opts()).len(), 1);
    }

    #[test]
    fn test_disjoint_segments_not_tapered() {
        let segments = vec![
            seg(-100.0, 0.0, -1.0, 0.0, 30.0),
            seg(0.0, 0.0, 100.0, 0.0, 10.0),
        ];
        assert!(plan_transitions(&segments, &opts()).is_empty());
    }

    #[test]
    fn test_balance_zero_keeps_wide_segment_whole() {
        let segments = vec![
            seg(-100.0, 0.0, 0.0, 0.0, 30.0),
            seg(0.0, 0.0, 100.0, 0.0, 10.0),
        ];
        let options = TransitionOptions {
            balance: 0,
            ..opts()
        };
        let plans = plan_transitions(&segments, &options);
        let plan = &plans[0];
        assert!(plan.shortened_wide.is_none());
        assert!(plan.wide_portion.abs() < 1e-12);
        assert!((plan.narrow_portion - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_side_portion_capped_by_segment_length() {
        // Narrow segment only 10 long: its side of the taper caps at 9.
        let segments = vec![
            seg(-100.0, 0.0, 0.0, 0.0, 30.0),
            seg(0.0, 0.0, 10.0, 0.0, 10.0),
        ];
        let plans = plan_transitions(&segments, &opts());
        let plan = &plans[0];
        assert!((plan.narrow_portion - 9.0).abs() < 1e-9);
        assert!((plan.wide_portion - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_sub_segment_count_bounded() {
        let segments = vec![
            seg(-100.0, 0.0, 0.0, 0.0, 30.0),
            seg(0.0, 0.0, 100.0, 0.0, 10.0),
        ];
        let options = TransitionOptions {
            max_segments: 4,
            ..opts()
        };
        let plans = plan_transitions(&segments, &options);
        assert_eq!(plans[0].sub_segments.len(), 4);

        let plans = plan_transitions(&segments, &opts());
        // delta 20 → 10 pieces, under the default cap of 16.
        assert_eq!(plans[0].sub_segments.len(), 10);
    }
}
