use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use tracearc_core::corner::MIN_CORNER_SCALE;

use crate::engine::{Beautifier, EmittedPath};

/// Progress of the emit → check → repair loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    /// First emission, every corner at full radius.
    Optimistic,
    /// Waiting on a design check result.
    Checking,
    /// Some generated corner is implicated; radii are being backed off.
    Repairing,
    /// No violations attributable to this engine remain.
    Clean,
    /// The retry budget ran out; remaining offenders were forced straight.
    Exhausted,
}

/// Result of one feedback loop run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FeedbackOutcome {
    pub state: LoopState,
    /// Check cycles actually run.
    pub cycles: usize,
    /// Violating primitives observed that never traced back to a corner.
    pub unrelated: usize,
}

impl<'a> Beautifier<'a> {
    /// Repeatedly check the design and back off the radius of every
    /// implicated corner until the check is clean or the retry budget is
    /// exhausted.
    ///
    /// Each implicated corner's scale is halved per cycle; once halving
    /// would cross the usability floor, or on the final allowed cycle, the
    /// corner is forced straight instead. Scales never grow. Only paths
    /// with an implicated corner are re-emitted.
    pub(crate) fn run_feedback(&mut self, paths: &mut [EmittedPath]) -> FeedbackOutcome {
        let mut outcome = FeedbackOutcome {
            state: LoopState::Optimistic,
            cycles: 0,
            unrelated: 0,
        };
        let max_checks = self.retry_budget() + 1;

        for check_no in 1..=max_checks {
            outcome.cycles = check_no;
            outcome.state = LoopState::Checking;

            let violating = match self.oracle_check() {
                Ok(set) => set,
                Err(err) => {
                    // Fail open: an oracle outage must not block normal
                    // beautification.
                    warn!("design check unavailable, accepting result as-is: {err}");
                    outcome.state = LoopState::Clean;
                    return outcome;
                }
            };
            if violating.is_empty() {
                info!("design clean after {check_no} check cycle(s)");
                outcome.state = LoopState::Clean;
                return outcome;
            }

            let mut affected: Vec<(usize, usize)> = Vec::new();
            let mut corner_hits = 0usize;
            for (path_idx, ep) in paths.iter().enumerate() {
                for (id, corner) in &ep.prims {
                    if violating.contains(id) {
                        if let Some(corner_idx) = corner {
                            affected.push((path_idx, *corner_idx));
                            corner_hits += 1;
                        }
                    }
                }
            }
            outcome.unrelated += violating.len() - corner_hits;

            if affected.is_empty() {
                // The violation belongs to someone else's copper.
                info!(
                    "{} violation(s) do not involve generated corners; stopping",
                    violating.len()
                );
                outcome.state = LoopState::Clean;
                return outcome;
            }

            outcome.state = LoopState::Repairing;
            let final_chance = check_no == max_checks;
            affected.sort_unstable();
            affected.dedup();

            let mut touched: BTreeSet<usize> = BTreeSet::new();
            for (path_idx, corner_idx) in affected {
                let state = paths[path_idx].states.entry(corner_idx).or_default();
                if final_chance || state.scale * 0.5 < MIN_CORNER_SCALE {
                    state.forced_straight = true;
                    debug!("corner {corner_idx} of path {path_idx} forced straight");
                } else {
                    state.scale *= 0.5;
                    debug!(
                        "corner {corner_idx} of path {path_idx} radius scale now {:.3}",
                        state.scale
                    );
                }
                touched.insert(path_idx);
            }

            for path_idx in touched {
                self.reemit_path(&mut paths[path_idx]);
            }

            if final_chance {
                warn!("retry budget exhausted; remaining offenders forced straight");
                outcome.state = LoopState::Exhausted;
                return outcome;
            }
        }

        outcome
    }
}
