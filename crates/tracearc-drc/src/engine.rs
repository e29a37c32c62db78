use std::collections::HashSet;

use log::{debug, error, info, warn};

use tracearc_core::{
    extract_paths, group_by_net_layer, smooth_path, CornerStates, LayerId, NetLayerKey, OpKind,
    PrimitiveId, Segment, SmoothedPath, TracePath,
};
use tracearc_host::{
    ArcWidthTable, BeautifyConfig, PrimitiveSink, SnapshotStore, ViolationOracle,
};

use crate::report::BeautifyReport;

/// One emitted path: its geometry, corner states, and the primitives
/// currently materialized for it.
pub(crate) struct EmittedPath {
    pub path: TracePath,
    pub states: CornerStates,
    /// Created primitives with their corner attribution, in emission order.
    pub prims: Vec<(PrimitiveId, Option<usize>)>,
    pub stats: EmitStats,
    pub net: String,
    pub layer: LayerId,
}

/// Counters for one emission of one path.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EmitStats {
    pub arcs: usize,
    pub clamped: usize,
}

/// Turns straight trace segments into smoothed routing against a live host.
///
/// One `Beautifier` drives one invocation: it owns the per-corner states
/// and the arc-width side table for the duration of the pass and hands the
/// table back to the caller afterwards.
pub struct Beautifier<'a> {
    config: BeautifyConfig,
    sink: &'a mut dyn PrimitiveSink,
    oracle: &'a mut dyn ViolationOracle,
    snapshots: Option<&'a mut dyn SnapshotStore>,
    arc_widths: ArcWidthTable,
    pub(crate) host_failures: usize,
}

impl<'a> Beautifier<'a> {
    pub fn new(
        config: BeautifyConfig,
        sink: &'a mut dyn PrimitiveSink,
        oracle: &'a mut dyn ViolationOracle,
    ) -> Self {
        Self {
            config: config.sanitized(),
            sink,
            oracle,
            snapshots: None,
            arc_widths: ArcWidthTable::new(),
            host_failures: 0,
        }
    }

    /// Bracket the mutating pass with snapshot captures for undo.
    pub fn with_snapshots(mut self, store: &'a mut dyn SnapshotStore) -> Self {
        self.snapshots = Some(store);
        self
    }

    /// Hand the arc-width side table to the caller (the snapshot layer
    /// consults it in preference to the host's arc accessor).
    pub fn into_arc_widths(self) -> ArcWidthTable {
        self.arc_widths
    }

    /// Run one beautify pass over the given segments.
    ///
    /// Always returns a report; per-primitive host failures and degenerate
    /// geometry are recovered locally and only counted.
    pub fn run(&mut self, segments: Vec<Segment>) -> BeautifyReport {
        let mut report = BeautifyReport::default();
        self.host_failures = 0;
        self.capture_snapshot("before");

        let mut groups: Vec<(NetLayerKey, Vec<Segment>)> =
            group_by_net_layer(segments).into_iter().collect();
        groups.sort_by(|a, b| (&a.0.net, a.0.layer).cmp(&(&b.0.net, b.0.layer)));

        let mut emitted: Vec<EmittedPath> = Vec::new();
        let mut deleted_originals: HashSet<PrimitiveId> = HashSet::new();

        for (key, group) in groups {
            for path in extract_paths(&group) {
                // Delete-old before create-new, one path at a time, so the
                // checker never sees both copies of a trace.
                let targets: Vec<PrimitiveId> = path
                    .segments
                    .iter()
                    .map(|s| s.delete_target())
                    .filter(|id| deleted_originals.insert(*id))
                    .collect();
                if !targets.is_empty() {
                    if let Err(err) = self.sink.delete(&targets) {
                        error!(
                            "failed to delete {} original primitive(s): {err}",
                            targets.len()
                        );
                        self.host_failures += 1;
                    }
                }
                let ep = self.emit_path(path, CornerStates::new(), key.net.clone(), key.layer);
                emitted.push(ep);
            }
        }
        report.paths = emitted.len();

        if self.config.enable_drc && !emitted.is_empty() {
            let outcome = self.run_feedback(&mut emitted);
            report.check_cycles = outcome.cycles;
            report.unrelated_violations = outcome.unrelated;
            report.drc_outcome = Some(outcome.state);
        }

        for ep in &emitted {
            report.arcs_created += ep.stats.arcs;
            report.corners_clamped += ep.stats.clamped;
            report.corners_forced_straight +=
                ep.states.values().filter(|s| s.forced_straight).count();
        }
        report.host_failures = self.host_failures;

        self.capture_snapshot("after");
        info!("beautify pass finished: {report}");
        report
    }

    /// Smooth one path and materialize its ops.
    pub(crate) fn emit_path(
        &mut self,
        path: TracePath,
        states: CornerStates,
        net: String,
        layer: LayerId,
    ) -> EmittedPath {
        let smoothed = smooth_path(&path, &states, &self.config.smooth_options());
        let (prims, stats) = self.create_ops(&net, layer, &smoothed);
        EmittedPath {
            path,
            states,
            prims,
            stats,
            net,
            layer,
        }
    }

    /// Delete a path's current primitives and emit it again with its
    /// updated corner states.
    pub(crate) fn reemit_path(&mut self, ep: &mut EmittedPath) {
        let ids: Vec<PrimitiveId> = ep.prims.iter().map(|(id, _)| *id).collect();
        if !ids.is_empty() {
            if let Err(err) = self.sink.delete(&ids) {
                error!("failed to delete {} re-emitted primitive(s): {err}", ids.len());
                self.host_failures += 1;
            }
            for id in &ids {
                self.arc_widths.forget(id);
            }
        }
        let smoothed = smooth_path(&ep.path, &ep.states, &self.config.smooth_options());
        let net = ep.net.clone();
        let (prims, stats) = self.create_ops(&net, ep.layer, &smoothed);
        ep.prims = prims;
        ep.stats = stats;
    }

    fn create_ops(
        &mut self,
        net: &str,
        layer: LayerId,
        smoothed: &SmoothedPath,
    ) -> (Vec<(PrimitiveId, Option<usize>)>, EmitStats) {
        let mut prims = Vec::new();
        let mut stats = EmitStats {
            clamped: smoothed.clamped_count(),
            ..Default::default()
        };
        for op in &smoothed.ops {
            let created = match op.kind {
                OpKind::Line { start, end, width } => {
                    self.sink.create_line(net, layer, start, end, width)
                }
                OpKind::Arc {
                    start,
                    end,
                    sweep_deg,
                    width,
                } => self
                    .sink
                    .create_arc(net, layer, start, end, sweep_deg, width)
                    .map(|id| {
                        self.arc_widths.record(id, width);
                        stats.arcs += 1;
                        id
                    }),
            };
            match created {
                Ok(id) => prims.push((id, op.corner)),
                Err(err) => {
                    error!("primitive creation failed, continuing: {err}");
                    self.host_failures += 1;
                }
            }
        }
        debug!(
            "emitted {} primitive(s) ({} arc(s)) on net {net} layer {layer}",
            prims.len(),
            stats.arcs
        );
        (prims, stats)
    }

    pub(crate) fn oracle_check(
        &mut self,
    ) -> Result<tracearc_host::ViolationSet, tracearc_host::HostError> {
        self.oracle.check()
    }

    pub(crate) fn retry_budget(&self) -> usize {
        self.config.drc_retry_count as usize
    }

    fn capture_snapshot(&mut self, when: &str) {
        if let Some(store) = self.snapshots.as_deref_mut() {
            match store.capture() {
                Ok(_) => debug!("captured {when} snapshot"),
                Err(err) => warn!("snapshot capture ({when}) failed: {err}"),
            }
        }
    }
}
