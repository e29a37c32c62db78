use std::collections::{HashMap, HashSet};

use log::{debug, error, info};

use tracearc_core::{
    group_by_net_layer, plan_transitions, CoordKey, NetLayerKey, PrimitiveId, Segment,
    TransitionOptions, TransitionPlan,
};
use tracearc_host::{BeautifyConfig, PrimitiveSink};

use crate::report::TransitionReport;

/// Everything created for one junction, so the taper can be unwound before
/// it is regenerated.
struct LedgerEntry {
    /// Interpolated sub-segment primitives.
    created: Vec<PrimitiveId>,
    /// The shortened wide segment standing in for the original.
    wide: Option<WideReplacement>,
}

struct WideReplacement {
    shortened_id: PrimitiveId,
    /// Original geometry, re-created verbatim on unwind.
    original: Segment,
}

/// The independent width-transition post-pass.
///
/// Tapers are regenerated from scratch on every invocation. The pass keeps
/// a coordinate-keyed ledger of everything it created, and unwinds those
/// primitives (deleting sub-segments, restoring shortened wide segments)
/// before planning anew — running the pass twice therefore converges
/// instead of compounding tapers.
pub struct WidthTransitionPass {
    opts: TransitionOptions,
    ledger: HashMap<CoordKey, LedgerEntry>,
}

impl WidthTransitionPass {
    pub fn new(config: &BeautifyConfig) -> Self {
        Self {
            opts: config.clone().sanitized().transition_options(),
            ledger: HashMap::new(),
        }
    }

    /// Run one transition pass over the given segments.
    ///
    /// Host failures are per-primitive: logged, counted, and skipped.
    pub fn run(
        &mut self,
        sink: &mut dyn PrimitiveSink,
        segments: Vec<Segment>,
    ) -> TransitionReport {
        let mut report = TransitionReport::default();
        let mut working = segments;
        self.unwind(sink, &mut working, &mut report);

        let mut groups: Vec<(NetLayerKey, Vec<Segment>)> =
            group_by_net_layer(working).into_iter().collect();
        groups.sort_by(|a, b| (&a.0.net, a.0.layer).cmp(&(&b.0.net, b.0.layer)));

        for (key, group) in groups {
            let plans = plan_transitions(&group, &self.opts);
            debug!(
                "net {} layer {}: {} taper junction(s)",
                key.net,
                key.layer,
                plans.len()
            );
            for plan in plans {
                self.execute(sink, &group, plan, &mut report);
            }
        }

        info!("width transition pass finished: {report}");
        report
    }

    /// Delete previously generated tapers and restore the wide segments
    /// they shortened, updating the working set to match.
    fn unwind(
        &mut self,
        sink: &mut dyn PrimitiveSink,
        working: &mut Vec<Segment>,
        report: &mut TransitionReport,
    ) {
        for (key, entry) in std::mem::take(&mut self.ledger) {
            if !entry.created.is_empty() {
                if let Err(err) = sink.delete(&entry.created) {
                    error!("failed to delete taper sub-segments at {:?}: {err}", key);
                    report.host_failures += 1;
                }
                let drop: HashSet<PrimitiveId> = entry.created.iter().copied().collect();
                working.retain(|s| !drop.contains(&s.id));
            }
            if let Some(replacement) = entry.wide {
                if let Err(err) = sink.delete(&[replacement.shortened_id]) {
                    error!("failed to delete shortened wide segment: {err}");
                    report.host_failures += 1;
                }
                working.retain(|s| s.id != replacement.shortened_id);
                let original = &replacement.original;
                match sink.create_line(
                    &original.net,
                    original.layer,
                    original.start,
                    original.end,
                    original.width,
                ) {
                    Ok(new_id) => {
                        let mut restored = original.clone();
                        restored.id = new_id;
                        working.push(restored);
                    }
                    Err(err) => {
                        error!("failed to restore wide segment at {:?}: {err}", key);
                        report.host_failures += 1;
                    }
                }
            }
            report.transitions_unwound += 1;
        }
    }

    /// Materialize one planned taper and record it in the ledger.
    fn execute(
        &mut self,
        sink: &mut dyn PrimitiveSink,
        group: &[Segment],
        plan: TransitionPlan,
        report: &mut TransitionReport,
    ) {
        let wide = &group[plan.wide_index];
        let narrow = &group[plan.narrow_index];
        let mut entry = LedgerEntry {
            created: Vec::new(),
            wide: None,
        };

        if let Some((far, near)) = plan.shortened_wide {
            // Delete-and-recreate: the host has no resize, and the taper
            // pieces must not hide under full-width copper.
            if let Err(err) = sink.delete(&[wide.id]) {
                error!("failed to delete wide segment for shortening: {err}");
                report.host_failures += 1;
            }
            match sink.create_line(&wide.net, wide.layer, far, near, wide.width) {
                Ok(id) => {
                    entry.wide = Some(WideReplacement {
                        shortened_id: id,
                        original: wide.clone(),
                    });
                    report.wide_segments_shortened += 1;
                }
                Err(err) => {
                    error!("failed to create shortened wide segment: {err}");
                    report.host_failures += 1;
                }
            }
        }

        for sub in &plan.sub_segments {
            match sink.create_line(&narrow.net, narrow.layer, sub.start, sub.end, sub.width) {
                Ok(id) => {
                    entry.created.push(id);
                    report.sub_segments_created += 1;
                }
                Err(err) => {
                    error!("failed to create taper sub-segment: {err}");
                    report.host_failures += 1;
                }
            }
        }

        report.junctions += 1;
        self.ledger.insert(CoordKey::of(&plan.junction), entry);
    }
}
