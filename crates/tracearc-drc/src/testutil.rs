//! Scriptable in-memory host for engine and feedback tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};

use uuid::Uuid;

use tracearc_core::{LayerId, Point, PrimitiveId, Segment};
use tracearc_host::{
    HostError, PrimitiveSink, SnapshotDiff, SnapshotEvent, SnapshotHandle, SnapshotStore,
    ViolationOracle, ViolationSet,
};

#[derive(Debug, Clone)]
pub struct LineRec {
    pub net: String,
    pub layer: LayerId,
    pub start: Point,
    pub end: Point,
    pub width: f64,
}

#[derive(Debug, Clone)]
pub struct ArcRec {
    pub net: String,
    pub layer: LayerId,
    pub start: Point,
    pub end: Point,
    pub sweep_deg: f64,
    pub width: f64,
}

/// Live primitive store shared between the mock sink and the scripted
/// oracle, so oracle scripts can flag primitives that only exist at check
/// time.
#[derive(Debug, Default)]
pub struct SinkState {
    pub lines: HashMap<PrimitiveId, LineRec>,
    pub arcs: HashMap<PrimitiveId, ArcRec>,
    pub deleted: Vec<PrimitiveId>,
    pub created: usize,
    /// Upcoming line creations to reject, for failure-injection tests.
    pub line_failures: usize,
}

#[derive(Debug, Default)]
pub struct MockSink {
    pub state: Rc<RefCell<SinkState>>,
}

impl MockSink {
    pub fn failing_lines(count: usize) -> Self {
        let sink = Self::default();
        sink.state.borrow_mut().line_failures = count;
        sink
    }

    pub fn created_count(&self) -> usize {
        self.state.borrow().created
    }

    pub fn deleted_ids(&self) -> Vec<PrimitiveId> {
        self.state.borrow().deleted.clone()
    }

    pub fn line_count(&self) -> usize {
        self.state.borrow().lines.len()
    }

    pub fn arc_count(&self) -> usize {
        self.state.borrow().arcs.len()
    }

    pub fn arc_ids(&self) -> Vec<PrimitiveId> {
        self.state.borrow().arcs.keys().copied().collect()
    }

    pub fn arc_records(&self) -> Vec<ArcRec> {
        self.state.borrow().arcs.values().cloned().collect()
    }

    /// The currently live lines as segments, the way a segment source
    /// would hand them back on a fresh invocation.
    pub fn live_segments(&self) -> Vec<Segment> {
        let state = self.state.borrow();
        let mut ids: Vec<&PrimitiveId> = state.lines.keys().collect();
        ids.sort();
        ids.iter()
            .map(|id| {
                let rec = &state.lines[*id];
                Segment::new(**id, rec.start, rec.end, rec.width, &rec.net, rec.layer)
            })
            .collect()
    }
}

impl PrimitiveSink for MockSink {
    fn create_line(
        &mut self,
        net: &str,
        layer: LayerId,
        start: Point,
        end: Point,
        width: f64,
    ) -> Result<PrimitiveId, HostError> {
        let mut state = self.state.borrow_mut();
        if state.line_failures > 0 {
            state.line_failures -= 1;
            return Err(HostError::CreateLineRejected {
                reason: "scripted failure".to_string(),
            });
        }
        let id = Uuid::new_v4();
        state.lines.insert(
            id,
            LineRec {
                net: net.to_string(),
                layer,
                start,
                end,
                width,
            },
        );
        state.created += 1;
        Ok(id)
    }

    fn create_arc(
        &mut self,
        net: &str,
        layer: LayerId,
        start: Point,
        end: Point,
        sweep_deg: f64,
        width: f64,
    ) -> Result<PrimitiveId, HostError> {
        let mut state = self.state.borrow_mut();
        let id = Uuid::new_v4();
        state.arcs.insert(
            id,
            ArcRec {
                net: net.to_string(),
                layer,
                start,
                end,
                sweep_deg,
                width,
            },
        );
        state.created += 1;
        Ok(id)
    }

    fn delete(&mut self, ids: &[PrimitiveId]) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        for id in ids {
            state.lines.remove(id);
            state.arcs.remove(id);
            state.deleted.push(*id);
        }
        Ok(())
    }
}

/// A violation oracle driven by an explicit script, with convenience flags
/// that resolve against the live sink state at check time.
#[derive(Default)]
pub struct ScriptedOracle {
    /// Explicit responses consumed first, one per check.
    pub script: VecDeque<Result<ViolationSet, HostError>>,
    /// Flag every live arc, on the first check only.
    pub flag_arcs_on_first_check: bool,
    /// Flag a single live arc, on the first check only.
    pub flag_one_arc_on_first_check: bool,
    /// Flag the line leading into an arc, on the first check only.
    pub flag_line_into_arc_on_first_check: bool,
    /// Flag every live arc, on every check.
    pub flag_arcs_always: bool,
    /// Flag every live primitive, on every check.
    pub flag_everything_always: bool,
    /// Shared sink state the flags resolve against.
    pub sink_state: Option<Rc<RefCell<SinkState>>>,
    pub checks: usize,
    /// Arc start points observed at each check, for shrink assertions.
    pub seen_arc_starts: Vec<Vec<Point>>,
}

impl ScriptedOracle {
    pub fn attach_sink(&mut self, sink: &MockSink) {
        self.sink_state = Some(sink.state.clone());
    }
}

impl ViolationOracle for ScriptedOracle {
    fn check(&mut self) -> Result<ViolationSet, HostError> {
        self.checks += 1;
        if let Some(state) = &self.sink_state {
            let state = state.borrow();
            self.seen_arc_starts
                .push(state.arcs.values().map(|a| a.start).collect());
        }
        if let Some(response) = self.script.pop_front() {
            return response;
        }
        let first = self.checks == 1;
        if let Some(state) = &self.sink_state {
            let state = state.borrow();
            if self.flag_everything_always {
                return Ok(state
                    .lines
                    .keys()
                    .chain(state.arcs.keys())
                    .copied()
                    .collect());
            }
            if self.flag_arcs_always && !state.arcs.is_empty() {
                return Ok(state.arcs.keys().copied().collect());
            }
            if first && self.flag_arcs_on_first_check {
                return Ok(state.arcs.keys().copied().collect());
            }
            if first && self.flag_one_arc_on_first_check {
                if let Some(id) = state.arcs.keys().min() {
                    return Ok(ViolationSet::from([*id]));
                }
            }
            if first && self.flag_line_into_arc_on_first_check {
                let arc_starts: Vec<Point> = state.arcs.values().map(|a| a.start).collect();
                let hit = state.lines.iter().find(|(_, line)| {
                    arc_starts
                        .iter()
                        .any(|p| line.end.distance_to(p) < 1e-6)
                });
                if let Some((id, _)) = hit {
                    return Ok(ViolationSet::from([*id]));
                }
            }
        }
        Ok(ViolationSet::new())
    }
}

/// Snapshot store counting captures and feeding subscribers.
#[derive(Default)]
pub struct MockSnapshots {
    pub captures: usize,
    senders: Vec<Sender<SnapshotEvent>>,
}

impl SnapshotStore for MockSnapshots {
    fn capture(&mut self) -> Result<SnapshotHandle, HostError> {
        self.captures += 1;
        for tx in &self.senders {
            let _ = tx.send(SnapshotEvent::Captured);
        }
        Ok(SnapshotHandle(Uuid::new_v4()))
    }

    fn restore(&mut self, _handle: &SnapshotHandle) -> Result<SnapshotDiff, HostError> {
        for tx in &self.senders {
            let _ = tx.send(SnapshotEvent::Restored);
        }
        Ok(SnapshotDiff::default())
    }

    fn subscribe(&mut self) -> Receiver<SnapshotEvent> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }
}
