use std::sync::mpsc::Receiver;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracearc_core::PrimitiveId;

use crate::error::HostError;

/// Opaque handle to one captured primitive-set snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotHandle(pub Uuid);

/// Primitives created and deleted by restoring a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub created: Vec<PrimitiveId>,
    pub deleted: Vec<PrimitiveId>,
}

/// Emitted whenever the snapshot list changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotEvent {
    Captured,
    Restored,
    Discarded,
}

/// Undo-granularity persistence of the full line+arc primitive set.
///
/// The engine only captures before and after a mutating pass; restoring is
/// the caller's business. Interested parties subscribe for change events
/// explicitly — there is no ambient notification hook to discover.
pub trait SnapshotStore {
    fn capture(&mut self) -> Result<SnapshotHandle, HostError>;

    fn restore(&mut self, handle: &SnapshotHandle) -> Result<SnapshotDiff, HostError>;

    fn subscribe(&mut self) -> Receiver<SnapshotEvent>;
}
