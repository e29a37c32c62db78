use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tracearc_core::PrimitiveId;

/// Side table recording the true width of arcs created during a pass.
///
/// The host's width accessor for arc primitives is unreliable immediately
/// after creation, so whoever needs an emitted arc's width later (the
/// snapshot layer, re-emission bookkeeping) consults this table first and
/// only falls back to the host. The table is scoped to one invocation and
/// passed explicitly by the caller; it is never ambient state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArcWidthTable {
    widths: HashMap<PrimitiveId, f64>,
}

impl ArcWidthTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: PrimitiveId, width: f64) {
        self.widths.insert(id, width);
    }

    pub fn get(&self, id: &PrimitiveId) -> Option<f64> {
        self.widths.get(id).copied()
    }

    /// The recorded width, or the host-reported one when the arc was not
    /// created by this invocation.
    pub fn width_or(&self, id: &PrimitiveId, host_reported: f64) -> f64 {
        self.get(id).unwrap_or(host_reported)
    }

    pub fn forget(&mut self, id: &PrimitiveId) {
        self.widths.remove(id);
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}
