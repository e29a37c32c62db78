use tracearc_core::{LayerId, Point, PrimitiveId};

use crate::error::HostError;

/// Creates and deletes board primitives on behalf of the engine.
///
/// The host applies each call independently; there is no batch atomicity.
/// Implementations bridging to an asynchronous host must complete each call
/// before returning, so the engine's delete-old → create-new ordering and
/// the emit → check → react cycle stay meaningful against the materialized
/// primitive set. Long passes may pump the host event loop inside these
/// calls; the engine does not care.
pub trait PrimitiveSink {
    fn create_line(
        &mut self,
        net: &str,
        layer: LayerId,
        start: Point,
        end: Point,
        width: f64,
    ) -> Result<PrimitiveId, HostError>;

    /// `sweep_deg` is signed; positive sweeps counter-clockwise from
    /// `start` to `end`.
    fn create_arc(
        &mut self,
        net: &str,
        layer: LayerId,
        start: Point,
        end: Point,
        sweep_deg: f64,
        width: f64,
    ) -> Result<PrimitiveId, HostError>;

    fn delete(&mut self, ids: &[PrimitiveId]) -> Result<(), HostError>;
}
