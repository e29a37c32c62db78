use thiserror::Error;

/// Failures surfaced by the host boundary.
///
/// Every failure is per-call: a rejected create or delete never rolls back
/// earlier calls in the same pass, and the engine recovers locally and
/// continues with the remaining work.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("host rejected line creation: {reason}")]
    CreateLineRejected { reason: String },

    #[error("host rejected arc creation: {reason}")]
    CreateArcRejected { reason: String },

    #[error("host rejected deletion of {count} primitive(s): {reason}")]
    DeleteRejected { count: usize, reason: String },

    #[error("design check unavailable: {reason}")]
    CheckUnavailable { reason: String },

    #[error("segment source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("snapshot store unavailable: {reason}")]
    SnapshotUnavailable { reason: String },
}
