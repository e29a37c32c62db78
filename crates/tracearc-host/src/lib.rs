//! # TraceArc Host
//!
//! The system boundary: traits the engine drives (primitive sink,
//! violation oracle, segment source, snapshot store), the host error type,
//! engine configuration, and the arc-width side table.
//!
//! Nothing in this crate computes geometry. Adapters implementing these
//! traits own all host-specific probing — the engine sees typed segments
//! and flat violation sets only.

pub mod error;
pub mod sink;
pub mod oracle;
pub mod source;
pub mod snapshot;
pub mod config;
pub mod widths;

pub use error::HostError;
pub use sink::PrimitiveSink;
pub use oracle::{ViolationOracle, ViolationSet};
pub use source::{Scope, SegmentSource};
pub use snapshot::{SnapshotDiff, SnapshotEvent, SnapshotHandle, SnapshotStore};
pub use config::BeautifyConfig;
pub use widths::ArcWidthTable;
