use std::collections::HashSet;

use tracearc_core::PrimitiveId;

use crate::error::HostError;

/// The primitives implicated by one design check pass.
pub type ViolationSet = HashSet<PrimitiveId>;

/// Runs the host's design rule check.
///
/// The engine consumes identity membership only. Violation reasons, rule
/// categories, and whatever report tree the checker produces stay behind
/// the adapter, which must flatten them to this set.
pub trait ViolationOracle {
    fn check(&mut self) -> Result<ViolationSet, HostError>;
}
