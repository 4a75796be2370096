//! Error handling for this crate.
use thiserror::Error;

use crate::slot::{ResourceId, TimeSlot};

/// Result alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Fatal errors observable from the core, raised at construction or when
/// routing a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// A zero or overflowing axis size, a permutation that is not a
    /// bijection on `{0..5}`, or any other malformed [`Parameter`](crate::Parameter)
    /// / [`AddressLayout`](crate::AddressLayout).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The PPN exceeds the product of the configured axis sizes and cannot
    /// be routed to a channel/die pair.
    #[error("ppn {ppn} is out of range for an address space of {capacity} pages")]
    InvalidPpn { ppn: u64, capacity: u64 },
}

/// A post-commit invariant violation on a resource's [`BusyTimeline`](crate::BusyTimeline):
/// the timeline is no longer strictly ascending and pairwise disjoint.
///
/// This is diagnostic, not fatal: callers may log it and continue, or treat
/// it as fatal in debug builds, per spec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("busy timeline for {resource:?} is corrupt: {prev:?} does not strictly precede {next:?}")]
pub struct VerificationFailure {
    pub resource: ResourceId,
    pub prev: TimeSlot,
    pub next: TimeSlot,
}
