use thiserror::Error;

/// Misuse conditions detected by the gate.
///
/// Requester ids are stored in their `Debug` form, so the error does not
/// depend on the id type of the gate that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// A gate must provide at least one unit.
    #[error("gate capacity must be at least 1")]
    ZeroCapacity,
    /// The requester is already waiting in the ledger or already holds a unit.
    #[error("requester {0} is already queued or holding a unit")]
    DuplicateRequester(String),
    /// Release called by a requester that does not hold a unit.
    #[error("requester {0} released a unit it does not hold")]
    NotHolding(String),
    /// Release would push the available units above the gate capacity.
    #[error("release would exceed the gate capacity of {capacity}")]
    CapacityOverflow { capacity: usize },
    /// A bounded acquire expired before the requester reached the head with a free unit.
    #[error("requester {0} timed out while waiting for a unit")]
    TimedOut(String),
}

impl GateError {
    pub(crate) fn duplicate<R: std::fmt::Debug>(id: &R) -> Self {
        Self::DuplicateRequester(format!("{:?}", id))
    }

    pub(crate) fn not_holding<R: std::fmt::Debug>(id: &R) -> Self {
        Self::NotHolding(format!("{:?}", id))
    }

    pub(crate) fn timed_out<R: std::fmt::Debug>(id: &R) -> Self {
        Self::TimedOut(format!("{:?}", id))
    }
}
