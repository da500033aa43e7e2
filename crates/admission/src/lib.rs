//! First-come-first-served admission to a fixed pool of interchangeable units.

pub mod error;
pub mod gate;
pub mod ledger;
pub mod permit;

use std::fmt::Debug;
use std::hash::Hash;

pub use error::GateError;
pub use gate::{Gate, GateSnapshot, Grant, WakePolicy};
pub use ledger::ArrivalLedger;
pub use permit::Permit;

/// Opaque identity of a requester, chosen by the caller.
pub trait RequesterId: Copy + Eq + Hash + Debug + Send {}
impl<T: Copy + Eq + Hash + Debug + Send> RequesterId for T {}
