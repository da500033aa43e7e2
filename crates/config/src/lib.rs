use std::sync::atomic::AtomicBool;
use std::time::Duration;

pub type RequesterIndexType = u32;

/// Rooms shared by the requesters
pub const DEFAULT_ROOMS: usize = 3;
pub const DEFAULT_REQUESTERS: RequesterIndexType = 10;

/// Each requester holds its room for a random time in this range
pub const DEFAULT_MIN_HOLD: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_HOLD: Duration = Duration::from_secs(5);

/// One thread is spawned per requester
pub const MAX_REQUESTERS: RequesterIndexType = 4096;

/// First requester id, ids are assigned sequentially from here
pub const FIRST_REQUESTER_ID: RequesterIndexType = 1;

/// Print a line for every waiting/reserved/released event
pub static PRINT_STATUS: AtomicBool = AtomicBool::new(true);
