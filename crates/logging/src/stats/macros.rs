use super::StatId;

/// Updates the global [`STATS`](crate::stats::STATS) under its lock.
#[macro_export]
macro_rules! stats {
    (stats.$group:ident.$name:ident = $($items:tt)*) => {
        {
            let value = $($items)*;
            let mut stats = $crate::stats::STATS.lock();
            stats.$group.$name = value;
        }
    };
    (stats.$group:ident.$name:ident.$($items:tt)*) => {
        {
            let mut stats = $crate::stats::STATS.lock();
            stats.$group.$name.$($items)*;
        }
    };
}

pub fn generate_stat_id() -> StatId {
    use std::sync::atomic::{AtomicU64, Ordering};
    static REPORT_ID: AtomicU64 = AtomicU64::new(1);
    StatId(REPORT_ID.fetch_add(1, Ordering::SeqCst))
}

#[macro_export]
macro_rules! generate_stat_id {
    () => {
        $crate::stats::macros::generate_stat_id()
    };
}
