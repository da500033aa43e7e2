pub mod macros;

use std::{
    fs::File,
    io::BufWriter,
    ops::AddAssign,
    path::Path,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatId(u64);

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrintableDuration(pub Duration);

impl From<Duration> for PrintableDuration {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl AddAssign<Duration> for PrintableDuration {
    fn add_assign(&mut self, other: Duration) {
        self.0.add_assign(other);
    }
}

impl std::fmt::Debug for PrintableDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:03}s", self.0.as_secs(), self.0.subsec_millis())
    }
}

impl Serialize for PrintableDuration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.as_secs_f64())
    }
}

/// Lifecycle of one requester: queued, granted, released.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RequesterReport {
    pub report_id: StatId,
    pub requester: u32,
    /// Position in the grant sequence, none if the requester gave up
    pub grant: Option<u64>,
    pub queued_time: PrintableDuration,
    pub granted_time: PrintableDuration,
    pub released_time: PrintableDuration,
    pub rooms_available_after_grant: usize,
    pub timed_out: bool,
}

impl RequesterReport {
    pub fn wait_duration(&self) -> Duration {
        self.granted_time.0.saturating_sub(self.queued_time.0)
    }

    pub fn hold_duration(&self) -> Duration {
        self.released_time.0.saturating_sub(self.granted_time.0)
    }
}

#[derive(Default, Serialize)]
pub struct ReservationStats {
    pub rooms: usize,
    pub requesters: usize,
    pub wake_policy: String,
    pub max_concurrent_holders: usize,
    pub total_time: PrintableDuration,
    pub requester_reports: Vec<RequesterReport>,
}

impl ReservationStats {
    pub const fn empty() -> Self {
        Self {
            rooms: 0,
            requesters: 0,
            wake_policy: String::new(),
            max_concurrent_holders: 0,
            total_time: PrintableDuration(Duration::from_secs(0)),
            requester_reports: Vec::new(),
        }
    }
}

#[derive(Serialize)]
pub struct StatsManager {
    #[serde(skip)]
    pub start_time: Option<Instant>,
    pub reservations: ReservationStats,
}

impl StatsManager {
    pub const fn empty() -> Self {
        Self {
            start_time: None,
            reservations: ReservationStats::empty(),
        }
    }

    /// Time elapsed since the last [`reset_stats`]
    pub fn elapsed(&self) -> PrintableDuration {
        self.start_time
            .map(|start| start.elapsed())
            .unwrap_or_default()
            .into()
    }
}

pub static STATS: Mutex<StatsManager> = Mutex::new(StatsManager::empty());

pub fn reset_stats() {
    let mut stats = STATS.lock();
    *stats = StatsManager::empty();
    stats.start_time = Some(Instant::now());
}

pub fn write_stats(output_file: &Path) -> std::io::Result<()> {
    let output_file = output_file.with_extension("json");
    let file = BufWriter::new(File::create(output_file)?);
    let stats = STATS.lock();
    serde_json::to_writer_pretty(file, &*stats)?;
    Ok(())
}
