mod hold_time;
mod report;

use admission::{Gate, GateError};
use anyhow::Context;
use config::{RequesterIndexType, FIRST_REQUESTER_ID, MAX_REQUESTERS, PRINT_STATUS};
use fairgate_logging::stats::{reset_stats, write_stats, STATS};
use fairgate_logging::{info, stats, warn, UnrecoverableErrorLogging};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

pub use admission::WakePolicy;
pub use fairgate_logging::MessageLevel;
pub use hold_time::HoldTimeSampler;
pub use report::{RequesterRecord, ReservationReport};

/// Main config of a reservation run
pub struct FairgateConfig {
    /// Number of interchangeable rooms
    pub rooms: usize,

    /// Number of concurrent requesters, with ids starting from 1
    pub requesters: RequesterIndexType,

    /// Each requester keeps its room for a random time between these bounds
    pub min_hold: Duration,
    pub max_hold: Duration,

    /// Which waiters are woken when a room becomes free
    pub wake_policy: WakePolicy,

    /// Requesters give up after waiting this long. Wait forever if none
    pub acquire_timeout: Option<Duration>,

    /// Seed for the hold times, random if none
    pub seed: Option<u64>,

    /// The path to an optional json-formatted stats file
    pub stats_file: Option<PathBuf>,

    /// The messages callback, if present, no output will be automatically written to stdout
    pub messages_callback: Option<fn(MessageLevel, &str)>,
}

impl Default for FairgateConfig {
    fn default() -> Self {
        Self {
            rooms: config::DEFAULT_ROOMS,
            requesters: config::DEFAULT_REQUESTERS,
            min_hold: config::DEFAULT_MIN_HOLD,
            max_hold: config::DEFAULT_MAX_HOLD,
            wake_policy: WakePolicy::Broadcast,
            acquire_timeout: None,
            seed: None,
            stats_file: None,
            messages_callback: None,
        }
    }
}

macro_rules! status {
    ($($arg:tt)*) => {
        if PRINT_STATUS.load(Ordering::Relaxed) {
            info!($($arg)*);
        }
    };
}

#[derive(Default)]
struct HoldersTracker {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl HoldersTracker {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A set of rooms shared by a fixed group of requesters.
pub struct FairgateInstance {
    config: FairgateConfig,
    gate: Gate<RequesterIndexType>,
}

impl FairgateInstance {
    pub fn create(config: FairgateConfig) -> anyhow::Result<Self> {
        if config.requesters == 0 {
            anyhow::bail!("At least one requester is needed");
        }
        if config.requesters > MAX_REQUESTERS {
            anyhow::bail!(
                "Too many requesters: {} (maximum {})",
                config.requesters,
                MAX_REQUESTERS
            );
        }
        if config.min_hold > config.max_hold {
            anyhow::bail!(
                "Minimum hold time {:?} is greater than the maximum {:?}",
                config.min_hold,
                config.max_hold
            );
        }

        if let Some(callback) = config.messages_callback {
            fairgate_logging::setup_logging_callback(callback);
        }

        let gate = Gate::with_policy(config.rooms, config.wake_policy)
            .with_context(|| format!("Cannot create a gate with {} rooms", config.rooms))?;

        Ok(Self { config, gate })
    }

    pub fn config(&self) -> &FairgateConfig {
        &self.config
    }

    pub fn gate(&self) -> &Gate<RequesterIndexType> {
        &self.gate
    }

    /// Starts every requester at once, each one reserving a room, holding it
    /// and releasing it. Returns when all of them are done.
    pub fn run_reservations(&self) -> anyhow::Result<ReservationReport> {
        reset_stats();
        stats!(stats.reservations.rooms = self.config.rooms);
        stats!(stats.reservations.requesters = self.config.requesters as usize);
        stats!(stats.reservations.wake_policy = format!("{:?}", self.config.wake_policy));

        let mut sampler =
            HoldTimeSampler::new(self.config.min_hold, self.config.max_hold, self.config.seed);
        let hold_times = sampler.sample_many(self.config.requesters as usize);

        let tracker = HoldersTracker::default();
        let start_time = Instant::now();

        let records = thread::scope(|scope| -> anyhow::Result<Vec<RequesterRecord>> {
            let tracker = &tracker;
            let mut handles = Vec::with_capacity(hold_times.len());

            for (id, hold_time) in (FIRST_REQUESTER_ID..).zip(hold_times) {
                let handle = thread::Builder::new()
                    .name(format!("requester-{}", id))
                    .spawn_scoped(scope, move || {
                        self.reserve_room(id, hold_time, start_time, tracker)
                    })
                    .with_context(|| format!("Cannot spawn requester {}", id))?;
                handles.push(handle);
            }

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(record) => record,
                    Err(_) => Err(anyhow::anyhow!("A requester thread panicked")),
                })
                .collect()
        })?;

        let report = ReservationReport::from_records(
            records,
            tracker.max.load(Ordering::SeqCst),
            start_time.elapsed(),
        );

        {
            let mut stats = STATS.lock();
            stats.reservations.max_concurrent_holders = report.max_concurrent_holders;
            stats.reservations.total_time = report.total_time.into();
            stats.reservations.requester_reports = report
                .records
                .iter()
                .map(|record| record.to_stats_report())
                .collect();
        }

        if let Some(stats_file) = &self.config.stats_file {
            write_stats(stats_file).log_unrecoverable_error_with_data(
                "Cannot write the stats file",
                stats_file.display(),
            )?;
        }

        Ok(report)
    }

    fn reserve_room(
        &self,
        id: RequesterIndexType,
        hold_time: Duration,
        start_time: Instant,
        tracker: &HoldersTracker,
    ) -> anyhow::Result<RequesterRecord> {
        status!("Requester {} is waiting to reserve a room.", id);
        let queued_at = start_time.elapsed();

        let grant = match self.config.acquire_timeout {
            None => self.gate.acquire(id),
            Some(timeout) => self.gate.acquire_timeout(id, timeout),
        };
        let grant = match grant {
            Ok(grant) => grant,
            Err(GateError::TimedOut(_)) => {
                warn!(
                    "Requester {} gave up after waiting {:?} for a room.",
                    id,
                    start_time.elapsed().saturating_sub(queued_at)
                );
                return Ok(RequesterRecord::timed_out(
                    id,
                    queued_at,
                    start_time.elapsed(),
                ));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Requester {} cannot reserve", id))
            }
        };

        let granted_at = start_time.elapsed();
        tracker.enter();
        status!(
            "Requester {} reserved a room. Rooms available: {}",
            id,
            grant.available
        );

        thread::sleep(hold_time);

        tracker.leave();
        let rooms_available = self
            .gate
            .release(id)
            .with_context(|| format!("Requester {} cannot release its room", id))?;
        let released_at = start_time.elapsed();
        status!(
            "Requester {} released a room after {:.3?}. Rooms available: {}",
            id,
            released_at.saturating_sub(granted_at),
            rooms_available
        );

        Ok(RequesterRecord {
            id,
            grant: Some(grant.seq),
            queued_at,
            granted_at,
            released_at,
            rooms_available_after_grant: grant.available,
            timed_out: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config(rooms: usize, requesters: RequesterIndexType) -> FairgateConfig {
        PRINT_STATUS.store(false, Ordering::Relaxed);
        FairgateConfig {
            rooms,
            requesters,
            min_hold: Duration::ZERO,
            max_hold: Duration::from_millis(2),
            seed: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_configs() {
        assert!(FairgateInstance::create(quiet_config(0, 4)).is_err());
        assert!(FairgateInstance::create(quiet_config(2, 0)).is_err());
        assert!(FairgateInstance::create(quiet_config(2, MAX_REQUESTERS + 1)).is_err());

        let mut config = quiet_config(2, 4);
        config.min_hold = Duration::from_secs(2);
        config.max_hold = Duration::from_secs(1);
        assert!(FairgateInstance::create(config).is_err());
    }

    #[test]
    fn test_every_requester_gets_a_room() {
        for wake_policy in [WakePolicy::Broadcast, WakePolicy::HeadOnly] {
            let instance = FairgateInstance::create(FairgateConfig {
                wake_policy,
                ..quiet_config(3, 10)
            })
            .unwrap();

            let report = instance.run_reservations().unwrap();

            let mut granted = report.grant_order.clone();
            granted.sort();
            assert_eq!(granted, (1..=10).collect::<Vec<_>>());
            assert!(report.timed_out.is_empty());
            assert!(report.max_concurrent_holders >= 1 && report.max_concurrent_holders <= 3);
            assert_eq!(instance.gate().available(), 3);
        }
    }

    #[test]
    fn test_requesters_give_up() {
        let instance = FairgateInstance::create(FairgateConfig {
            min_hold: Duration::from_millis(300),
            max_hold: Duration::from_millis(300),
            acquire_timeout: Some(Duration::from_millis(30)),
            ..quiet_config(1, 3)
        })
        .unwrap();

        let report = instance.run_reservations().unwrap();

        assert_eq!(report.grant_order.len(), 1);
        assert_eq!(report.timed_out.len(), 2);
        assert_eq!(report.max_concurrent_holders, 1);
        assert_eq!(instance.gate().queued_len(), 0);

        let holder = report.records.iter().find(|record| !record.timed_out).unwrap();
        assert_eq!(holder.rooms_available_after_grant, 0);
    }

    #[test]
    fn test_rooms_left_after_lone_grant() {
        let instance = FairgateInstance::create(quiet_config(3, 1)).unwrap();

        let report = instance.run_reservations().unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].grant, Some(0));
        assert_eq!(report.records[0].rooms_available_after_grant, 2);
    }
}
