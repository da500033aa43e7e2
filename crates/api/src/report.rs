use config::RequesterIndexType;
use fairgate_logging::stats::{PrintableDuration, RequesterReport};
use std::time::Duration;

/// What happened to one requester during a run. Times are relative to the run start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequesterRecord {
    pub id: RequesterIndexType,
    /// Position in the grant sequence of the gate
    pub grant: Option<u64>,
    pub queued_at: Duration,
    pub granted_at: Duration,
    pub released_at: Duration,
    pub rooms_available_after_grant: usize,
    pub timed_out: bool,
}

impl RequesterRecord {
    pub(crate) fn timed_out(id: RequesterIndexType, queued_at: Duration, gave_up_at: Duration) -> Self {
        Self {
            id,
            grant: None,
            queued_at,
            granted_at: gave_up_at,
            released_at: gave_up_at,
            rooms_available_after_grant: 0,
            timed_out: true,
        }
    }

    pub fn wait_time(&self) -> Duration {
        self.granted_at.saturating_sub(self.queued_at)
    }

    pub fn hold_time(&self) -> Duration {
        self.released_at.saturating_sub(self.granted_at)
    }

    pub(crate) fn to_stats_report(&self) -> RequesterReport {
        RequesterReport {
            report_id: fairgate_logging::generate_stat_id!(),
            requester: self.id,
            grant: self.grant,
            queued_time: PrintableDuration(self.queued_at),
            granted_time: PrintableDuration(self.granted_at),
            released_time: PrintableDuration(self.released_at),
            rooms_available_after_grant: self.rooms_available_after_grant,
            timed_out: self.timed_out,
        }
    }
}

/// Outcome of a whole reservation run.
#[derive(Clone, Debug)]
pub struct ReservationReport {
    /// Requesters that obtained a room, in grant order
    pub grant_order: Vec<RequesterIndexType>,
    pub timed_out: Vec<RequesterIndexType>,
    pub max_concurrent_holders: usize,
    pub total_time: Duration,
    /// Sorted by requester id
    pub records: Vec<RequesterRecord>,
}

impl ReservationReport {
    pub(crate) fn from_records(
        mut records: Vec<RequesterRecord>,
        max_concurrent_holders: usize,
        total_time: Duration,
    ) -> Self {
        records.sort_by_key(|record| record.id);

        let mut granted: Vec<_> = records
            .iter()
            .filter_map(|record| record.grant.map(|grant| (grant, record.id)))
            .collect();
        granted.sort();

        Self {
            grant_order: granted.into_iter().map(|(_, id)| id).collect(),
            timed_out: records
                .iter()
                .filter(|record| record.timed_out)
                .map(|record| record.id)
                .collect(),
            max_concurrent_holders,
            total_time,
            records,
        }
    }

    pub fn longest_wait(&self) -> Duration {
        self.records
            .iter()
            .filter(|record| !record.timed_out)
            .map(|record| record.wait_time())
            .max()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{RequesterRecord, ReservationReport};
    use std::time::Duration;

    fn granted(id: u32, grant: u64, queued_ms: u64, granted_ms: u64) -> RequesterRecord {
        RequesterRecord {
            id,
            grant: Some(grant),
            queued_at: Duration::from_millis(queued_ms),
            granted_at: Duration::from_millis(granted_ms),
            released_at: Duration::from_millis(granted_ms + 5),
            rooms_available_after_grant: 0,
            timed_out: false,
        }
    }

    #[test]
    fn test_report_orders_by_grant() {
        let records = vec![
            granted(3, 0, 0, 1),
            granted(1, 2, 0, 40),
            RequesterRecord::timed_out(4, Duration::ZERO, Duration::from_millis(100)),
            granted(2, 1, 0, 20),
        ];

        let report = ReservationReport::from_records(records, 1, Duration::from_millis(120));
        assert_eq!(report.grant_order, vec![3, 2, 1]);
        assert_eq!(report.timed_out, vec![4]);
        assert_eq!(
            report.records.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(report.longest_wait(), Duration::from_millis(40));
        assert_eq!(report.records[0].hold_time(), Duration::from_millis(5));
    }
}
