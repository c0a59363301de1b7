use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use log::warn;

use super::types::{ConclusionStatus, WorkflowRun};
use crate::error::{Result, RunLensError};

/// Running totals for one conclusion status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusStats {
    /// Every run with this status, clock-skewed ones included
    pub count: usize,
    /// Runs whose duration went into `total_duration`
    pub timed_count: usize,
    pub total_duration: TimeDelta,
}

impl Default for StatusStats {
    fn default() -> Self {
        Self {
            count: 0,
            timed_count: 0,
            total_duration: TimeDelta::zero(),
        }
    }
}

impl StatusStats {
    fn record(&mut self, duration: Option<TimeDelta>) {
        self.count += 1;
        if let Some(duration) = duration {
            self.timed_count += 1;
            self.total_duration += duration;
        }
    }

    /// Mean duration over the timed runs, `None` when every run was skewed.
    pub fn mean_duration(&self) -> Option<TimeDelta> {
        if self.timed_count == 0 {
            return None;
        }

        #[allow(clippy::cast_possible_wrap)]
        let mean_ms = self.total_duration.num_milliseconds() / self.timed_count as i64;
        Some(TimeDelta::milliseconds(mean_ms))
    }
}

/// A run whose last update is earlier than its start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSkew {
    pub run_id: u64,
    pub status: ConclusionStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClockSkew {
    pub fn skew(&self) -> TimeDelta {
        self.started_at - self.updated_at
    }
}

/// Summary statistics over every run collected for a workflow.
#[derive(Debug, Clone)]
pub struct RunAggregate {
    pub total_count: usize,
    /// Keyed in order of first appearance
    pub per_status: IndexMap<ConclusionStatus, StatusStats>,
    /// Sum of all non-skewed run durations
    pub total_duration: TimeDelta,
    /// Earliest `created_at` among the runs
    pub first_created_at: DateTime<Utc>,
    /// Latest `created_at` among the runs
    pub last_created_at: DateTime<Utc>,
    pub clock_skews: Vec<ClockSkew>,
}

impl RunAggregate {
    /// Wall-clock span between the earliest and latest run creation.
    pub fn created_span(&self) -> TimeDelta {
        self.last_created_at - self.first_created_at
    }
}

/// Aggregates runs into per-status counts and durations.
///
/// Creation bounds are chronological min/max, so the result does not depend
/// on the order pages were fetched in. Runs with a negative duration are
/// counted but left out of every duration total.
///
/// # Errors
///
/// Returns [`RunLensError::NoRuns`] when `runs` is empty.
pub fn aggregate(runs: &[WorkflowRun]) -> Result<RunAggregate> {
    let Some(first) = runs.first() else {
        return Err(RunLensError::NoRuns);
    };

    let mut per_status: IndexMap<ConclusionStatus, StatusStats> = IndexMap::new();
    let mut total_duration = TimeDelta::zero();
    let mut first_created_at = first.created_at;
    let mut last_created_at = first.created_at;
    let mut clock_skews = Vec::new();

    for run in runs {
        let duration = run.duration();

        let timed = if duration < TimeDelta::zero() {
            let skew = ClockSkew {
                run_id: run.id,
                status: run.conclusion.clone(),
                started_at: run.started_at(),
                updated_at: run.updated_at,
            };
            warn!(
                "Run {} updated {}ms before it started, excluding it from durations",
                skew.run_id,
                skew.skew().num_milliseconds()
            );
            clock_skews.push(skew);
            None
        } else {
            total_duration += duration;
            Some(duration)
        };

        per_status
            .entry(run.conclusion.clone())
            .or_default()
            .record(timed);

        first_created_at = first_created_at.min(run.created_at);
        last_created_at = last_created_at.max(run.created_at);
    }

    Ok(RunAggregate {
        total_count: runs.len(),
        per_status,
        total_duration,
        first_created_at,
        last_created_at,
        clock_skews,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn run(id: u64, status: ConclusionStatus, created_offset: i64, secs: i64) -> WorkflowRun {
        let created_at = t0() + TimeDelta::seconds(created_offset);
        WorkflowRun {
            id,
            name: Some("CI".to_string()),
            path: Some(".github/workflows/ci.yml".to_string()),
            conclusion: status,
            run_started_at: Some(created_at),
            created_at,
            updated_at: created_at + TimeDelta::seconds(secs),
        }
    }

    #[test]
    fn empty_input_is_no_runs() {
        let result = aggregate(&[]);
        assert!(matches!(result, Err(RunLensError::NoRuns)));
    }

    #[test]
    fn single_success_run() {
        let agg = aggregate(&[run(1, ConclusionStatus::Success, 0, 5)]).unwrap();

        assert_eq!(agg.total_count, 1);
        assert_eq!(agg.total_duration, TimeDelta::seconds(5));

        let stats = &agg.per_status[&ConclusionStatus::Success];
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean_duration(), Some(TimeDelta::seconds(5)));
        assert_eq!(agg.first_created_at, t0());
        assert_eq!(agg.last_created_at, t0());
    }

    #[test]
    fn two_failures_average() {
        let agg = aggregate(&[
            run(1, ConclusionStatus::Failure, 0, 4),
            run(2, ConclusionStatus::Failure, 10, 6),
        ])
        .unwrap();

        let stats = &agg.per_status[&ConclusionStatus::Failure];
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_duration(), Some(TimeDelta::seconds(5)));
        assert_eq!(agg.total_duration, TimeDelta::seconds(10));
    }

    #[test]
    fn counts_and_durations_add_up_across_statuses() {
        let runs = vec![
            run(1, ConclusionStatus::Success, 0, 60),
            run(2, ConclusionStatus::Failure, 5, 30),
            run(3, ConclusionStatus::Success, 9, 90),
            run(4, ConclusionStatus::Cancelled, 2, 10),
            run(5, ConclusionStatus::Other("timed_out".into()), 7, 3600),
            run(6, ConclusionStatus::InProgress, 11, 15),
        ];

        let agg = aggregate(&runs).unwrap();

        let count_sum: usize = agg.per_status.values().map(|s| s.count).sum();
        assert_eq!(count_sum, agg.total_count);
        assert_eq!(agg.total_count, 6);

        let duration_sum = agg
            .per_status
            .values()
            .fold(TimeDelta::zero(), |acc, s| acc + s.total_duration);
        assert_eq!(duration_sum, agg.total_duration);
        assert_eq!(agg.total_duration, TimeDelta::seconds(60 + 30 + 90 + 10 + 3600 + 15));

        assert_eq!(agg.per_status.len(), 5);
        assert_eq!(
            agg.per_status[&ConclusionStatus::Success].mean_duration(),
            Some(TimeDelta::seconds(75))
        );
    }

    #[test]
    fn statuses_keep_first_seen_order() {
        let agg = aggregate(&[
            run(1, ConclusionStatus::Failure, 0, 1),
            run(2, ConclusionStatus::Success, 1, 1),
            run(3, ConclusionStatus::Failure, 2, 1),
        ])
        .unwrap();

        let order: Vec<_> = agg.per_status.keys().cloned().collect();
        assert_eq!(
            order,
            vec![ConclusionStatus::Failure, ConclusionStatus::Success]
        );
    }

    #[test]
    fn created_bounds_are_chronological() {
        // Fetch order is newest first, as GitHub returns it
        let agg = aggregate(&[
            run(3, ConclusionStatus::Success, 300, 1),
            run(1, ConclusionStatus::Success, -100, 1),
            run(2, ConclusionStatus::Success, 100, 1),
        ])
        .unwrap();

        assert_eq!(agg.first_created_at, t0() - TimeDelta::seconds(100));
        assert_eq!(agg.last_created_at, t0() + TimeDelta::seconds(300));
        assert_eq!(agg.created_span(), TimeDelta::seconds(400));
    }

    #[test]
    fn clock_skewed_run_is_counted_but_not_timed() {
        let agg = aggregate(&[
            run(1, ConclusionStatus::Success, 0, 10),
            run(2, ConclusionStatus::Success, 0, -30),
        ])
        .unwrap();

        assert_eq!(agg.total_count, 2);
        assert_eq!(agg.total_duration, TimeDelta::seconds(10));

        let stats = &agg.per_status[&ConclusionStatus::Success];
        assert_eq!(stats.count, 2);
        assert_eq!(stats.timed_count, 1);
        assert_eq!(stats.mean_duration(), Some(TimeDelta::seconds(10)));

        assert_eq!(agg.clock_skews.len(), 1);
        assert_eq!(agg.clock_skews[0].run_id, 2);
        assert_eq!(agg.clock_skews[0].skew(), TimeDelta::seconds(30));
    }

    #[test]
    fn sub_second_skew_keeps_millisecond_precision() {
        let created_at = t0();
        let skewed = WorkflowRun {
            updated_at: created_at - TimeDelta::milliseconds(400),
            ..run(4, ConclusionStatus::Failure, 0, 0)
        };

        let agg = aggregate(&[skewed]).unwrap();

        assert_eq!(agg.clock_skews.len(), 1);
        assert_eq!(agg.clock_skews[0].skew(), TimeDelta::milliseconds(400));
        assert_eq!(agg.per_status[&ConclusionStatus::Failure].timed_count, 0);
    }

    #[test]
    fn status_with_only_skewed_runs_has_no_mean() {
        let agg = aggregate(&[run(7, ConclusionStatus::Cancelled, 0, -1)]).unwrap();

        let stats = &agg.per_status[&ConclusionStatus::Cancelled];
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean_duration(), None);
        assert_eq!(agg.total_duration, TimeDelta::zero());
    }

    #[test]
    fn zero_duration_run_is_not_skewed() {
        let agg = aggregate(&[run(1, ConclusionStatus::Success, 0, 0)]).unwrap();
        assert!(agg.clock_skews.is_empty());
        assert_eq!(
            agg.per_status[&ConclusionStatus::Success].mean_duration(),
            Some(TimeDelta::zero())
        );
    }
}
