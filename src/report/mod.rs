//! Final operation report

use crate::ledger::ProgressSnapshot;
use crate::logging::{EventCategory, Logger};
use std::time::Duration;

/// How the run ended, before mapping to a process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
    /// A fatal discovery error stopped the run; counts up to that point
    /// are still reported
    Aborted,
}

/// Aggregated terminal-state statistics for one run
#[derive(Debug, Clone)]
pub struct OperationReport {
    pub snapshot: ProgressSnapshot,
    pub elapsed: Duration,
    pub status: RunStatus,
}

impl OperationReport {
    pub fn new(snapshot: ProgressSnapshot, status: RunStatus) -> Self {
        let elapsed = snapshot.start_time.elapsed();
        Self {
            snapshot,
            elapsed,
            status,
        }
    }

    /// Success rate over attempted transfers. Skipped images are not
    /// failures and stay out of the denominator.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.snapshot.images_synced + self.snapshot.images_failed;
        if attempted == 0 {
            100.0
        } else {
            (self.snapshot.images_synced as f64 / attempted as f64) * 100.0
        }
    }

    /// Process exit status: 0 all synced/skipped, 1 at least one failure,
    /// 2 fatal discovery abort, 130 cancelled by interrupt.
    pub fn exit_status(&self) -> i32 {
        match self.status {
            RunStatus::Cancelled => 130,
            RunStatus::Aborted => 2,
            RunStatus::Completed => {
                if self.snapshot.images_failed > 0 {
                    1
                } else {
                    0
                }
            }
        }
    }

    pub fn emit(&self, logger: &Logger) {
        logger.section("Mirror Summary");
        logger.event(
            EventCategory::Summary,
            "STATS_DURATION",
            &format!("Total duration: {}", logger.format_duration(self.elapsed)),
        );
        logger.event(
            EventCategory::Summary,
            "STATS_REPOS",
            &format!(
                "Repositories processed: {}/{}",
                self.snapshot.repositories_done, self.snapshot.repositories_total
            ),
        );
        logger.event(
            EventCategory::Summary,
            "STATS_IMAGES",
            &format!(
                "Images: {} synced, {} skipped, {} failed ({} total)",
                self.snapshot.images_synced,
                self.snapshot.images_skipped,
                self.snapshot.images_failed,
                self.snapshot.images_total()
            ),
        );
        logger.event(
            EventCategory::Summary,
            "STATS_RATE",
            &format!("Success rate: {:.1}%", self.success_rate()),
        );
        match self.status {
            RunStatus::Cancelled => {
                logger.warning(
                    "Run was cancelled before completion; counts reflect partial progress",
                );
            }
            RunStatus::Aborted => {
                logger.warning(
                    "Run aborted by a fatal discovery error; counts reflect partial progress",
                );
            }
            RunStatus::Completed if self.snapshot.images_failed == 0 => {
                logger.success("All discovered images are present at the destination");
            }
            RunStatus::Completed => {
                logger.warning(&format!(
                    "Completed with {} failed image(s); see sync-stage events above",
                    self.snapshot.images_failed
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ProgressLedger, SkipReason, Stage, TaskOutcome};

    fn snapshot(synced: usize, skipped: usize, failed: usize) -> ProgressSnapshot {
        let ledger = ProgressLedger::new();
        for _ in 0..synced {
            ledger.record(&TaskOutcome::Synced);
        }
        for _ in 0..skipped {
            ledger.record(&TaskOutcome::Skipped(SkipReason::AlreadyExists));
        }
        for _ in 0..failed {
            ledger.record(&TaskOutcome::failed(Stage::Fetch, "PULL_FAILED"));
        }
        ledger.snapshot()
    }

    #[test]
    fn test_exit_status_success() {
        let report = OperationReport::new(snapshot(3, 2, 0), RunStatus::Completed);
        assert_eq!(report.exit_status(), 0);
    }

    #[test]
    fn test_exit_status_failure() {
        let report = OperationReport::new(snapshot(3, 0, 1), RunStatus::Completed);
        assert_eq!(report.exit_status(), 1);
    }

    #[test]
    fn test_exit_status_cancelled() {
        let report = OperationReport::new(snapshot(1, 0, 0), RunStatus::Cancelled);
        assert_eq!(report.exit_status(), 130);
    }

    #[test]
    fn test_exit_status_aborted() {
        // Partial counts survive into the report, exit status stays the
        // fatal-discovery one even with zero failed images
        let report = OperationReport::new(snapshot(2, 1, 0), RunStatus::Aborted);
        assert_eq!(report.exit_status(), 2);
        assert_eq!(report.snapshot.images_synced, 2);
    }

    #[test]
    fn test_success_rate_excludes_skipped() {
        let report = OperationReport::new(snapshot(1, 8, 1), RunStatus::Completed);
        assert!((report.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_all_skipped() {
        let report = OperationReport::new(snapshot(0, 5, 0), RunStatus::Completed);
        assert!((report.success_rate() - 100.0).abs() < f64::EPSILON);
    }
}
