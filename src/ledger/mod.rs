//! Progress accounting
//!
//! The [`ProgressLedger`] is the single source of truth for how far a run
//! has progressed. Counters only ever advance, are updated atomically so a
//! concurrent engine stays correct, and survive to the final report even
//! when the run is interrupted mid-way.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Pipeline stage a task failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PreCheck,
    Fetch,
    Relabel,
    Publish,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::PreCheck => "pre-check",
            Stage::Fetch => "fetch",
            Stage::Relabel => "relabel",
            Stage::Publish => "publish",
            Stage::Verify => "verify",
        };
        f.write_str(s)
    }
}

/// Why a task was skipped without touching the transfer client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyExists,
}

/// Terminal state of one sync task, recorded exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Synced,
    Skipped(SkipReason),
    Failed { stage: Stage, code: String },
}

impl TaskOutcome {
    pub fn failed(stage: Stage, code: impl Into<String>) -> Self {
        TaskOutcome::Failed {
            stage,
            code: code.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failed { .. })
    }
}

/// Read-only view of the ledger at one point in time
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub repositories_total: usize,
    pub repositories_done: usize,
    pub images_synced: usize,
    pub images_skipped: usize,
    pub images_failed: usize,
    pub start_time: Instant,
}

impl ProgressSnapshot {
    pub fn images_total(&self) -> usize {
        self.images_synced + self.images_skipped + self.images_failed
    }

    pub fn repositories_percentage(&self) -> f64 {
        if self.repositories_total == 0 {
            100.0
        } else {
            (self.repositories_done as f64 / self.repositories_total as f64) * 100.0
        }
    }
}

/// Monotonic per-run counters with atomic updates
#[derive(Debug)]
pub struct ProgressLedger {
    repositories_total: AtomicUsize,
    repositories_done: AtomicUsize,
    images_synced: AtomicUsize,
    images_skipped: AtomicUsize,
    images_failed: AtomicUsize,
    start_time: Instant,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self {
            repositories_total: AtomicUsize::new(0),
            repositories_done: AtomicUsize::new(0),
            images_synced: AtomicUsize::new(0),
            images_skipped: AtomicUsize::new(0),
            images_failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn set_repositories_total(&self, total: usize) {
        self.repositories_total.store(total, Ordering::SeqCst);
    }

    pub fn repository_done(&self) {
        self.repositories_done.fetch_add(1, Ordering::SeqCst);
    }

    /// Record one terminal outcome into the matching counter
    pub fn record(&self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Synced => self.images_synced.fetch_add(1, Ordering::SeqCst),
            TaskOutcome::Skipped(_) => self.images_skipped.fetch_add(1, Ordering::SeqCst),
            TaskOutcome::Failed { .. } => self.images_failed.fetch_add(1, Ordering::SeqCst),
        };
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            repositories_total: self.repositories_total.load(Ordering::SeqCst),
            repositories_done: self.repositories_done.load(Ordering::SeqCst),
            images_synced: self.images_synced.load(Ordering::SeqCst),
            images_skipped: self.images_skipped.load(Ordering::SeqCst),
            images_failed: self.images_failed.load(Ordering::SeqCst),
            start_time: self.start_time,
        }
    }
}

impl Default for ProgressLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let ledger = ProgressLedger::new();
        ledger.record(&TaskOutcome::Synced);
        ledger.record(&TaskOutcome::Synced);
        ledger.record(&TaskOutcome::Skipped(SkipReason::AlreadyExists));
        ledger.record(&TaskOutcome::failed(Stage::Publish, "PUSH_FAILED"));

        let snap = ledger.snapshot();
        assert_eq!(snap.images_synced, 2);
        assert_eq!(snap.images_skipped, 1);
        assert_eq!(snap.images_failed, 1);
        assert_eq!(snap.images_total(), 4);
    }

    #[test]
    fn test_repository_percentage() {
        let ledger = ProgressLedger::new();
        ledger.set_repositories_total(4);
        ledger.repository_done();
        let snap = ledger.snapshot();
        assert_eq!(snap.repositories_done, 1);
        assert!((snap.repositories_percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_run_percentage() {
        let snap = ProgressLedger::new().snapshot();
        assert!((snap.repositories_percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_outcome_classification() {
        assert!(!TaskOutcome::Synced.is_failure());
        assert!(!TaskOutcome::Skipped(SkipReason::AlreadyExists).is_failure());
        assert!(TaskOutcome::failed(Stage::Verify, "VERIFY_FAILED").is_failure());
    }
}
