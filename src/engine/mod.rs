//! Sync engine
//!
//! Drives the discovery → diff → replicate workflow: enumerate every
//! (repository, tag) pair at the source, skip anything already present at
//! the destination, and run the fetch/relabel/publish/verify/cleanup
//! pipeline for the rest. The destination is append-only from this
//! engine's perspective: nothing pre-existing is ever touched, and nothing
//! is ever deleted on either side.

use crate::catalog::CatalogClient;
use crate::config::RegistryEndpoint;
use crate::ledger::{ProgressLedger, SkipReason, Stage, TaskOutcome};
use crate::logging::{EventCategory, Logger};
use crate::reference::{ImageReference, SyncTask};
use crate::report::{OperationReport, RunStatus};
use crate::transfer::{LocalHandle, TransferClient};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Verify-after-publish tuning; a small bounded re-check absorbs registry
/// eventual-consistency lag
#[derive(Debug, Clone)]
pub struct VerifyPolicy {
    pub retries: usize,
    pub delay: Duration,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(2),
        }
    }
}

pub struct SyncEngine<C: CatalogClient, T: TransferClient> {
    source: RegistryEndpoint,
    dest: RegistryEndpoint,
    source_catalog: C,
    dest_catalog: C,
    transfer: T,
    ledger: ProgressLedger,
    verify: VerifyPolicy,
    logger: Logger,
    cancelled: Arc<AtomicBool>,
}

impl<C: CatalogClient, T: TransferClient> SyncEngine<C, T> {
    pub fn new(
        source: RegistryEndpoint,
        dest: RegistryEndpoint,
        source_catalog: C,
        dest_catalog: C,
        transfer: T,
        logger: Logger,
    ) -> Self {
        Self {
            source,
            dest,
            source_catalog,
            dest_catalog,
            transfer,
            ledger: ProgressLedger::new(),
            verify: VerifyPolicy::default(),
            logger,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_verify_policy(mut self, verify: VerifyPolicy) -> Self {
        self.verify = verify;
        self
    }

    /// Flag checked between tasks; setting it stops dispatch of new tasks
    /// while letting the in-flight task finish its cleanup.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Counts accumulated so far. Valid at any point, including after a
    /// fatal discovery error aborted [`run`](Self::run) mid-way.
    pub fn progress(&self) -> crate::ledger::ProgressSnapshot {
        self.ledger.snapshot()
    }

    /// Run the full mirror pass.
    ///
    /// Discovery failures abort the run (an incomplete catalog would
    /// silently under-sync); per-task failures are isolated and recorded.
    /// The exists-then-publish sequence assumes no concurrent external
    /// writer to the destination namespace.
    pub async fn run(&self) -> crate::error::Result<OperationReport> {
        self.logger.event(
            EventCategory::Discovery,
            "DISCOVERY_START",
            &format!(
                "Discovering repositories in {}/{}",
                self.source.host, self.source.namespace
            ),
        );

        let repositories = self.source_catalog.list_repositories().await?;
        if repositories.is_empty() {
            self.logger.warning("No repositories found at source; nothing to mirror");
            return Ok(OperationReport::new(self.ledger.snapshot(), RunStatus::Completed));
        }
        self.ledger.set_repositories_total(repositories.len());

        let total_repos = repositories.len();
        for (repo_idx, repository) in repositories.iter().enumerate() {
            if self.is_cancelled() {
                break;
            }

            self.logger.step(&format!(
                "[{}/{}] Processing repository {}",
                repo_idx + 1,
                total_repos,
                repository
            ));

            let tags = self.source_catalog.list_tags(repository).await?;
            if tags.is_empty() {
                self.logger
                    .detail(&format!("No tags in {}; skipping", repository));
            }

            for tag in &tags {
                if self.is_cancelled() {
                    break;
                }
                let task = SyncTask::derive(&self.source, &self.dest, repository, tag);
                let outcome = self.run_task(&task).await;
                self.ledger.record(&outcome);
            }

            if self.is_cancelled() {
                break;
            }
            self.ledger.repository_done();
            self.emit_progress();
        }

        let status = if self.is_cancelled() {
            self.logger.event(
                EventCategory::Summary,
                "USER_STOP",
                "Interrupt received; stopped dispatching new tasks",
            );
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        Ok(OperationReport::new(self.ledger.snapshot(), status))
    }

    fn emit_progress(&self) {
        let snap = self.ledger.snapshot();
        self.logger.event(
            EventCategory::Progress,
            "PROGRESS_UPDATE",
            &format!(
                "Repository {}/{} complete ({:.1}%) | Images: {} synced, {} skipped, {} failed",
                snap.repositories_done,
                snap.repositories_total,
                snap.repositories_percentage(),
                snap.images_synced,
                snap.images_skipped,
                snap.images_failed
            ),
        );
    }

    /// Per-task state machine:
    /// `PreCheck → {Skip | Fetch → Relabel → Publish → Verify} → Cleanup`.
    ///
    /// Never returns an error; every failure is classified into a
    /// [`TaskOutcome`] so one bad image cannot abort its siblings. Local
    /// copies are reclaimed on every exit path that created any.
    async fn run_task(&self, task: &SyncTask) -> TaskOutcome {
        // PreCheck: pre-existing destination content is never touched
        match self.dest_catalog.exists(&task.dest).await {
            Ok(true) => {
                self.logger.event(
                    EventCategory::Sync,
                    "SYNC_ALREADY_EXISTS",
                    &format!("Already present at destination, skipping: {}", task.dest),
                );
                return TaskOutcome::Skipped(SkipReason::AlreadyExists);
            }
            Ok(false) => {}
            Err(e) => {
                // A failed probe is not a not-found; keep the two apart in logs
                self.logger.event_error(
                    EventCategory::Sync,
                    "EXISTS_CHECK_FAILED",
                    &format!("Pre-check probe failed for {}: {}", task.dest, e),
                );
                return TaskOutcome::failed(Stage::PreCheck, "EXISTS_CHECK_FAILED");
            }
        }

        let mut handles: Vec<LocalHandle> = Vec::new();

        let fetched = match self.transfer.fetch(&task.source).await {
            Ok(handle) => handle,
            Err(e) => {
                return self
                    .fail(task, handles, Stage::Fetch, "PULL_FAILED", &e)
                    .await;
            }
        };
        handles.push(fetched.clone());

        let relabeled = match self.transfer.relabel(&fetched, &task.dest).await {
            Ok(handle) => handle,
            Err(e) => {
                return self
                    .fail(task, handles, Stage::Relabel, "TAG_FAILED", &e)
                    .await;
            }
        };
        handles.push(relabeled.clone());

        if let Err(e) = self.transfer.publish(&relabeled).await {
            return self
                .fail(task, handles, Stage::Publish, "PUSH_FAILED", &e)
                .await;
        }

        match self.verify_published(&task.dest).await {
            Ok(true) => {}
            Ok(false) => {
                self.logger.event_error(
                    EventCategory::Sync,
                    "SYNC_VERIFY_FAILED",
                    &format!(
                        "Publish reported success but {} is not visible at destination",
                        task.dest
                    ),
                );
                self.transfer.cleanup_local(&handles).await;
                return TaskOutcome::failed(Stage::Verify, "VERIFY_FAILED");
            }
            Err(e) => {
                return self
                    .fail(task, handles, Stage::Verify, "VERIFY_ERROR", &e)
                    .await;
            }
        }

        self.transfer.cleanup_local(&handles).await;
        self.logger.event(
            EventCategory::Sync,
            "SYNC_SUCCESS",
            &format!("Synced {} -> {}", task.source, task.dest),
        );
        TaskOutcome::Synced
    }

    /// Post-publish existence re-check, with a short bounded retry to
    /// absorb eventual-consistency windows
    async fn verify_published(&self, dest: &ImageReference) -> crate::error::Result<bool> {
        let verify_err =
            |e: crate::error::MirrorError| crate::error::MirrorError::Verify(e.to_string());

        if self.dest_catalog.exists(dest).await.map_err(verify_err)? {
            return Ok(true);
        }
        for _ in 0..self.verify.retries {
            tokio::time::sleep(self.verify.delay).await;
            if self.dest_catalog.exists(dest).await.map_err(verify_err)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn fail(
        &self,
        task: &SyncTask,
        handles: Vec<LocalHandle>,
        stage: Stage,
        code: &str,
        cause: &crate::error::MirrorError,
    ) -> TaskOutcome {
        self.logger.event_error(
            EventCategory::Sync,
            code,
            &format!(
                "{} stage failed for {} -> {}: {}",
                stage, task.source, task.dest, cause
            ),
        );
        self.transfer.cleanup_local(&handles).await;
        TaskOutcome::failed(stage, code)
    }
}
