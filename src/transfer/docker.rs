//! Docker CLI transfer client
//!
//! Delegates the bulk byte movement to the local docker daemon: `pull`,
//! `tag`, `push` and `rmi -f`. The daemon's session is expected to be
//! authenticated against both registries before the run starts; this client
//! never logs in itself.

use crate::common::with_retry;
use crate::config::RetryConfig;
use crate::error::{MirrorError, Result};
use crate::logging::{EventCategory, Logger};
use crate::reference::ImageReference;
use crate::transfer::{LocalHandle, TransferClient};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub struct DockerTransferClient {
    retry: RetryConfig,
    command_timeout: Duration,
    logger: Logger,
}

impl DockerTransferClient {
    pub fn new(retry: RetryConfig, command_timeout: Duration, logger: Logger) -> Self {
        Self {
            retry,
            command_timeout,
            logger,
        }
    }

    /// Run one docker command to completion, mapping failures through `err`.
    async fn run_docker<E>(&self, args: &[&str], err: E) -> Result<()>
    where
        E: Fn(String) -> MirrorError,
    {
        self.logger
            .detail(&format!("docker {}", args.join(" ")));

        let child = Command::new("docker")
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::time::timeout(self.command_timeout, child)
            .await
            .map_err(|_| {
                err(format!(
                    "docker {} timed out after {}s",
                    args.join(" "),
                    self.command_timeout.as_secs()
                ))
            })?
            .map_err(|e| err(format!("docker {} could not start: {}", args.join(" "), e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        // A missing image stays missing; retrying the command is pointless
        if is_missing_image_error(&stderr) {
            return Err(MirrorError::NotFound(format!(
                "docker {}: {}",
                args.join(" "),
                stderr
            )));
        }
        Err(err(format!("docker {}: {}", args.join(" "), stderr)))
    }
}

/// Daemon wordings for a definitively absent image: pull/push say
/// "not found" or "manifest unknown", `rmi` says "No such image"
fn is_missing_image_error(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    lowered.contains("not found")
        || lowered.contains("manifest unknown")
        || lowered.contains("no such image")
}

#[async_trait]
impl TransferClient for DockerTransferClient {
    async fn fetch(&self, source: &ImageReference) -> Result<LocalHandle> {
        let url = source.image_url();
        self.logger
            .event(EventCategory::Sync, "SYNC_PULLING", &format!("Pulling {}", url));

        with_retry(&self.retry, "docker pull", || async {
            self.run_docker(&["pull", &url], MirrorError::Fetch).await
        })
        .await
        .map_err(|e| MirrorError::Fetch(format!("{}: {}", url, e)))?;

        Ok(LocalHandle::new(source))
    }

    async fn relabel(&self, local: &LocalHandle, dest: &ImageReference) -> Result<LocalHandle> {
        let dest_url = dest.image_url();
        self.logger
            .event(EventCategory::Sync, "SYNC_TAGGING", &format!("Tagging {}", dest_url));

        with_retry(&self.retry, "docker tag", || async {
            self.run_docker(&["tag", &local.image_url, &dest_url], MirrorError::Relabel)
                .await
        })
        .await
        .map_err(|e| MirrorError::Relabel(format!("{}: {}", dest_url, e)))?;

        Ok(LocalHandle::new(dest))
    }

    async fn publish(&self, local: &LocalHandle) -> Result<()> {
        self.logger.event(
            EventCategory::Sync,
            "SYNC_PUSHING",
            &format!("Pushing {}", local.image_url),
        );

        with_retry(&self.retry, "docker push", || async {
            self.run_docker(&["push", &local.image_url], MirrorError::Publish)
                .await
        })
        .await
        .map_err(|e| MirrorError::Publish(format!("{}: {}", local.image_url, e)))
    }

    async fn cleanup_local(&self, handles: &[LocalHandle]) {
        if handles.is_empty() {
            return;
        }
        self.logger.event(
            EventCategory::Sync,
            "CLEANUP_START",
            &format!("Removing {} local image(s)", handles.len()),
        );

        for handle in handles {
            // Forced removal; a copy that is already gone is fine
            match self
                .run_docker(&["rmi", "-f", &handle.image_url], MirrorError::Io)
                .await
            {
                Ok(()) | Err(MirrorError::NotFound(_)) => {}
                Err(e) => {
                    self.logger
                        .warning(&format!("Failed to remove local image {}: {}", handle, e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_wordings() {
        assert!(is_missing_image_error(
            "Error response from daemon: manifest for quay.example.com/apps/web:v9 not found"
        ));
        assert!(is_missing_image_error("manifest unknown: manifest unknown"));
        // rmi wording for an already-removed copy
        assert!(is_missing_image_error(
            "Error response from daemon: No such image: quay.example.com/apps/web:v1"
        ));
        assert!(!is_missing_image_error(
            "Error response from daemon: received unexpected HTTP status: 503"
        ));
    }
}
