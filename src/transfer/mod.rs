//! Artifact transfer
//!
//! The [`TransferClient`] trait wraps the three atomic artifact operations
//! (fetch, relabel, publish) plus local cleanup. The production
//! implementation shells out to the docker CLI in [`docker`]; tests
//! substitute in-memory fakes.

pub mod docker;

use crate::error::Result;
use crate::reference::ImageReference;
use async_trait::async_trait;
use std::fmt;

pub use docker::DockerTransferClient;

/// A transient local copy of an artifact, reclaimed at task end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHandle {
    pub image_url: String,
}

impl LocalHandle {
    pub fn new(reference: &ImageReference) -> Self {
        Self {
            image_url: reference.image_url(),
        }
    }
}

impl fmt::Display for LocalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.image_url)
    }
}

/// The four idempotent, independently retryable transfer stages
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Materialize the source artifact locally
    async fn fetch(&self, source: &ImageReference) -> Result<LocalHandle>;

    /// Create a local alias pointing at the destination reference without
    /// re-transferring bytes
    async fn relabel(&self, local: &LocalHandle, dest: &ImageReference) -> Result<LocalHandle>;

    /// Upload the relabeled artifact to the destination
    async fn publish(&self, local: &LocalHandle) -> Result<()>;

    /// Best-effort forced removal of every local copy created during a
    /// task. Soft errors ("not found", "in use") are ignored; this must be
    /// safe to call on every exit path.
    async fn cleanup_local(&self, handles: &[LocalHandle]);
}
