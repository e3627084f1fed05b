//! Render API
//!
//! Client side of the hosted video-render service: upload assets, create
//! renders, check on them and fetch the result.

pub mod client;
pub mod error;
pub mod types;

use crate::api::error::RenderError;
use crate::download::DownloadProgress;
use crate::job::{Artifact, ArtifactRef, JobHandle, JobSpec, JobStatus};
use std::path::Path;

pub use client::VeedClient;

/// Progress callback for downloads. Spelled as an alias because mockall's
/// `automock` rejects inline `dyn FnMut` parameters.
type ProgressFn<'a> = dyn FnMut(DownloadProgress) + Send + 'a;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RenderService: Send + Sync {
    /// Upload a local file and return the URL the service can read it from.
    async fn upload_file(&self, path: &Path) -> Result<String, RenderError>;

    /// Create a render for the spec. Every call creates a new remote job.
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle, RenderError>;

    /// Ask the service for the current state of a render.
    async fn render_status(&self, handle: &JobHandle) -> Result<JobStatus, RenderError>;

    /// Stream a finished render to `dest`.
    async fn download<'p>(
        &self,
        artifact: &ArtifactRef,
        dest: &Path,
        progress: &'p mut ProgressFn<'p>,
    ) -> Result<Artifact, RenderError>;
}
