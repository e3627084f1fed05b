//! Artifact download.
//!
//! Bodies are streamed into `<dest>.part` and only renamed onto `dest` once
//! every declared byte has arrived, so a file at `dest` is always complete.

use crate::api::error::RenderError;
use crate::job::Artifact;
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Cumulative byte count reported after each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    /// From `Content-Length`, when the server sent one.
    pub total: Option<u64>,
}

impl DownloadProgress {
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) | None => None,
            Some(total) => Some(self.downloaded as f64 / total as f64 * 100.0),
        }
    }
}

/// Sibling path the body is written to before it is complete.
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Send `request` and stream the response body to `dest`.
pub async fn stream_to_file(
    request: RequestBuilder,
    dest: &Path,
    progress: &mut (dyn FnMut(DownloadProgress) + Send),
) -> Result<Artifact, RenderError> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(RenderError::from_response(response).await);
    }

    let total = response.content_length();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let part = partial_path(dest);
    let written = match write_body(response, &part, total, progress).await {
        Ok(written) => written,
        Err(e) => {
            discard(&part).await;
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&part, dest).await {
        discard(&part).await;
        return Err(e.into());
    }
    debug!("Saved {} bytes to {}", written, dest.display());

    Ok(Artifact {
        path: dest.to_path_buf(),
        bytes: written,
        content_type,
    })
}

async fn write_body(
    mut response: Response,
    part: &Path,
    total: Option<u64>,
    progress: &mut (dyn FnMut(DownloadProgress) + Send),
) -> Result<u64, RenderError> {
    let mut file = fs::File::create(part).await?;
    let mut downloaded: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        progress(DownloadProgress { downloaded, total });
    }

    file.flush().await?;
    file.sync_all().await?;

    match total {
        Some(expected) if expected != downloaded => Err(RenderError::IncompleteDownload {
            expected,
            received: downloaded,
        }),
        _ => Ok(downloaded),
    }
}

async fn discard(part: &Path) {
    if let Err(e) = fs::remove_file(part).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove partial download {}: {}", part.display(), e);
        }
    }
}
