//! Error handling for the render API client

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Shape of the JSON error body the render service sends back.
#[derive(Serialize, Deserialize)]
struct RawError {
    #[serde(default)]
    code: Option<String>,
    message: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// Network or connection failure, typically raised by reqwest.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP error with status {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        headers: Vec<(String, String)>,
    },

    /// The local source file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The service reported the render as failed.
    #[error("Render failed: {reason}")]
    JobFailed { reason: String },

    /// The render did not reach a terminal state before the deadline.
    #[error("Render did not finish within {}s ({attempts} status checks)", .waited.as_secs())]
    Timeout { waited: Duration, attempts: u32 },

    /// A response was received but could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid job spec: {0}")]
    InvalidJobSpec(String),

    /// The body ended before the declared content length was reached.
    #[error("Incomplete download: received {received} of {expected} bytes")]
    IncompleteDownload { expected: u64, received: u64 },

    #[error("No API key configured (set VEED_API_KEY or pass --api-key)")]
    MissingCredential,

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub async fn from_response(response: reqwest::Response) -> RenderError {
        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response text".to_string());

        RenderError::Rejected {
            status,
            message,
            headers,
        }
    }

    /// Pretty-printed JSON error body, when the service sent one.
    pub fn to_pretty(&self) -> Option<String> {
        match self {
            Self::Rejected { message: msg, .. } => {
                let parsed = serde_json::from_str::<RawError>(msg).ok()?;
                serde_json::to_string_pretty(&parsed).ok()
            }
            _ => None,
        }
    }

    /// Whether a status check that failed this way is worth repeating on the next tick.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_builder(),
            Self::Rejected { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// Try parse Retry-After header (seconds)
    pub fn retry_after_seconds(&self) -> Option<u32> {
        if let Self::Rejected { headers, .. } = self {
            for (k, v) in headers {
                if k.eq_ignore_ascii_case("retry-after") {
                    if let Ok(secs) = v.trim().parse::<u32>() {
                        return Some(secs);
                    }
                }
            }
        }
        None
    }
}
