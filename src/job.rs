//! Render Job
//!
//! The caller-side view of a render: what gets submitted, how it is referred
//! to afterwards, and what the service says about it.

use crate::api::error::RenderError;
use crate::api::types::{Element, Position, RenderStatusResponse, Size, TextStyle, VideoProjectRequest};
use crate::consts::render;
use std::fmt::Display;
use std::path::PathBuf;

/// Everything needed to create a render. Not modified after submission.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Length of the video in seconds.
    pub duration: u32,
    pub elements: Vec<Element>,
    pub quality: String,
}

impl JobSpec {
    /// Full-frame image with a caption along the top, the layout the CLI renders.
    pub fn captioned_image(image_url: &str, text: &str) -> Self {
        let (width, height, duration) = (render::WIDTH, render::HEIGHT, render::DURATION_SECS);
        JobSpec {
            title: render::TITLE.to_string(),
            width,
            height,
            duration,
            elements: vec![
                Element::Image {
                    source: image_url.to_string(),
                    position: Position { x: 0, y: 0 },
                    size: Size { width, height },
                    start_time: 0,
                    duration,
                },
                Element::Text {
                    content: text.to_string(),
                    position: Position { x: width / 2, y: 100 },
                    style: TextStyle {
                        font_size: 60,
                        color: "#FFFFFF".to_string(),
                        background_color: "rgba(0, 0, 0, 0.8)".to_string(),
                        font_family: "Arial".to_string(),
                        font_weight: "bold".to_string(),
                        text_align: "center".to_string(),
                        padding: 20,
                    },
                    start_time: 0,
                    duration,
                },
            ],
            quality: render::QUALITY.to_string(),
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    /// Presence checks only; the service validates the rest.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.elements.is_empty() {
            return Err(RenderError::InvalidJobSpec("no elements".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidJobSpec(format!(
                "resolution {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.duration == 0 {
            return Err(RenderError::InvalidJobSpec("duration is zero".into()));
        }
        if self.quality.trim().is_empty() {
            return Err(RenderError::InvalidJobSpec("quality is empty".into()));
        }
        Ok(())
    }

    pub fn to_project_request(&self) -> VideoProjectRequest {
        VideoProjectRequest {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
            duration: self.duration,
            elements: self.elements.clone(),
        }
    }
}

/// Render id handed out by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        JobHandle(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the finished video can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed(ArtifactRef),
    Failed(String),
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed(artifact) => write!(f, "completed ({})", artifact.url),
            JobStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

impl TryFrom<RenderStatusResponse> for JobStatus {
    type Error = RenderError;

    fn try_from(response: RenderStatusResponse) -> Result<Self, Self::Error> {
        let status = response.status.as_deref().unwrap_or("").trim().to_ascii_lowercase();
        match status.as_str() {
            "completed" | "succeeded" | "done" => match response.url {
                Some(url) if !url.is_empty() => Ok(JobStatus::Completed(ArtifactRef { url })),
                _ => Err(RenderError::InvalidResponse(
                    "render completed without a download url".into(),
                )),
            },
            "failed" | "error" | "canceled" | "cancelled" => {
                let reason = response
                    .error
                    .or(response.message)
                    .unwrap_or_else(|| "render failed".to_string());
                Ok(JobStatus::Failed(reason))
            }
            "running" | "rendering" | "processing" => Ok(JobStatus::Running),
            _ => Ok(JobStatus::Pending),
        }
    }
}

/// A downloaded video on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: u64,
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: &str) -> RenderStatusResponse {
        RenderStatusResponse {
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_captioned_image_layout() {
        let spec = JobSpec::captioned_image("https://cdn.example/img.png", "make her dance");
        assert_eq!((spec.width, spec.height, spec.duration), (1920, 1080, 5));
        assert_eq!(spec.quality, "1080p");
        assert_eq!(spec.elements.len(), 2);
        match &spec.elements[1] {
            Element::Text { content, position, .. } => {
                assert_eq!(content, "make her dance");
                assert_eq!(*position, Position { x: 960, y: 100 });
            }
            other => panic!("expected text element, got {:?}", other),
        }
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_parts() {
        let mut spec = JobSpec::captioned_image("u", "t");
        spec.elements.clear();
        assert!(matches!(spec.validate(), Err(RenderError::InvalidJobSpec(_))));

        let spec = JobSpec::captioned_image("u", "t").with_quality(" ");
        assert!(matches!(spec.validate(), Err(RenderError::InvalidJobSpec(_))));

        let mut spec = JobSpec::captioned_image("u", "t");
        spec.duration = 0;
        assert!(matches!(spec.validate(), Err(RenderError::InvalidJobSpec(_))));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(JobStatus::try_from(response("queued")).unwrap(), JobStatus::Pending);
        assert_eq!(JobStatus::try_from(response("Rendering")).unwrap(), JobStatus::Running);
        assert_eq!(
            JobStatus::try_from(RenderStatusResponse::default()).unwrap(),
            JobStatus::Pending
        );

        let mut done = response("completed");
        done.url = Some("https://cdn.example/out.mp4".to_string());
        assert_eq!(
            JobStatus::try_from(done).unwrap(),
            JobStatus::Completed(ArtifactRef {
                url: "https://cdn.example/out.mp4".to_string()
            })
        );
    }

    #[test]
    fn test_completed_without_url_is_invalid() {
        assert!(matches!(
            JobStatus::try_from(response("completed")),
            Err(RenderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_failed_reason_prefers_error_then_message() {
        let mut failed = response("failed");
        failed.error = Some("codec error".to_string());
        failed.message = Some("ignored".to_string());
        assert_eq!(
            JobStatus::try_from(failed).unwrap(),
            JobStatus::Failed("codec error".to_string())
        );

        let mut failed = response("failed");
        failed.message = Some("out of credits".to_string());
        assert_eq!(
            JobStatus::try_from(failed).unwrap(),
            JobStatus::Failed("out of credits".to_string())
        );

        assert_eq!(
            JobStatus::try_from(response("canceled")).unwrap(),
            JobStatus::Failed("render failed".to_string())
        );
    }
}
