//! Image-to-video pipeline.
//!
//! Upload → submit → poll → download, one stage after the other. Each stage's
//! error is returned as-is and nothing after it runs.

use crate::api::error::RenderError;
use crate::api::RenderService;
use crate::download::DownloadProgress;
use crate::job::{Artifact, JobSpec};
use crate::poller::{self, PollPolicy};
use log::info;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub image: PathBuf,
    pub text: String,
    pub output: PathBuf,
    pub quality: String,
    pub policy: PollPolicy,
}

/// Run the whole pipeline for `job`, returning the saved video.
pub async fn run<S: RenderService + ?Sized>(
    service: &S,
    job: &RenderJob,
    progress: &mut (dyn FnMut(DownloadProgress) + Send),
) -> Result<Artifact, RenderError> {
    if !job.image.is_file() {
        return Err(RenderError::NotFound(job.image.clone()));
    }

    info!("Uploading image: {}", job.image.display());
    let image_url = service.upload_file(&job.image).await?;
    println!("Image uploaded: {}", image_url);

    info!("Creating video with text: '{}'", job.text);
    let spec = JobSpec::captioned_image(&image_url, &job.text).with_quality(job.quality.clone());
    let handle = service.submit(&spec).await?;
    println!("Render started: {}", handle);

    let outcome = poller::wait_for_render(service, &handle, job.policy).await?;
    info!("Render {} finished polling after {} status checks", handle, outcome.attempts());
    let artifact = outcome.into_result()?;

    info!("Downloading video to {}", job.output.display());
    let saved = service.download(&artifact, &job.output, progress).await?;
    println!("Video saved as {} ({} bytes)", saved.path.display(), saved.bytes);
    Ok(saved)
}

/// Progress callback that rewrites a single terminal line.
pub fn print_progress(progress: DownloadProgress) {
    match progress.percent() {
        Some(percent) => print!("\rProgress: {:.1}%", percent),
        None => print!("\rDownloaded: {} KB", progress.downloaded / 1024),
    }
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::VeedClient;
    use crate::config::ClientConfig;
    use std::time::Duration;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_submission(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/uploads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/assets/test.png", server.uri())
            })))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "vid_9" })))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/videos/vid_9/render"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "r_9" })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn job_in(dir: &std::path::Path) -> RenderJob {
        let image = dir.join("test.png");
        std::fs::write(&image, b"\x89PNG image bytes").unwrap();
        RenderJob {
            image,
            text: "make her dance".to_string(),
            output: dir.join("out").join("output_video.mp4"),
            quality: "1080p".to_string(),
            policy: PollPolicy::new(Duration::from_millis(20), Duration::from_secs(5)).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_pipeline_end_to_end() {
        let server = MockServer::start().await;
        mount_submission(&server).await;

        // Two pending answers, then done.
        Mock::given(method("GET"))
            .and(path("/v1/renders/r_9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "pending" })))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/renders/r_9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed",
                "url": format!("{}/files/r_9.mp4", server.uri())
            })))
            .with_priority(2)
            .mount(&server)
            .await;

        let video = vec![42u8; 50_000];
        Mock::given(method("GET"))
            .and(path("/files/r_9.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(video.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let job = job_in(dir.path());
        let client = VeedClient::new(ClientConfig::new(server.uri(), "test_key")).unwrap();

        let mut last = None;
        let artifact = run(&client, &job, &mut |p| last = Some(p)).await.unwrap();

        assert_eq!(artifact.path, job.output);
        assert_eq!(artifact.bytes, video.len() as u64);
        assert_eq!(std::fs::read(&job.output).unwrap(), video);
        assert_eq!(last.map(|p| p.downloaded), Some(video.len() as u64));

        let status_checks = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/v1/renders/r_9")
            .count();
        assert_eq!(status_checks, 3);
    }

    #[tokio::test]
    async fn test_failed_render_stops_before_download() {
        let server = MockServer::start().await;
        mount_submission(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/renders/r_9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "failed",
                "error": "text element exceeds frame"
            })))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let job = job_in(dir.path());
        let client = VeedClient::new(ClientConfig::new(server.uri(), "test_key")).unwrap();

        let err = run(&client, &job, &mut |_| {}).await.unwrap_err();
        match err {
            RenderError::JobFailed { reason } => assert_eq!(reason, "text element exceeds frame"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!job.output.exists());
    }

    #[tokio::test]
    async fn test_missing_image_fails_before_any_request() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let mut job = job_in(dir.path());
        job.image = dir.path().join("nope.png");
        let client = VeedClient::new(ClientConfig::new(server.uri(), "test_key")).unwrap();

        let err = run(&client, &job, &mut |_| {}).await.unwrap_err();
        assert!(matches!(err, RenderError::NotFound(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
