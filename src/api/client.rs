//! Render API Client
//!
//! Talks to the hosted render service over its REST endpoints. Every call is
//! a single attempt; repeating status checks is the poller's business.

use crate::api::error::RenderError;
use crate::api::types::{CreatedResponse, RenderRequest, RenderStatusResponse, UploadResponse};
use crate::api::RenderService;
use crate::config::ClientConfig;
use crate::download::{self, DownloadProgress};
use crate::job::{Artifact, ArtifactRef, JobHandle, JobSpec, JobStatus};
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct VeedClient {
    client: Client,
    config: ClientConfig,
}

impl VeedClient {
    /// Create a client for the service described by `config`.
    pub fn new(config: ClientConfig) -> Result<Self, RenderError> {
        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .get(self.build_url(endpoint))
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.request_timeout)
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .post(self.build_url(endpoint))
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.request_timeout)
    }

    async fn handle_response_status(response: Response) -> Result<Response, RenderError> {
        if !response.status().is_success() {
            return Err(RenderError::from_response(response).await);
        }
        Ok(response)
    }

    fn decode_response<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RenderError> {
        serde_json::from_slice(bytes).map_err(|e| {
            RenderError::InvalidResponse(format!(
                "{} (body: {})",
                e,
                String::from_utf8_lossy(&bytes[..bytes.len().min(200)])
            ))
        })
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RenderError> {
        let response = request.send().await?;
        let response = Self::handle_response_status(response).await?;
        let bytes = response.bytes().await?;
        Self::decode_response(&bytes)
    }

    /// Upload raw bytes under `file_name` with an explicit content type.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, RenderError> {
        let size = data.len();
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        debug!("Uploading {} ({} bytes, {})", file_name, size, content_type);
        let response: UploadResponse = Self::send_json(self.post("v1/uploads").multipart(form)).await?;
        match response.url {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(RenderError::InvalidResponse("upload response has no url".into())),
        }
    }

    /// Create the video project; returns the project id.
    pub async fn create_project(&self, spec: &JobSpec) -> Result<String, RenderError> {
        let request = spec.to_project_request();
        let response: CreatedResponse = Self::send_json(self.post("v1/videos").json(&request)).await?;
        response
            .id
            .ok_or_else(|| RenderError::InvalidResponse("project response has no id".into()))
    }

    /// Start rendering a project; returns the render handle.
    pub async fn request_render(&self, project_id: &str, quality: &str) -> Result<JobHandle, RenderError> {
        let endpoint = format!("v1/videos/{}/render", urlencoding::encode(project_id));
        let body = RenderRequest {
            quality: quality.to_string(),
        };
        let response: CreatedResponse = Self::send_json(self.post(&endpoint).json(&body)).await?;
        response
            .id
            .map(JobHandle::new)
            .ok_or_else(|| RenderError::InvalidResponse("render response has no id".into()))
    }

    /// Whether `url` is served by the API itself and should carry the key.
    fn is_api_origin(&self, url: &Url) -> bool {
        Url::parse(&self.config.base_url)
            .map(|base| base.origin() == url.origin())
            .unwrap_or(false)
    }
}

/// Content type to declare for an upload, from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

#[async_trait::async_trait]
impl RenderService for VeedClient {
    async fn upload_file(&self, path: &Path) -> Result<String, RenderError> {
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        self.upload_bytes(data, &file_name, content_type_for(path)).await
    }

    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle, RenderError> {
        spec.validate()?;

        let project_id = self.create_project(spec).await?;
        info!("Video project created: {}", project_id);

        let handle = self.request_render(&project_id, &spec.quality).await?;
        info!("Render started: {}", handle);
        Ok(handle)
    }

    async fn render_status(&self, handle: &JobHandle) -> Result<JobStatus, RenderError> {
        let endpoint = format!("v1/renders/{}", urlencoding::encode(handle.id()));
        let response: RenderStatusResponse = Self::send_json(self.get(&endpoint)).await?;
        if let Some(progress) = response.progress {
            debug!("Render {} progress: {:.0}%", handle, progress);
        }
        JobStatus::try_from(response)
    }

    async fn download<'p>(
        &self,
        artifact: &ArtifactRef,
        dest: &Path,
        progress: &'p mut (dyn FnMut(DownloadProgress) + Send + 'p),
    ) -> Result<Artifact, RenderError> {
        let url = Url::parse(&artifact.url)
            .map_err(|e| RenderError::InvalidResponse(format!("bad artifact url {}: {}", artifact.url, e)))?;
        let mut request = self.client.get(url.clone());
        if self.is_api_origin(&url) {
            request = request.bearer_auth(&self.config.api_key);
        }
        download::stream_to_file(request, dest, progress).await
    }
}
