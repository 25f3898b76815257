//! HTTP client for the design API.
//!
//! `ApiClient` owns a `reqwest::Client` and knows every endpoint path. The
//! four pipeline calls sit behind the [`DesignApi`] trait so the pipeline
//! driver can be tested against recording fakes.

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::models::*;
use crate::config::Config;
use crate::errors::ApiError;

/// The four remote operations one edit request is made of. `project_id` is
/// optional throughout; the server falls back to the image's own project.
#[async_trait]
pub trait DesignApi: Send + Sync {
    /// Request scene analysis for an uploaded image. The payload is opaque;
    /// the pipeline only needs the call to succeed.
    async fn analyze_scene(&self, image_id: &str) -> Result<serde_json::Value, ApiError>;

    /// Turn a natural-language instruction into an edit plan.
    async fn plan_edits(
        &self,
        prompt: &str,
        image_id: &str,
        project_id: Option<&str>,
    ) -> Result<EditPlan, ApiError>;

    /// Fetch supplementary design knowledge for the instruction. Best-effort
    /// enrichment; callers may ignore failures.
    async fn fetch_design_knowledge(
        &self,
        request: &str,
        image_id: &str,
        project_id: Option<&str>,
    ) -> Result<DesignKnowledge, ApiError>;

    /// Submit the plan for rendering and return the produced version.
    async fn run_inpainting(
        &self,
        image_id: &str,
        edit_plan: &EditPlan,
        project_id: Option<&str>,
        client_id: &str,
    ) -> Result<Version, ApiError>;
}

/// Concrete client over HTTP.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        // Inference runs can take minutes; no request timeout by default.
        let http = reqwest::Client::builder()
            .build()
            .map_err(|source| ApiError::Transport {
                path: config.api_base.clone(),
                source,
            })?;
        Ok(Self {
            http,
            base: config.api_base.clone(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Issue a request and decode a JSON body, mapping every failure mode to
    /// a typed error carrying the endpoint path.
    async fn decode_json<T: DeserializeOwned>(
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
                body,
            });
        }
        response.json().await.map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        Self::decode_json(path, self.http.post(self.url(path)).json(body)).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Self::decode_json(path, self.http.get(self.url(path))).await
    }

    /// Read a local file into a multipart part with a guessed content type.
    fn file_part(path: &Path) -> Result<reqwest::multipart::Part, ApiError> {
        let bytes = std::fs::read(path).map_err(|source| ApiError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())
            .expect("mime_guess produces valid mime strings");
        Ok(part)
    }

    /// Upload a room image. Returns its public URL and server-side id.
    pub async fn upload_image(&self, image: &Path) -> Result<UploadResponse, ApiError> {
        let path = "/api/v1/upload-image";
        let form = reqwest::multipart::Form::new().part("file", Self::file_part(image)?);
        Self::decode_json(path, self.http.post(self.url(path)).multipart(form)).await
    }

    /// Transcribe an audio instruction to text.
    pub async fn transcribe(&self, audio: &Path) -> Result<Transcription, ApiError> {
        let path = "/api/v1/transcribe";
        let form = reqwest::multipart::Form::new().part("file", Self::file_part(audio)?);
        Self::decode_json(path, self.http.post(self.url(path)).multipart(form)).await
    }

    /// Ask the server where its status stream lives.
    pub async fn ws_url(&self) -> Result<String, ApiError> {
        let response: WsUrlResponse = self.get_json("/api/v1/system/ws-url").await?;
        Ok(response.ws_url)
    }

    /// Create a public share link for a project version.
    pub async fn share_version(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> Result<ShareLink, ApiError> {
        let path = format!("/api/v1/projects/{project_id}/share");
        self.post_json(&path, &json!({ "version_id": version_id }))
            .await
    }

    /// Fetch a shared view by its token.
    pub async fn fetch_shared(&self, token: &str) -> Result<SharedView, ApiError> {
        self.get_json(&format!("/api/v1/share/{token}")).await
    }

    /// Download a version's image payload.
    pub async fn export_version(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let path = format!("/api/v1/projects/{project_id}/versions/{version_id}/export");
        let response = self
            .http
            .get(self.url(&path))
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { path, status, body });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Decode { path, source })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DesignApi for ApiClient {
    async fn analyze_scene(&self, image_id: &str) -> Result<serde_json::Value, ApiError> {
        self.post_json("/api/v1/analyze-scene", &json!({ "image_id": image_id }))
            .await
    }

    async fn plan_edits(
        &self,
        prompt: &str,
        image_id: &str,
        project_id: Option<&str>,
    ) -> Result<EditPlan, ApiError> {
        self.post_json(
            "/api/v1/plan-edits",
            &json!({
                "user_prompt": prompt,
                "image_id": image_id,
                "project_id": project_id,
            }),
        )
        .await
    }

    async fn fetch_design_knowledge(
        &self,
        request: &str,
        image_id: &str,
        project_id: Option<&str>,
    ) -> Result<DesignKnowledge, ApiError> {
        self.post_json(
            "/api/v1/fetch-design-knowledge",
            &json!({
                "user_request": request,
                "image_id": image_id,
                "project_id": project_id,
            }),
        )
        .await
    }

    async fn run_inpainting(
        &self,
        image_id: &str,
        edit_plan: &EditPlan,
        project_id: Option<&str>,
        client_id: &str,
    ) -> Result<Version, ApiError> {
        self.post_json(
            "/api/v1/run-inpainting",
            &json!({
                "image_id": image_id,
                "edit_plan": edit_plan,
                "project_id": project_id,
                "client_id": client_id,
            }),
        )
        .await
    }
}
