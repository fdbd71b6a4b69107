//! HTTP Backend Client
//!
//! Implements [`VerifyBackend`](super::VerifyBackend) against the verification
//! service over HTTP. The service reports application rejections as JSON
//! bodies with `ok: false` on non-2xx statuses, so decoding is attempted
//! before the status code is turned into an error.

use super::error::{ApiError, Result};
use super::types::*;
use super::VerifyBackend;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the verification service
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    /// Create a client with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { base_url, client })
    }

    /// Create a client from the backend configuration section.
    pub fn from_config(config: &crate::config::BackendConfig) -> Result<Self> {
        Self::with_timeouts(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        tracing::debug!("POST {}", path);
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!("GET {}", path);
        let response = self.client.get(self.url(path)).send().await?;
        Self::read_json(response).await
    }

    /// Decode a response body, preferring the body's own rejection shape over
    /// the status code when both are present.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let bytes = response.bytes().await?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(ApiError::Status {
                status: status.as_u16(),
            }),
            Err(err) => Err(ApiError::Decode(err)),
        }
    }
}

#[async_trait]
impl VerifyBackend for HttpBackend {
    async fn preview(&self, request: PreviewRequest) -> Result<PreviewOutcome> {
        let raw: RawPreviewResponse = self.post_json("/verify/api/preview", &request).await?;
        raw.into_outcome()
    }

    async fn submit(&self, request: SubmitRequest) -> Result<SubmitAck> {
        let raw: RawSubmitResponse = self.post_json("/verify/api/submit", &request).await?;
        raw.into_ack()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let raw: RawChatResponse = self.post_json("/verify/api/chat", &request).await?;
        raw.into_reply()
    }

    async fn ocr(&self, file_name: String, mime: String, bytes: Vec<u8>) -> Result<OcrOutcome> {
        tracing::debug!("POST /verify/api/ocr ({} bytes)", bytes.len());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime)
            .map_err(ApiError::Transport)?;
        let form = Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/verify/api/ocr"))
            .multipart(form)
            .send()
            .await?;
        let raw: RawOcrResponse = Self::read_json(response).await?;
        Ok(raw.into_outcome())
    }

    async fn confirm_true_chart(&self, request: ConfirmTrueChartRequest) -> Result<ConfirmAck> {
        let raw: RawConfirmResponse = self
            .post_json("/verify/api/confirm_true_chart", &request)
            .await?;
        raw.into_ack()
    }

    async fn validation_log(&self, request: ValidationLogRequest) -> Result<ValidationAck> {
        let raw: RawValidationLogResponse =
            self.post_json("/verify/api/validation_log", &request).await?;
        raw.into_ack()
    }

    async fn run_full_chart_ai(&self, request: FullChartRequest) -> Result<FullChartAck> {
        let raw: RawFullChartResponse = self
            .post_json("/verify/api/run_full_chart_ai", &request)
            .await?;
        raw.into_ack()
    }

    async fn sop_templates(&self) -> Result<Vec<SopTemplate>> {
        let raw: RawSopTemplatesResponse = self.get_json("/verify/api/sop_templates").await?;
        if !raw.ok {
            return Err(ApiError::Rejected("获取模板列表失败".to_string()));
        }
        Ok(raw.templates)
    }

    async fn upload_sop(&self, file_name: String, bytes: Vec<u8>) -> Result<UploadSopAck> {
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/json")
            .map_err(ApiError::Transport)?;
        let form = Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/verify/api/upload_sop"))
            .multipart(form)
            .send()
            .await?;
        let raw: RawUploadSopResponse = Self::read_json(response).await?;
        raw.into_ack()
    }
}
