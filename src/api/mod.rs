//! Verification Backend API
//!
//! Typed client for the verification service. Raw wire shapes live in
//! [`types`] and decode once into tagged outcome enums; [`client`] implements
//! the [`VerifyBackend`] trait over HTTP. The trait is the seam the wizard is
//! written against, so tests drive the full flow with an in-memory backend.

pub mod client;
pub mod confidence;
pub mod error;
pub mod types;

pub use client::HttpBackend;
pub use confidence::{ConfidenceLevel, ConfidenceValue};
pub use error::{ApiError, Result};
pub use types::*;

use async_trait::async_trait;

/// Backend endpoints consumed by the wizard
#[async_trait]
pub trait VerifyBackend: Send + Sync {
    /// Upload-and-verify one chart text
    async fn preview(&self, request: PreviewRequest) -> Result<PreviewOutcome>;

    /// Save the combined verification record
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitAck>;

    /// One companion chat round trip
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply>;

    /// Recognize chart text from an uploaded image
    async fn ocr(&self, file_name: String, mime: String, bytes: Vec<u8>) -> Result<OcrOutcome>;

    /// Confirm the true chart, enabling statement validation
    async fn confirm_true_chart(&self, request: ConfirmTrueChartRequest) -> Result<ConfirmAck>;

    /// Record one statement validation click
    async fn validation_log(&self, request: ValidationLogRequest) -> Result<ValidationAck>;

    /// Run the Mode B full-chart comparison
    async fn run_full_chart_ai(&self, request: FullChartRequest) -> Result<FullChartAck>;

    /// List available SOP analysis templates
    async fn sop_templates(&self) -> Result<Vec<SopTemplate>>;

    /// Upload a custom SOP template file
    async fn upload_sop(&self, file_name: String, bytes: Vec<u8>) -> Result<UploadSopAck>;
}
