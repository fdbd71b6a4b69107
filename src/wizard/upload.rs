//! Upload Controller
//!
//! Accepts files, pasted/typed text, or images per chart kind, delegates
//! image recognition to the OCR endpoint, and forwards text to the
//! verification coordinator. Owns the per-kind status indicator transitions;
//! a transition to `Error` never touches a previously stored result.

use super::coordinator::{VerificationCoordinator, VerifyDisposition};
use super::events::{emit, EventSink, WizardEvent};
use super::state::ConversationStateMachine;
use super::store::ChartSlotStore;
use crate::api::{ChartKind, OcrOutcome, VerifyBackend};
use base64::Engine;

/// Per-kind status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Reading,
    Ocr,
    Verifying,
    Success,
    Error,
}

impl UploadStatus {
    /// Indicator label as shown next to the result panel.
    pub fn label(&self) -> &'static str {
        match self {
            UploadStatus::Idle => "等待上传...",
            UploadStatus::Reading => "读取文件中...",
            UploadStatus::Ocr => "识别图片中...",
            UploadStatus::Verifying => "验证中...",
            UploadStatus::Success => "验证完成",
            UploadStatus::Error => "验证失败",
        }
    }
}

/// One piece of chart content supplied by the user
#[derive(Debug, Clone)]
pub enum ChartInput {
    /// Text typed or pasted into the input field
    Text(String),

    /// A dropped or chosen plain-text file
    TextFile { name: String, content: String },

    /// A dropped or chosen image file
    Image {
        name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

impl ChartInput {
    /// Build an input from a file on disk, classified as image or text by
    /// extension.
    pub fn from_path(path: &std::path::Path) -> crate::error::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(match image_mime(&name) {
            Some(mime) => ChartInput::Image {
                name,
                mime: mime.to_string(),
                bytes,
            },
            None => ChartInput::TextFile {
                name,
                content: String::from_utf8_lossy(&bytes).to_string(),
            },
        })
    }
}

fn image_mime(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    if lower.ends_with(".png") {
        Some("image/png")
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        Some("image/jpeg")
    } else if lower.ends_with(".webp") {
        Some("image/webp")
    } else {
        None
    }
}

/// Stages chart content and delegates verification
pub struct UploadController {
    events: EventSink,
}

impl UploadController {
    pub fn new(events: EventSink) -> Self {
        Self { events }
    }

    /// Handle one upload. Returns the verification disposition when a
    /// verification was attempted.
    pub async fn handle_input(
        &self,
        backend: &dyn VerifyBackend,
        coordinator: &VerificationCoordinator,
        store: &mut ChartSlotStore,
        state: &mut ConversationStateMachine,
        input: ChartInput,
        kind: ChartKind,
        life_events: &str,
    ) -> Option<VerifyDisposition> {
        match input {
            ChartInput::Text(text) => {
                store.set_editor_text(kind, text);
                self.verify_staged(backend, coordinator, store, state, kind, life_events)
                    .await
            }
            ChartInput::TextFile { name, content } => {
                self.status(kind, UploadStatus::Reading);
                tracing::debug!("Loaded text file {name} for {kind}");
                store.set_editor_text(kind, content);
                self.verify_staged(backend, coordinator, store, state, kind, life_events)
                    .await
            }
            ChartInput::Image { name, mime, bytes } => {
                self.status(kind, UploadStatus::Ocr);

                let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                store.set_image_ref(kind, format!("data:{mime};base64,{encoded}"));

                match backend.ocr(name.clone(), mime, bytes).await {
                    Ok(OcrOutcome::Recognized { text }) => {
                        store.set_editor_text(kind, text);
                        self.verify_staged(backend, coordinator, store, state, kind, life_events)
                            .await
                    }
                    Ok(OcrOutcome::Failed { partial, reason }) => {
                        // Surface whatever was read, but never auto-verify a
                        // failed recognition.
                        if let Some(partial) = partial {
                            store.set_editor_text(kind, partial);
                            emit(
                                &self.events,
                                WizardEvent::Advisory(format!(
                                    "图片 \"{name}\" 只识别出部分内容，请补全后点击输入框外部再验证。"
                                )),
                            );
                        } else {
                            emit(
                                &self.events,
                                WizardEvent::ErrorBubble(format!(
                                    "抱歉，识别图片 \"{name}\" 失败了：{reason}"
                                )),
                            );
                        }
                        self.status(kind, UploadStatus::Error);
                        None
                    }
                    Err(err) => {
                        tracing::warn!("OCR request failed: {err}");
                        emit(
                            &self.events,
                            WizardEvent::ErrorBubble(format!(
                                "抱歉，识别图片 \"{}\" 失败了：{}",
                                name,
                                err.user_message()
                            )),
                        );
                        self.status(kind, UploadStatus::Error);
                        None
                    }
                }
            }
        }
    }

    /// Blur handler: verify the staged text if it is non-empty and this kind
    /// has not been verified in the active slot yet.
    pub async fn on_blur(
        &self,
        backend: &dyn VerifyBackend,
        coordinator: &VerificationCoordinator,
        store: &mut ChartSlotStore,
        state: &mut ConversationStateMachine,
        kind: ChartKind,
        life_events: &str,
    ) -> Option<VerifyDisposition> {
        self.verify_staged(backend, coordinator, store, state, kind, life_events)
            .await
    }

    /// Paste handler: advisory messaging only, never verifies by itself.
    pub fn on_paste(&self, _kind: ChartKind) {
        emit(
            &self.events,
            WizardEvent::Advisory(
                "检测到粘贴内容，请确保完整后点击输入框外部，我会自动为你验证。".to_string(),
            ),
        );
    }

    async fn verify_staged(
        &self,
        backend: &dyn VerifyBackend,
        coordinator: &VerificationCoordinator,
        store: &mut ChartSlotStore,
        state: &mut ConversationStateMachine,
        kind: ChartKind,
        life_events: &str,
    ) -> Option<VerifyDisposition> {
        let text = store.editor_text(kind).trim().to_string();
        if text.is_empty() || store.current().entry(kind).uploaded {
            return None;
        }
        Some(
            coordinator
                .verify(backend, store, state, &text, kind, life_events)
                .await,
        )
    }

    fn status(&self, kind: ChartKind, status: UploadStatus) {
        emit(&self.events, WizardEvent::UploadStatus { kind, status });
    }
}
