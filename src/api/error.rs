//! API Error Types
//!
//! One error enum for every backend endpoint. The three-way taxonomy the rest
//! of the crate relies on: transport failures, non-2xx statuses without a
//! usable body, and application-level rejections (`ok: false`).

use thiserror::Error;

/// Errors returned by the verification backend client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure (connect, timeout, TLS, body read)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response with no parseable rejection body
    #[error("server returned status {status}")]
    Status { status: u16 },

    /// Application-level rejection: `ok: false` with a human-readable reason
    #[error("{0}")]
    Rejected(String),

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// True for application-level rejections, which carry a reason meant for
    /// direct display to the user.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected(_))
    }

    /// User-facing message for chat-style error feedback.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected(reason) => reason.clone(),
            ApiError::Transport(_) => "网络请求失败，请稍后重试".to_string(),
            ApiError::Status { status } => format!("服务暂不可用（{status}），请稍后重试"),
            ApiError::Decode(_) => "服务返回了无法识别的数据，请稍后重试".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
