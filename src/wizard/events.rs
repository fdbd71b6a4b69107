//! Wizard Event Stream
//!
//! Components report observable state changes through a channel instead of
//! touching any rendering surface directly. The composition root drains the
//! receiver after each operation and decides what to show.

use super::modeb::ModeBReadiness;
use super::upload::UploadStatus;
use crate::api::{AiVerification, ChartKind};
use tokio::sync::mpsc;

/// Sender half used by all wizard components
pub type EventSink = mpsc::UnboundedSender<WizardEvent>;

/// Create the wizard event channel.
pub fn channel() -> (EventSink, mpsc::UnboundedReceiver<WizardEvent>) {
    mpsc::unbounded_channel()
}

/// Observable state changes emitted by the wizard
#[derive(Debug, Clone)]
pub enum WizardEvent {
    /// Per-kind status indicator change
    UploadStatus { kind: ChartKind, status: UploadStatus },

    /// Guidance message for a conversation-state transition edge
    Guidance(String),

    /// Advisory hint (e.g. after a paste) — informational only
    Advisory(String),

    /// Chat-style error feedback; no state was mutated
    ErrorBubble(String),

    /// System note (upload success, record saved, ...)
    SystemNote(String),

    /// A result panel has new content to project
    PanelUpdated { kind: ChartKind },

    /// Both verification blocks arrived together — combined summary card
    CombinedSummary {
        bazi: AiVerification,
        ziwei: AiVerification,
    },

    /// The active group changed
    GroupSwitched { index: usize },

    /// The true chart was confirmed and the session locked
    ChartLocked,

    /// Mode B button readiness changed
    ModeBReadiness(ModeBReadiness),

    /// The combined record was saved
    Saved {
        record_id: Option<i64>,
        score: Option<f64>,
    },
}

/// Send an event, ignoring a closed receiver (the UI may have detached).
pub(crate) fn emit(sink: &EventSink, event: WizardEvent) {
    let _ = sink.send(event);
}
