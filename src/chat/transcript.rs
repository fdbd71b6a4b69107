//! Chat Transcript
//!
//! Ordered display entries for the conversation pane. Entries carry a unique
//! id so the transient thinking placeholder is removed by exact identity, no
//! matter how many entries were appended while a response was in flight.
//!
//! Assistant content may embed affirm/deny markers of the form
//! `[✅ 准](#yes-ID)` / `[❌ 不准](#no-ID)`. Rendering splits them into
//! interactive segments only when the session is locked; the same content
//! renders as plain text before the lock.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Stable identity of one transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Entry payload
#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    /// A user message bubble
    User(String),

    /// An assistant message bubble
    Assistant {
        ai_name: Option<String>,
        content: String,
    },

    /// A system note (guidance, upload feedback, errors)
    Note(String),

    /// Transient placeholder while a response is in flight
    Thinking,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub at: DateTime<Utc>,
    pub kind: EntryKind,
}

impl TranscriptEntry {
    fn new(kind: EntryKind) -> Self {
        Self {
            id: EntryId::new(),
            at: Utc::now(),
            kind,
        }
    }
}

/// Append-only display log with identity-based removal
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> EntryId {
        self.push(EntryKind::User(content.into()))
    }

    pub fn push_assistant(
        &mut self,
        ai_name: Option<String>,
        content: impl Into<String>,
    ) -> EntryId {
        self.push(EntryKind::Assistant {
            ai_name,
            content: content.into(),
        })
    }

    pub fn push_note(&mut self, content: impl Into<String>) -> EntryId {
        self.push(EntryKind::Note(content.into()))
    }

    pub fn push_thinking(&mut self) -> EntryId {
        self.push(EntryKind::Thinking)
    }

    fn push(&mut self, kind: EntryKind) -> EntryId {
        let entry = TranscriptEntry::new(kind);
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Remove the entry with this exact id. Position-independent: entries
    /// appended after it are untouched.
    pub fn remove(&mut self, id: EntryId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }
}

/// One rendered piece of an assistant message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSegment {
    Text(String),
    /// 准 button
    Affirm { statement_id: String },
    /// 不准 button
    Deny { statement_id: String },
}

static VALIDATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[✅ 准\]\(#yes-([^)]+)\)|\[❌ 不准\]\(#no-([^)]+)\)")
        .expect("validation marker regex is valid")
});

/// Render assistant content for display. Before the lock the content is one
/// plain text segment, markers included verbatim; after the lock the markers
/// become interactive segments. Content is never re-fetched, only re-rendered.
pub fn render_assistant_content(content: &str, locked: bool) -> Vec<MessageSegment> {
    if !locked {
        return vec![MessageSegment::Text(content.to_string())];
    }

    let mut segments = Vec::new();
    let mut cursor = 0;
    for capture in VALIDATION_MARKER.captures_iter(content) {
        let Some(matched) = capture.get(0) else {
            continue;
        };
        if matched.start() > cursor {
            segments.push(MessageSegment::Text(
                content[cursor..matched.start()].to_string(),
            ));
        }
        if let Some(id) = capture.get(1) {
            segments.push(MessageSegment::Affirm {
                statement_id: id.as_str().to_string(),
            });
        } else if let Some(id) = capture.get(2) {
            segments.push(MessageSegment::Deny {
                statement_id: id.as_str().to_string(),
            });
        }
        cursor = matched.end();
    }
    if cursor < content.len() {
        segments.push(MessageSegment::Text(content[cursor..].to_string()));
    }
    if segments.is_empty() {
        segments.push(MessageSegment::Text(String::new()));
    }
    segments
}

/// Assistant content with validation markers stripped, for logging the
/// statement text alongside a click.
pub fn strip_validation_markers(content: &str) -> String {
    VALIDATION_MARKER.replace_all(content, "").trim().to_string()
}
