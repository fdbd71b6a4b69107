//! Chat Session
//!
//! Maintains the bounded conversation history and the display transcript,
//! runs round trips against the chat endpoint, and carries the two
//! programmatic prompts: the questionnaire trigger sentinel (fired once both
//! charts are uploaded, recorded with a system role) and the post-lock
//! summary prompt (never shown as a user bubble).

pub mod transcript;

pub use transcript::{
    render_assistant_content, strip_validation_markers, EntryId, EntryKind, MessageSegment,
    Transcript, TranscriptEntry,
};

use crate::api::{ChatReply, ChatRequest, ChatTurn, VerifyBackend};

/// Most recent history entries kept and sent with each chat request
pub const MAX_HISTORY: usize = 20;

/// Reserved non-user-facing trigger requesting the structured life-event
/// questionnaire. Matched verbatim by the backend.
pub const QUESTIONNAIRE_TRIGGER: &str = "__SYSTEM_TRIGGER_START_QUESTIONNAIRE__";

/// Prompt sent after the true chart is confirmed
const LOCK_SUMMARY_PROMPT: &str = "请总结我的命盘特征并提出验证性问题";

/// Per-request context assembled by the composition root
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub user_id: String,
    pub chart_uploaded: bool,
    pub group_index: usize,
    pub life_events: String,
    pub parsed_chart: serde_json::Value,
    pub chart_locked: bool,
}

impl ChatContext {
    fn request(&self, message: &str, history: Vec<ChatTurn>) -> ChatRequest {
        ChatRequest {
            user_id: self.user_id.clone(),
            message: message.to_string(),
            history,
            chart_uploaded: self.chart_uploaded,
            group_index: self.group_index,
            life_events: self.life_events.clone(),
            parsed_chart: self.parsed_chart.clone(),
            chart_locked: Some(self.chart_locked),
        }
    }
}

/// Conversation state: bounded history plus the display transcript
#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<ChatTurn>,
    transcript: Transcript,
    questionnaire_sent: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn questionnaire_sent(&self) -> bool {
        self.questionnaire_sent
    }

    /// Append a system note to the transcript (guidance, upload feedback,
    /// error bubbles). Notes never enter the history.
    pub fn push_note(&mut self, text: impl Into<String>) -> EntryId {
        self.transcript.push_note(text)
    }

    /// Append a user bubble without a chat round trip. Command phrases
    /// (save, confirm, validation clicks) are shown and recorded but handled
    /// locally instead of being sent to the assistant.
    pub fn push_user_local(&mut self, text: impl Into<String>) -> EntryId {
        let text = text.into();
        self.push_history(ChatTurn::user(text.clone()));
        self.transcript.push_user(text)
    }

    /// A new slot session begins: the questionnaire may fire again. History
    /// and transcript are kept across group switches.
    pub fn reset_questionnaire(&mut self) {
        self.questionnaire_sent = false;
    }

    /// Send a user message. The message is appended to the transcript and
    /// history immediately; a thinking placeholder is shown until the
    /// response arrives and is removed by identity.
    pub async fn send(
        &mut self,
        backend: &dyn VerifyBackend,
        ctx: &ChatContext,
        user_text: &str,
    ) -> Option<ChatReply> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return None;
        }

        self.transcript.push_user(user_text);
        self.push_history(ChatTurn::user(user_text));

        let reply = self.round_trip(backend, ctx, user_text).await?;
        self.accept_reply(&reply);
        Some(reply)
    }

    /// Fire the questionnaire trigger sentinel. At most once per slot
    /// session; the round trip is recorded with a system role and no user
    /// bubble appears in the transcript.
    pub async fn send_questionnaire_trigger(
        &mut self,
        backend: &dyn VerifyBackend,
        ctx: &ChatContext,
    ) -> Option<ChatReply> {
        if self.questionnaire_sent {
            return None;
        }
        self.questionnaire_sent = true;

        self.push_history(ChatTurn::system(QUESTIONNAIRE_TRIGGER));

        let reply = self.round_trip(backend, ctx, QUESTIONNAIRE_TRIGGER).await?;
        self.accept_reply(&reply);
        Some(reply)
    }

    /// Ask the assistant for the post-lock summary-and-questioning turn. The
    /// prompt is not shown and only the assistant reply enters the history.
    pub async fn send_lock_summary(
        &mut self,
        backend: &dyn VerifyBackend,
        ctx: &ChatContext,
    ) -> Option<ChatReply> {
        let reply = self.round_trip(backend, ctx, LOCK_SUMMARY_PROMPT).await?;
        self.accept_reply(&reply);
        Some(reply)
    }

    /// One request against the chat endpoint with placeholder handling.
    /// Failures surface as a visible transcript note; the failed turn is not
    /// recorded in history.
    async fn round_trip(
        &mut self,
        backend: &dyn VerifyBackend,
        ctx: &ChatContext,
        message: &str,
    ) -> Option<ChatReply> {
        let thinking = self.transcript.push_thinking();
        let request = ctx.request(message, self.history.clone());

        let result = backend.chat(request).await;
        self.transcript.remove(thinking);

        match result {
            Ok(reply) => Some(reply),
            Err(err) => {
                tracing::warn!("Chat round trip failed: {err}");
                self.transcript
                    .push_note(format!("AI回复失败：{}", err.user_message()));
                None
            }
        }
    }

    fn accept_reply(&mut self, reply: &ChatReply) {
        self.transcript
            .push_assistant(reply.ai_name.clone(), reply.message.clone());
        self.push_history(ChatTurn::assistant(reply.message.clone()));
    }

    fn push_history(&mut self, turn: ChatTurn) {
        self.history.push(turn);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Role;

    #[test]
    fn test_history_is_bounded_to_most_recent() {
        let mut session = ChatSession::new();
        for i in 0..30 {
            session.push_history(ChatTurn::user(format!("message {i}")));
        }
        assert_eq!(session.history().len(), MAX_HISTORY);
        assert_eq!(session.history()[0].content, "message 10");
        assert_eq!(
            session.history()[MAX_HISTORY - 1].content,
            "message 29"
        );
    }

    #[test]
    fn test_history_keeps_original_order() {
        let mut session = ChatSession::new();
        for i in 0..25 {
            if i % 2 == 0 {
                session.push_history(ChatTurn::user(format!("u{i}")));
            } else {
                session.push_history(ChatTurn::assistant(format!("a{i}")));
            }
        }
        let contents: Vec<&str> = session
            .history()
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        let mut sorted = contents.clone();
        sorted.sort_by_key(|c| {
            c[1..].parse::<u32>().unwrap_or(0)
        });
        assert_eq!(contents, sorted);
    }

    #[test]
    fn test_notes_do_not_enter_history() {
        let mut session = ChatSession::new();
        session.push_note("八字命盘上传成功！");
        session.push_note("很好！接下来请上传紫微命盘。");
        assert!(session.history().is_empty());
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_questionnaire_flag_resets() {
        let mut session = ChatSession::new();
        session.questionnaire_sent = true;
        session.reset_questionnaire();
        assert!(!session.questionnaire_sent());
    }

    #[test]
    fn test_system_turn_role() {
        let mut session = ChatSession::new();
        session.push_history(ChatTurn::system(QUESTIONNAIRE_TRIGGER));
        assert_eq!(session.history()[0].role, Role::System);
    }
}
