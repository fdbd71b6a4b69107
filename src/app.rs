//! Wizard Composition Root
//!
//! Owns every component and wires them together: the store, the conversation
//! state machine, the chat session, the lock, and the Mode B controller. All
//! state access goes through this object; nothing is resolved ambiently.
//!
//! Chat input routing mirrors the page: affirm/deny click data goes to the
//! validation log, save phrases drive the submit flow, confirm/lock phrases
//! drive the true-chart confirmation, and everything else is a normal chat
//! round trip.

use crate::api::{ChartKind, ChatReply, FullChartAck, SopTemplate, VerifyBackend};
use crate::chat::{strip_validation_markers, ChatContext, ChatSession, EntryKind};
use crate::wizard::coordinator::VerifyDisposition;
use crate::wizard::events::{self, emit, EventSink, WizardEvent};
use crate::wizard::lock::ConfirmOutcome;
use crate::wizard::{
    ChartInput, ChartSlotStore, ConversationState, ConversationStateMachine, ModeBController,
    ModeBReadiness, StateEvent, TrueChartLock, UploadController, ValidationClick,
    VerificationCoordinator,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// The assembled verification wizard
pub struct WizardApp {
    backend: Arc<dyn VerifyBackend>,
    events: EventSink,
    rx: UnboundedReceiver<WizardEvent>,
    pending: Vec<WizardEvent>,

    store: ChartSlotStore,
    state: ConversationStateMachine,
    chat: ChatSession,
    lock: TrueChartLock,
    modeb: ModeBController,
    upload: UploadController,
    coordinator: VerificationCoordinator,

    user_id: String,
    life_events: String,
    last_parsed: serde_json::Value,
    current_chart_id: Option<i64>,
}

impl WizardApp {
    pub fn new(backend: Arc<dyn VerifyBackend>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let (events, rx) = events::channel();
        Self {
            backend,
            rx,
            pending: Vec::new(),
            store: ChartSlotStore::new(),
            state: ConversationStateMachine::new(),
            chat: ChatSession::new(),
            lock: TrueChartLock::new(events.clone()),
            modeb: ModeBController::new(events.clone()),
            upload: UploadController::new(events.clone()),
            coordinator: VerificationCoordinator::new(events.clone(), user_id.clone()),
            events,
            user_id,
            life_events: String::new(),
            last_parsed: serde_json::json!({}),
            current_chart_id: None,
        }
    }

    // -- read projections -------------------------------------------------

    pub fn store(&self) -> &ChartSlotStore {
        &self.store
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn conversation_state(&self) -> ConversationState {
        self.state.state()
    }

    pub fn locked(&self) -> bool {
        self.lock.locked()
    }

    pub fn modeb_readiness(&self) -> ModeBReadiness {
        self.modeb.readiness()
    }

    pub fn current_chart_id(&self) -> Option<i64> {
        self.current_chart_id
    }

    /// Drain the events emitted since the last call. Chat-style feedback has
    /// already been routed into the transcript by then.
    pub fn take_events(&mut self) -> Vec<WizardEvent> {
        self.pump();
        std::mem::take(&mut self.pending)
    }

    // -- input surface ----------------------------------------------------

    /// Stage text into an editor field (typing).
    pub fn on_set_text(&mut self, kind: ChartKind, text: impl Into<String>) {
        self.store.set_editor_text(kind, text);
    }

    /// Paste into an editor field: advisory only.
    pub fn on_paste(&mut self, kind: ChartKind) {
        self.upload.on_paste(kind);
        self.pump();
    }

    /// The editor field lost focus: verify staged text if pending.
    pub async fn on_blur(&mut self, kind: ChartKind) {
        let disposition = self
            .upload
            .on_blur(
                self.backend.as_ref(),
                &self.coordinator,
                &mut self.store,
                &mut self.state,
                kind,
                &self.life_events,
            )
            .await;
        self.post_verify(disposition).await;
    }

    /// A file or image was supplied for a chart kind.
    pub async fn on_upload(&mut self, input: ChartInput, kind: ChartKind) {
        let disposition = self
            .upload
            .handle_input(
                self.backend.as_ref(),
                &self.coordinator,
                &mut self.store,
                &mut self.state,
                input,
                kind,
                &self.life_events,
            )
            .await;
        self.post_verify(disposition).await;
    }

    /// Switch the active group. Out-of-range indices are a silent no-op.
    pub fn on_switch(&mut self, index: usize) -> bool {
        if !self.store.switch_to(index) {
            return false;
        }

        self.state.apply(StateEvent::GroupSwitched);
        self.lock.reset();
        self.chat.reset_questionnaire();
        self.modeb.sync_activation(self.store.current());

        emit(&self.events, WizardEvent::GroupSwitched { index });
        for kind in ChartKind::ALL {
            let status = if self.store.current().entry(kind).uploaded {
                crate::wizard::UploadStatus::Success
            } else {
                crate::wizard::UploadStatus::Idle
            };
            emit(&self.events, WizardEvent::UploadStatus { kind, status });
        }
        self.pump();
        true
    }

    /// One chat input from the user, routed by content.
    pub async fn on_chat(&mut self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }

        if let Some(click) = ValidationClick::parse(message) {
            self.chat_push_user(message);
            self.on_validation_click(click).await;
        } else if message.contains("确认保存") || message.contains("保存") {
            self.chat_push_user(message);
            self.save().await;
        } else if message.contains("确认") || message.contains("锁定") {
            self.chat_push_user(message);
            self.confirm_lock().await;
        } else {
            let ctx = self.chat_context();
            let reply = self.chat.send(self.backend.as_ref(), &ctx, message).await;
            if let Some(reply) = reply {
                // A completed turn extends the life-events narrative the
                // verification calls build on.
                if !self.life_events.is_empty() {
                    self.life_events.push('\n');
                }
                self.life_events.push_str(message);
                self.handle_reply(&reply);
            }
        }
        self.pump();
    }

    /// Record an affirm/deny click against the validation log.
    pub async fn on_validation_click(&mut self, click: ValidationClick) {
        let statement = self.statement_for(&click);
        self.lock
            .record_validation(
                self.backend.as_ref(),
                &mut self.store,
                &self.user_id,
                self.current_chart_id,
                &click,
                &statement,
            )
            .await;
        self.pump();
    }

    /// Confirm the true chart and, on success, trigger the assistant
    /// summary-and-questioning turn.
    pub async fn confirm_lock(&mut self) {
        let was_locked = self.lock.locked();
        let outcome = self
            .lock
            .confirm(
                self.backend.as_ref(),
                &self.store,
                &self.user_id,
                self.current_chart_id,
            )
            .await;

        if outcome == ConfirmOutcome::Locked && !was_locked {
            let ctx = self.chat_context();
            let reply = self.chat.send_lock_summary(self.backend.as_ref(), &ctx).await;
            if let Some(reply) = reply {
                self.handle_reply(&reply);
            }
        }
        self.pump();
    }

    /// Submit the combined record after the user confirmed the save.
    pub async fn save(&mut self) {
        let ack = self
            .coordinator
            .save(self.backend.as_ref(), &self.store, &mut self.state)
            .await;
        if let Some(ack) = ack
            && ack.record_id.is_some()
        {
            self.current_chart_id = ack.record_id;
        }
        self.pump();
    }

    // -- Mode B -----------------------------------------------------------

    pub fn modeb_select_template(&mut self, template_id: impl Into<String>) {
        self.modeb.select_template(template_id);
        self.pump();
    }

    pub async fn modeb_templates(&mut self) -> Vec<SopTemplate> {
        let templates = self.modeb.list_templates(self.backend.as_ref()).await;
        self.pump();
        templates
    }

    pub async fn on_modeb_run(&mut self) -> Option<FullChartAck> {
        let ack = self
            .modeb
            .run(self.backend.as_ref(), self.store.current(), &self.user_id)
            .await;
        self.pump();
        ack
    }

    pub async fn modeb_upload_template(&mut self, file_name: String, bytes: Vec<u8>) -> bool {
        let ok = self
            .modeb
            .upload_template(self.backend.as_ref(), file_name, bytes)
            .await;
        self.pump();
        ok
    }

    // -- internals --------------------------------------------------------

    async fn post_verify(&mut self, disposition: Option<VerifyDisposition>) {
        if let Some(VerifyDisposition::Committed {
            both_uploaded,
            parsed,
        }) = disposition
        {
            if let Some(parsed) = parsed {
                self.last_parsed = parsed;
            }
            self.modeb.sync_activation(self.store.current());

            if both_uploaded && !self.chat.questionnaire_sent() {
                let ctx = self.chat_context();
                let reply = self
                    .chat
                    .send_questionnaire_trigger(self.backend.as_ref(), &ctx)
                    .await;
                if let Some(reply) = reply {
                    self.handle_reply(&reply);
                }
            }
        }
        self.pump();
    }

    /// Merge a chat-delivered dual verification into both result panels.
    fn handle_reply(&mut self, reply: &ChatReply) {
        let Some(dual) = &reply.verification else {
            return;
        };
        let slot = self.store.active_index();
        self.store
            .merge_verification(slot, ChartKind::Bazi, dual.bazi.clone());
        self.store
            .merge_verification(slot, ChartKind::Ziwei, dual.ziwei.clone());
        for kind in ChartKind::ALL {
            emit(&self.events, WizardEvent::PanelUpdated { kind });
        }
        emit(
            &self.events,
            WizardEvent::CombinedSummary {
                bazi: dual.bazi.clone(),
                ziwei: dual.ziwei.clone(),
            },
        );
    }

    /// Statement text for a validation click: the most recent assistant
    /// message carrying this statement id, markers stripped.
    fn statement_for(&self, click: &ValidationClick) -> String {
        let needle = format!("#yes-{}", click.statement_id);
        let needle_no = format!("#no-{}", click.statement_id);
        self.chat
            .transcript()
            .entries()
            .iter()
            .rev()
            .find_map(|entry| match &entry.kind {
                EntryKind::Assistant { content, .. }
                    if content.contains(&needle) || content.contains(&needle_no) =>
                {
                    Some(strip_validation_markers(content))
                }
                _ => None,
            })
            .unwrap_or_else(|| "命理断语".to_string())
    }

    fn chat_push_user(&mut self, message: &str) {
        // Command phrases still appear as user bubbles, like the page did.
        self.chat.push_user_local(message);
    }

    fn chat_context(&self) -> ChatContext {
        ChatContext {
            user_id: self.user_id.clone(),
            chart_uploaded: self.store.current().both_uploaded(),
            group_index: self.store.active_index(),
            life_events: self.life_events.clone(),
            parsed_chart: self.last_parsed.clone(),
            chart_locked: self.lock.locked(),
        }
    }

    /// Drain component events; chat-style feedback also lands in the
    /// transcript so the conversation pane shows one coherent stream.
    fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match &event {
                WizardEvent::Guidance(text)
                | WizardEvent::Advisory(text)
                | WizardEvent::ErrorBubble(text)
                | WizardEvent::SystemNote(text) => {
                    self.chat.push_note(text.clone());
                }
                _ => {}
            }
            self.pending.push(event);
        }
    }
}
