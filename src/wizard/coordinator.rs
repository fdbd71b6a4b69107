//! Verification Coordinator
//!
//! The only writer of slot results. Drives the preview call for one chart
//! text, interprets the single vs. dual response shapes, applies the result
//! through the store's request tokens, and advances the conversation state
//! machine. Backend failures are reported as chat-style feedback and never
//! mutate slot state.

use super::events::{emit, EventSink, WizardEvent};
use super::state::{guidance, ConversationStateMachine, StateEvent};
use super::store::ChartSlotStore;
use super::upload::UploadStatus;
use crate::api::{ChartKind, PreviewOutcome, PreviewRequest, SubmitAck, SubmitRequest, VerifyBackend};

/// What a verification attempt did to the store
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyDisposition {
    /// The result was applied
    Committed {
        both_uploaded: bool,
        parsed: Option<serde_json::Value>,
    },
    /// A newer request for the same slot/kind overtook this one
    Stale,
    /// The backend rejected the text or the request failed; nothing mutated
    Failed,
}

/// Coordinates preview and submit calls against the store
pub struct VerificationCoordinator {
    events: EventSink,
    user_id: String,
}

impl VerificationCoordinator {
    pub fn new(events: EventSink, user_id: impl Into<String>) -> Self {
        Self {
            events,
            user_id: user_id.into(),
        }
    }

    /// Verify one chart text through the preview endpoint.
    pub async fn verify(
        &self,
        backend: &dyn VerifyBackend,
        store: &mut ChartSlotStore,
        state: &mut ConversationStateMachine,
        text: &str,
        kind: ChartKind,
        life_events: &str,
    ) -> VerifyDisposition {
        let text = text.trim();
        if text.is_empty() {
            return VerifyDisposition::Failed;
        }

        emit(
            &self.events,
            WizardEvent::UploadStatus {
                kind,
                status: UploadStatus::Verifying,
            },
        );

        let token = store.begin_request(kind);
        let mut request = PreviewRequest::new(text, kind);
        request.user_id = Some(self.user_id.clone());
        request.group_index = Some(token.slot());
        if !life_events.trim().is_empty() {
            request.life_events = Some(life_events.to_string());
        }

        let outcome = match backend.preview(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("Preview failed for {kind}: {err}");
                emit(
                    &self.events,
                    WizardEvent::UploadStatus {
                        kind,
                        status: UploadStatus::Error,
                    },
                );
                emit(
                    &self.events,
                    WizardEvent::ErrorBubble(format!(
                        "抱歉，{}命盘验证失败了。错误信息：{}",
                        kind.display_name(),
                        err.user_message()
                    )),
                );
                return VerifyDisposition::Failed;
            }
        };

        match outcome {
            PreviewOutcome::Single { result, toast } => {
                let parsed = result
                    .parsed
                    .as_ref()
                    .and_then(|p| serde_json::to_value(p).ok());
                if !store.commit_result(token, text.to_string(), result) {
                    return VerifyDisposition::Stale;
                }

                emit(
                    &self.events,
                    WizardEvent::UploadStatus {
                        kind,
                        status: UploadStatus::Success,
                    },
                );
                emit(&self.events, WizardEvent::PanelUpdated { kind });
                emit(
                    &self.events,
                    WizardEvent::SystemNote(toast.unwrap_or_else(|| {
                        format!("{}命盘上传成功！", kind.display_name())
                    })),
                );

                let both = self.advance_state(store, state, token.slot(), kind);
                VerifyDisposition::Committed {
                    both_uploaded: both,
                    parsed,
                }
            }
            PreviewOutcome::Dual {
                result,
                bazi,
                ziwei,
                toast,
            } => {
                let parsed = result
                    .parsed
                    .as_ref()
                    .and_then(|p| serde_json::to_value(p).ok());
                if !store.commit_result(token, text.to_string(), result) {
                    return VerifyDisposition::Stale;
                }

                // Inferred verification is display data for both kinds, but
                // only the kind the user actually supplied counts as uploaded.
                store.merge_verification(token.slot(), ChartKind::Bazi, bazi.clone());
                store.merge_verification(token.slot(), ChartKind::Ziwei, ziwei.clone());

                emit(
                    &self.events,
                    WizardEvent::UploadStatus {
                        kind,
                        status: UploadStatus::Success,
                    },
                );
                emit(&self.events, WizardEvent::PanelUpdated { kind: ChartKind::Bazi });
                emit(&self.events, WizardEvent::PanelUpdated { kind: ChartKind::Ziwei });
                emit(&self.events, WizardEvent::CombinedSummary { bazi, ziwei });
                if let Some(toast) = toast {
                    emit(&self.events, WizardEvent::SystemNote(toast));
                }

                let both = self.advance_state(store, state, token.slot(), kind);
                VerifyDisposition::Committed {
                    both_uploaded: both,
                    parsed,
                }
            }
        }
    }

    /// Advance the session state machine for a committed verification.
    /// Responses landing in a non-active slot update that slot's data but do
    /// not move the session phase. Returns whether the slot now has both
    /// charts uploaded.
    fn advance_state(
        &self,
        store: &ChartSlotStore,
        state: &mut ConversationStateMachine,
        slot: usize,
        kind: ChartKind,
    ) -> bool {
        let Some(chart_slot) = store.slot(slot) else {
            return false;
        };
        let bazi_uploaded = chart_slot.entry(ChartKind::Bazi).uploaded;
        let ziwei_uploaded = chart_slot.entry(ChartKind::Ziwei).uploaded;

        if slot == store.active_index()
            && let Some(transition) = state.apply(StateEvent::ChartVerified {
                kind,
                bazi_uploaded,
                ziwei_uploaded,
            })
            && let Some(message) = guidance(transition)
        {
            emit(&self.events, WizardEvent::Guidance(message.to_string()));
        }

        bazi_uploaded && ziwei_uploaded
    }

    /// Submit the combined record once the user confirms the save.
    ///
    /// Preconditions are checked locally: outside `ReadyToSave` the user gets
    /// a guiding message naming the missing chart and no network call is made.
    pub async fn save(
        &self,
        backend: &dyn VerifyBackend,
        store: &ChartSlotStore,
        state: &mut ConversationStateMachine,
    ) -> Option<SubmitAck> {
        use super::state::ConversationState;

        if state.state() != ConversationState::ReadyToSave {
            let slot = store.current();
            let message = if !slot.entry(ChartKind::Bazi).uploaded {
                "抱歉，你还没有上传八字命盘呢。请先上传左侧的八字命盘。"
            } else if !slot.entry(ChartKind::Ziwei).uploaded {
                "抱歉，你还没有上传紫微斗数命盘呢。请先上传右侧的紫微命盘。"
            } else if state.state() == ConversationState::Saved {
                "这组命盘已经保存过了。你可以切换到其他组继续验证。"
            } else {
                "系统状态异常，请重试。"
            };
            emit(&self.events, WizardEvent::ErrorBubble(message.to_string()));
            return None;
        }

        emit(
            &self.events,
            WizardEvent::SystemNote("正在保存你的真命盘验证记录...".to_string()),
        );

        let slot = store.current();
        let bazi = slot.entry(ChartKind::Bazi);
        let ziwei = slot.entry(ChartKind::Ziwei);

        let combined_text = format!(
            "【八字命盘】\n{}\n\n【紫微斗数命盘】\n{}",
            store.editor_text(ChartKind::Bazi),
            store.editor_text(ChartKind::Ziwei)
        );

        let bazi_score = bazi.result.as_ref().and_then(|r| r.score).unwrap_or(0.0);
        let ziwei_score = ziwei.result.as_ref().and_then(|r| r.score).unwrap_or(0.0);
        let notes = format!(
            "八字评分: {:.1}%, 紫微评分: {:.1}%",
            bazi_score * 100.0,
            ziwei_score * 100.0
        );

        let parsed_of = |entry: &super::store::SlotEntry| entry.result.as_ref()?.parsed.clone();
        let name = parsed_of(bazi)
            .and_then(|p| p.name)
            .or_else(|| parsed_of(ziwei).and_then(|p| p.name));
        let gender = parsed_of(bazi)
            .and_then(|p| p.gender)
            .or_else(|| parsed_of(ziwei).and_then(|p| p.gender));

        let request = SubmitRequest {
            user_id: self.user_id.clone(),
            raw_text: combined_text,
            wizard: serde_json::json!({}),
            notes,
            manual: serde_json::json!({ "name": name, "gender": gender }),
        };

        match backend.submit(request).await {
            Ok(ack) => {
                state.apply(StateEvent::SaveConfirmed);
                emit(
                    &self.events,
                    WizardEvent::Saved {
                        record_id: ack.record_id,
                        score: ack.score,
                    },
                );
                let score_text = ack
                    .score
                    .map(|s| format!("，综合评分：{:.1}%", s * 100.0))
                    .unwrap_or_default();
                emit(
                    &self.events,
                    WizardEvent::SystemNote(format!(
                        "保存成功！记录ID：{}{}。你可以随时回来查看你的真命盘记录。",
                        ack.record_id
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        score_text
                    )),
                );
                Some(ack)
            }
            Err(err) => {
                tracing::warn!("Submit failed: {err}");
                emit(
                    &self.events,
                    WizardEvent::ErrorBubble(format!(
                        "抱歉，保存时出错了：{}。请稍后重试。",
                        err.user_message()
                    )),
                );
                None
            }
        }
    }
}
