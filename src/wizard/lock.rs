//! True Chart Lock
//!
//! One-way gate between exploration and statement validation. Once both
//! charts are verified and the user confirms, the backend acknowledges and
//! the session locks: assistant messages with embedded affirm/deny markers
//! start rendering as interactive controls, and each click is posted to the
//! validation log. There is no unlock; only a group switch discards the lock
//! together with the rest of the session context.

use super::events::{emit, EventSink, WizardEvent};
use super::store::ChartSlotStore;
use crate::api::{ChartKind, ConfirmTrueChartRequest, ValidationLogRequest, VerifyBackend};

/// 准 / 不准
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationChoice {
    Accurate,
    Inaccurate,
}

impl ValidationChoice {
    fn prefix(&self) -> &'static str {
        match self {
            ValidationChoice::Accurate => "#yes-",
            ValidationChoice::Inaccurate => "#no-",
        }
    }
}

/// A parsed affirm/deny click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationClick {
    pub statement_id: String,
    pub choice: ValidationChoice,
}

impl ValidationClick {
    /// Parse click data of the form `#yes-<id>` / `#no-<id>`.
    pub fn parse(click_data: &str) -> Option<Self> {
        for choice in [ValidationChoice::Accurate, ValidationChoice::Inaccurate] {
            if let Some(id) = click_data.strip_prefix(choice.prefix())
                && !id.is_empty()
            {
                return Some(Self {
                    statement_id: id.to_string(),
                    choice,
                });
            }
        }
        None
    }

    /// Wire form sent to the validation log endpoint.
    pub fn click_data(&self) -> String {
        format!("{}{}", self.choice.prefix(), self.statement_id)
    }
}

/// Outcome of a confirmation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Locked; the caller should trigger the assistant summary turn
    Locked,
    /// Both charts were not uploaded; nothing was sent
    PreconditionFailed,
    /// The backend rejected or the request failed
    Failed,
}

/// Session lock state and the validation round trips it gates
#[derive(Debug)]
pub struct TrueChartLock {
    events: EventSink,
    locked: bool,
}

impl TrueChartLock {
    pub fn new(events: EventSink) -> Self {
        Self {
            events,
            locked: false,
        }
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Discard the lock on group switch.
    pub fn reset(&mut self) {
        self.locked = false;
    }

    /// Confirm the true chart. Checks the upload precondition locally before
    /// any network call; the lock is set only on backend acknowledgment.
    pub async fn confirm(
        &mut self,
        backend: &dyn VerifyBackend,
        store: &ChartSlotStore,
        user_id: &str,
        chart_id: Option<i64>,
    ) -> ConfirmOutcome {
        if !store.current().both_uploaded() {
            emit(
                &self.events,
                WizardEvent::ErrorBubble("请先上传八字命盘和紫微命盘".to_string()),
            );
            return ConfirmOutcome::PreconditionFailed;
        }

        if self.locked {
            // Already confirmed; the gate only moves one way.
            return ConfirmOutcome::Locked;
        }

        let request = ConfirmTrueChartRequest {
            user_id: user_id.to_string(),
            chart_id,
        };

        match backend.confirm_true_chart(request).await {
            Ok(ack) => {
                self.locked = true;
                emit(&self.events, WizardEvent::ChartLocked);
                emit(
                    &self.events,
                    WizardEvent::SystemNote(ack.toast.unwrap_or_else(|| {
                        "真命盘已确认！现在可以对AI的断语进行验证了。".to_string()
                    })),
                );
                ConfirmOutcome::Locked
            }
            Err(err) => {
                tracing::warn!("True chart confirmation failed: {err}");
                emit(
                    &self.events,
                    WizardEvent::ErrorBubble(format!(
                        "确认真命盘失败：{}",
                        err.user_message()
                    )),
                );
                ConfirmOutcome::Failed
            }
        }
    }

    /// Post one statement validation click. A fresh AI verification in the
    /// response is appended to the Ziwei panel, never replacing prior blocks.
    pub async fn record_validation(
        &self,
        backend: &dyn VerifyBackend,
        store: &mut ChartSlotStore,
        user_id: &str,
        chart_id: Option<i64>,
        click: &ValidationClick,
        ai_statement: &str,
    ) {
        if !self.locked {
            emit(
                &self.events,
                WizardEvent::ErrorBubble("请先确认真命盘后再验证断语".to_string()),
            );
            return;
        }

        let request = ValidationLogRequest {
            user_id: user_id.to_string(),
            chart_id,
            click_data: click.click_data(),
            ai_statement: ai_statement.to_string(),
            source_ai: "Primary".to_string(),
        };

        match backend.validation_log(request).await {
            Ok(ack) => {
                let verified = ack.ai_verification.is_some();
                if let Some(verification) = ack.ai_verification {
                    store.push_validation(ChartKind::Ziwei, verification);
                    emit(
                        &self.events,
                        WizardEvent::PanelUpdated {
                            kind: ChartKind::Ziwei,
                        },
                    );
                }
                emit(
                    &self.events,
                    WizardEvent::SystemNote(if verified {
                        "验证结果已记录 并完成AI验证".to_string()
                    } else {
                        "验证结果已记录".to_string()
                    }),
                );
            }
            Err(err) => {
                tracing::warn!("Validation log failed: {err}");
                emit(
                    &self.events,
                    WizardEvent::ErrorBubble(format!(
                        "记录验证结果失败：{}",
                        err.user_message()
                    )),
                );
            }
        }
    }
}
