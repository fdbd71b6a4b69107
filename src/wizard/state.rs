//! Conversation State Machine
//!
//! Tracks the wizard phase across uploads and the final save. Transitions are
//! monotonic forward; only an explicit group switch resets. Guidance text is
//! a function of the transition edge taken, never of the resulting state, so
//! re-entering a state through a different path cannot re-fire a message.

use crate::api::ChartKind;

/// Wizard phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// Waiting for the Bazi chart (initial)
    WaitingBazi,
    /// Bazi verified, waiting for the Ziwei chart
    WaitingZiwei,
    /// Both charts verified, waiting for the user's save confirmation
    ReadyToSave,
    /// Record saved
    Saved,
}

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// A chart of this kind was successfully verified; the flags carry the
    /// slot's upload completeness after the verification.
    ChartVerified {
        kind: ChartKind,
        bazi_uploaded: bool,
        ziwei_uploaded: bool,
    },
    /// The user confirmed the save (or the questionnaire completed)
    SaveConfirmed,
    /// The active group changed
    GroupSwitched,
}

/// Edge actually taken by [`ConversationStateMachine::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// WaitingBazi → WaitingZiwei
    BaziAccepted,
    /// WaitingZiwei → ReadyToSave
    ZiweiAccepted,
    /// Completion arrived out of order; jumped straight to ReadyToSave
    BothAccepted,
    /// ReadyToSave → Saved
    Saved,
    /// Reset to WaitingBazi on group switch
    Reset,
}

/// Guidance message for a transition edge. `None` means the edge is silent.
pub fn guidance(transition: Transition) -> Option<&'static str> {
    match transition {
        Transition::BaziAccepted => Some(
            "很好！八字命盘已经验证完成。接下来，请上传你的紫微斗数命盘。",
        ),
        Transition::ZiweiAccepted | Transition::BothAccepted => Some(
            "太棒了！两份命盘都已验证完成。请确认以上信息无误后，在聊天框中输入\"确认保存\"，我会帮你保存到数据库。",
        ),
        Transition::Saved | Transition::Reset => None,
    }
}

/// The wizard phase machine
#[derive(Debug, Clone)]
pub struct ConversationStateMachine {
    state: ConversationState,
}

impl ConversationStateMachine {
    pub fn new() -> Self {
        Self {
            state: ConversationState::WaitingBazi,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Apply an event; returns the edge taken, or `None` when the event does
    /// not move the machine (e.g. a re-verification of an already-accepted
    /// chart, or a ziwei upload while still waiting for the bazi chart).
    pub fn apply(&mut self, event: StateEvent) -> Option<Transition> {
        use ConversationState::*;

        let (next, transition) = match (self.state, event) {
            (
                WaitingBazi,
                StateEvent::ChartVerified {
                    kind: ChartKind::Bazi,
                    ziwei_uploaded,
                    ..
                },
            ) => {
                if ziwei_uploaded {
                    // The ziwei chart was verified first; this bazi upload
                    // completes the pair.
                    (ReadyToSave, Transition::BothAccepted)
                } else {
                    (WaitingZiwei, Transition::BaziAccepted)
                }
            }
            (
                WaitingZiwei,
                StateEvent::ChartVerified {
                    kind: ChartKind::Ziwei,
                    ..
                },
            ) => (ReadyToSave, Transition::ZiweiAccepted),
            (ReadyToSave, StateEvent::SaveConfirmed) => (Saved, Transition::Saved),
            (_, StateEvent::GroupSwitched) => (WaitingBazi, Transition::Reset),
            _ => return None,
        };

        self.state = next;
        Some(transition)
    }
}

impl Default for ConversationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
