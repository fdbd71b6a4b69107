//! Verification Wizard Core
//!
//! The client-side state machine of the true-chart verification flow:
//! per-group chart slots, upload handling with OCR fallback, preview
//! coordination, the conversation phase machine, the true-chart lock, and the
//! optional Mode B full-chart analysis.

pub mod coordinator;
pub mod events;
pub mod lock;
pub mod modeb;
pub mod state;
pub mod store;
pub mod upload;

pub use coordinator::VerificationCoordinator;
pub use events::{EventSink, WizardEvent};
pub use lock::{TrueChartLock, ValidationChoice, ValidationClick};
pub use modeb::{ModeBController, ModeBReadiness};
pub use state::{ConversationState, ConversationStateMachine, StateEvent, Transition};
pub use store::{ChartSlot, ChartSlotStore, RequestToken, SlotEntry, GROUP_COUNT};
pub use upload::{ChartInput, UploadController, UploadStatus};
