//! Truechart - Chat-Guided Birth-Chart Verification Wizard
//!
//! A headless engine for the true-chart verification flow: users supply two
//! chart texts (Bazi and Ziwei) per candidate birth time, an AI companion
//! cross-examines life events against them, and the session records a
//! confidence level per chart.
//!
//! ## Features
//!
//! - **Three candidate groups:** parallel slots with lossless switching
//! - **Upload pipeline:** text, text files, or images with OCR fallback
//! - **Typed backend client:** every endpoint decoded once into tagged outcomes
//! - **Conversation phases:** waiting_bazi → waiting_ziwei → ready_to_save → saved
//! - **True-chart lock:** one-way gate enabling 准/不准 statement validation
//! - **Mode B:** optional full-chart comparison with SOP templates
//!
//! ## Quick Start
//!
//! ```bash
//! # Interactive session
//! truechart session --user-id 42
//!
//! # Initialize configuration
//! truechart init
//! ```

pub mod api;
pub mod app;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod wizard;

// Re-export commonly used types
pub use app::WizardApp;
pub use error::{Result, TruechartError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
