//! Telegram Broadcast Controller Library
//!
//! This library provides tools to:
//! - Register Telegram accounts and keep one session file per account
//! - Maintain per-account broadcast settings (targets, text, daily trigger)
//! - Schedule one daily send job per account, kept in sync with the config
//! - Dispatch on-demand broadcasts with per-chat success tracking
//! - Merge successful sends back into the saved target list

pub mod candidates;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod login;
pub mod scheduler;
pub mod session;
pub mod store;

// Re-export common types
pub use candidates::{ChatCandidate, Membership};
pub use config::Config;
pub use dispatch::{dispatch, reconcile, DispatchOutcome};
pub use error::{Error, Result};
pub use gateway::{ChatSummary, Gateway, GatewaySession, TelegramGateway};
pub use scheduler::ScheduleManager;
pub use store::{AccountConfig, AppConfig, ConfigStore};
