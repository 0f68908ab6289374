//! Command implementations
//!
//! Each module corresponds to a subcommand in the CLI.

pub mod accounts;
pub mod add_account;
pub mod list_chats;
pub mod run_scheduler;
pub mod schedule;
pub mod send_now;
pub mod targets;

pub use accounts::run as accounts_run;
pub use list_chats::run as list_chats_run;
pub use send_now::run as send_now_run;
