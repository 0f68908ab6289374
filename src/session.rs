//! Per-account session management for the Telegram client
//!
//! One session file per registered account, stored in a dedicated directory.
//! The existence of `session/<name>.session` is the signal that an account is
//! registered and selectable; abandoned login attempts must remove theirs.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use grammers_client::Client;
use grammers_mtsender::{SenderPool, SenderPoolFatHandle};
use grammers_session::storages::SqliteSession;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

/// Account names are file names: ASCII alphanumerics and underscore only.
pub fn valid_account_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Path of the session file backing `account_id`.
pub fn session_path(config: &Config, account_id: &str) -> PathBuf {
    config.session_dir.join(format!("{}.session", account_id))
}

pub fn session_exists(config: &Config, account_id: &str) -> bool {
    session_path(config, account_id).exists()
}

/// Registered accounts: every `*.session` file in the session directory.
pub fn list_accounts(config: &Config) -> Vec<String> {
    let mut accounts = Vec::new();
    if let Ok(entries) = fs::read_dir(&config.session_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("session") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    accounts.push(stem.to_string());
                }
            }
        }
    }
    accounts.sort();
    accounts
}

/// Delete an account's session file. Removing a file that is already gone is
/// not an error; the caller only cares that no half-initialized account is
/// left selectable.
pub fn remove_session(config: &Config, account_id: &str) -> Result<()> {
    let path = session_path(config, account_id);
    match fs::remove_file(&path) {
        Ok(()) => {
            info!("removed session file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::IoError(e)),
    }
}

async fn open_session(
    config: &Config,
    account_id: &str,
    must_exist: bool,
) -> Result<Arc<SqliteSession>> {
    let path = session_path(config, account_id);
    if must_exist && !path.exists() {
        return Err(Error::SessionNotFound(path.display().to_string()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let session = SqliteSession::open(path.to_string_lossy().as_ref())
        .await
        .map_err(|e| Error::SessionNotFound(format!("Failed to open session: {}", e)))?;
    Ok(Arc::new(session))
}

/// Holder for SenderPool components and Client
pub struct TelegramClient {
    pub client: Client,
    /// Kept alive for the lifetime of the client; dropping it would tear
    /// down the pool under the runner.
    _handle: SenderPoolFatHandle,
    runner_handle: tokio::task::JoinHandle<()>,
}

impl TelegramClient {
    /// Create a new TelegramClient from session
    async fn from_session(config: &Config, session: Arc<SqliteSession>) -> Result<Self> {
        let pool = SenderPool::new(session, config.api_id);

        // Create client from pool (need reference to whole pool)
        let client = Client::new(pool.handle.clone());

        // Get handle and runner after client is created
        let SenderPool {
            runner,
            updates: _,
            handle,
        } = pool;

        // Spawn the runner in background
        let runner_handle = tokio::spawn(async move {
            runner.run().await;
        });

        Ok(Self {
            client,
            _handle: handle,
            runner_handle,
        })
    }

    /// Connect using an existing account's session file.
    pub async fn connect(config: &Config, account_id: &str) -> Result<Self> {
        let session = open_session(config, account_id, true).await?;
        Self::from_session(config, session).await
    }

    /// Connect creating the session file if needed (account-add flow only).
    pub async fn connect_for_login(config: &Config, account_id: &str) -> Result<Self> {
        let session = open_session(config, account_id, false).await?;
        Self::from_session(config, session).await
    }

    /// Tear down the background sender task. Safe to call exactly once; the
    /// sqlite session auto-saves, so there is nothing else to flush.
    pub fn shutdown(self) {
        self.runner_handle.abort();
    }
}

// Implement Deref to allow using TelegramClient as &Client
impl std::ops::Deref for TelegramClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
