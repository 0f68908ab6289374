//! Persisted account configuration (the `config.json` document)
//!
//! One document maps account ids to their broadcast settings: target chats,
//! message text and the daily trigger time. A missing or corrupt file falls
//! back to defaults and is logged, never fatal. All in-memory state lives
//! behind one mutex; callers persist explicitly with [`ConfigStore::save`].

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::candidates::ChatCandidate;
use crate::config::{
    DEFAULT_MESSAGE_TEXT, DEFAULT_SEND_HOUR, DEFAULT_SEND_MINUTE, DEFAULT_WINDOW_HEIGHT,
    DEFAULT_WINDOW_WIDTH,
};
use crate::error::Result;

/// Settings for one registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Chat id -> display name. Serialized with stringified integer keys,
    /// the wire format existing config.json files use.
    #[serde(with = "chat_id_keys", default)]
    pub target_chats: BTreeMap<i64, String>,
    #[serde(default = "default_message_text")]
    pub message_text: String,
    #[serde(default = "default_send_hour")]
    pub send_hour: u8,
    #[serde(default = "default_send_minute")]
    pub send_minute: u8,
}

fn default_message_text() -> String {
    DEFAULT_MESSAGE_TEXT.to_string()
}

fn default_send_hour() -> u8 {
    DEFAULT_SEND_HOUR
}

fn default_send_minute() -> u8 {
    DEFAULT_SEND_MINUTE
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            target_chats: BTreeMap::new(),
            message_text: default_message_text(),
            send_hour: DEFAULT_SEND_HOUR,
            send_minute: DEFAULT_SEND_MINUTE,
        }
    }
}

impl AccountConfig {
    pub fn has_targets(&self) -> bool {
        !self.target_chats.is_empty()
    }

    pub fn target_ids(&self) -> Vec<i64> {
        self.target_chats.keys().copied().collect()
    }
}

/// The whole on-disk document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub accounts: HashMap<String, AccountConfig>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

fn default_window_width() -> u32 {
    DEFAULT_WINDOW_WIDTH
}

fn default_window_height() -> u32 {
    DEFAULT_WINDOW_HEIGHT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Serde adapter for `BTreeMap<i64, String>` keyed by stringified ids.
mod chat_id_keys {
    use std::collections::BTreeMap;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<i64, String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let as_strings: BTreeMap<String, &String> =
            map.iter().map(|(k, v)| (k.to_string(), v)).collect();
        as_strings.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<i64, String>, D::Error> {
        let as_strings: BTreeMap<String, String> = BTreeMap::deserialize(deserializer)?;
        as_strings
            .into_iter()
            .map(|(k, v)| {
                k.parse::<i64>()
                    .map(|id| (id, v))
                    .map_err(|_| D::Error::custom(format!("invalid chat id key: {:?}", k)))
            })
            .collect()
    }
}

/// Owned handle to the persisted configuration.
///
/// Loaded at startup, flushed explicitly after each mutation, and reloaded
/// before scheduled fires to pick up writes from other processes. The mutex
/// keeps mutations serialized on a multi-threaded runtime; lock scopes never
/// span an await.
pub struct ConfigStore {
    path: PathBuf,
    state: Mutex<AppConfig>,
}

fn read_document(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => AppConfig::default(),
        Ok(content) => match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("failed to parse {}: {}", path.display(), e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

impl ConfigStore {
    /// Read the document from `path`. Missing, empty or malformed content
    /// falls back to defaults; the failure is logged, not propagated.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = read_document(&path);
        info!("config loaded from {}", path.display());
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Re-read the document from disk, replacing the in-memory state.
    /// Other processes edit the same file; the scheduler calls this before
    /// each fire so their saved changes are honored.
    pub fn reload(&self) {
        let state = read_document(&self.path);
        *self.state.lock().unwrap() = state;
    }

    /// Write the document back to disk as pretty JSON.
    pub fn save(&self) -> Result<()> {
        let json = {
            let state = self.state.lock().unwrap();
            serde_json::to_string_pretty(&*state)?
        };
        fs::write(&self.path, json)?;
        info!("config saved to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Current settings for `account_id`, or the documented default when the
    /// account has no entry yet.
    pub fn account(&self, account_id: &str) -> AccountConfig {
        let state = self.state.lock().unwrap();
        state
            .accounts
            .get(account_id)
            .cloned()
            .unwrap_or_default()
    }

    /// All account ids present in the document.
    pub fn account_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<String> = state.accounts.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Mutate one account's settings under the lock, inserting the default
    /// entry first if the account is unknown.
    pub fn update_account<F>(&self, account_id: &str, f: F)
    where
        F: FnOnce(&mut AccountConfig),
    {
        let mut state = self.state.lock().unwrap();
        let account = state
            .accounts
            .entry(account_id.to_string())
            .or_default();
        f(account);
    }

    /// Upsert or remove a single recipient.
    pub fn toggle_recipient(&self, account_id: &str, chat_id: i64, name: &str, included: bool) {
        self.update_account(account_id, |account| {
            if included {
                account.target_chats.insert(chat_id, name.to_string());
            } else {
                account.target_chats.remove(&chat_id);
            }
        });
    }

    /// Clear the whole saved target list. Destructive; confirmation is the
    /// caller's responsibility.
    pub fn remove_all_saved(&self, account_id: &str) {
        self.update_account(account_id, |account| {
            account.target_chats.clear();
        });
    }

    /// Upsert or remove every candidate in the currently visible list.
    pub fn select_all(&self, account_id: &str, candidates: &[ChatCandidate], included: bool) {
        self.update_account(account_id, |account| {
            for candidate in candidates {
                if included {
                    account
                        .target_chats
                        .insert(candidate.id, candidate.title.clone());
                } else {
                    account.target_chats.remove(&candidate.id);
                }
            }
        });
    }

    /// Snapshot of the whole document (used by tests and the accounts view).
    pub fn snapshot(&self) -> AppConfig {
        self.state.lock().unwrap().clone()
    }
}
