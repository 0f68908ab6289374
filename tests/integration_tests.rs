//! Integration tests for the tg_broadcast library
//!
//! These tests verify the public API and module interactions.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::tempdir;

use tg_broadcast::{
    candidates::{build_candidates, filter_candidates, ChatCandidate, Membership},
    config::{
        Config, ACCOUNTS_FILE, DEFAULT_MESSAGE_TEXT, DEFAULT_SEND_HOUR, DEFAULT_SEND_MINUTE,
        SESSION_DIR,
    },
    dispatch::{dispatch, reconcile, UNKNOWN_CHAT_NAME},
    error::{Error, Result},
    gateway::{ChatSummary, Gateway, GatewaySession},
    scheduler::{job_id, next_daily_run, ScheduleManager},
    session::{session_path, valid_account_name},
    store::{AccountConfig, ConfigStore},
};

// ============================================================================
// Test Gateway
// ============================================================================

/// In-memory gateway: records attempts, fails configured chats, counts
/// open/close pairs.
struct TestGateway {
    failing_chats: Vec<i64>,
    fail_open: bool,
    chats: Vec<ChatSummary>,
    attempts: Arc<Mutex<Vec<i64>>>,
    closes: Arc<AtomicUsize>,
}

impl TestGateway {
    fn new() -> Self {
        Self {
            failing_chats: Vec::new(),
            fail_open: false,
            chats: Vec::new(),
            attempts: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct TestSession {
    failing_chats: Vec<i64>,
    chats: Vec<ChatSummary>,
    attempts: Arc<Mutex<Vec<i64>>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Gateway for TestGateway {
    async fn open(&self, account_id: &str) -> Result<Box<dyn GatewaySession>> {
        if self.fail_open {
            return Err(Error::ConnectionError(format!(
                "cannot open session for {}",
                account_id
            )));
        }
        Ok(Box::new(TestSession {
            failing_chats: self.failing_chats.clone(),
            chats: self.chats.clone(),
            attempts: Arc::clone(&self.attempts),
            closes: Arc::clone(&self.closes),
        }))
    }
}

#[async_trait]
impl GatewaySession for TestSession {
    async fn send_message(&self, chat_id: i64, _text: &str) -> Result<()> {
        self.attempts.lock().unwrap().push(chat_id);
        if self.failing_chats.contains(&chat_id) {
            return Err(Error::ChatNotFound(chat_id));
        }
        Ok(())
    }

    async fn group_chats(&self) -> Result<Vec<ChatSummary>> {
        Ok(self.chats.clone())
    }

    async fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_new_loads_or_defaults() {
    let config = Config::new();
    assert!(!config.session_dir.as_os_str().is_empty());
    assert!(!config.accounts_file.as_os_str().is_empty());
}

#[test]
fn test_config_constants() {
    assert_eq!(SESSION_DIR, "session");
    assert_eq!(ACCOUNTS_FILE, "config.json");
    assert_eq!(DEFAULT_MESSAGE_TEXT, "Automated broadcast message");
    assert_eq!(DEFAULT_SEND_HOUR, 12);
    assert_eq!(DEFAULT_SEND_MINUTE, 23);
}

#[test]
fn test_config_is_clone() {
    let config = Config::new();
    let cloned = config.clone();
    assert_eq!(config.session_dir, cloned.session_dir);
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_error_variants_display() {
    let errors = vec![
        Error::ConfigError("bad config".into()),
        Error::SessionNotFound("alice.session".into()),
        Error::InvalidAccountName("bad name".into()),
        Error::AccountExists("alice".into()),
        Error::InvalidTriggerTime("25:00".into()),
        Error::TelegramError("api error".into()),
        Error::ChatNotFound(-100123),
        Error::ConnectionError("timeout".into()),
        Error::AuthorizationRequired,
        Error::LoginCancelled,
        Error::SerializationError("json error".into()),
    ];

    for err in errors {
        let msg = err.to_string();
        assert!(!msg.is_empty(), "Error message should not be empty");
    }
}

#[test]
fn test_result_type_alias() {
    fn returns_ok() -> Result<i32> {
        Ok(42)
    }

    fn returns_err() -> Result<i32> {
        Err(Error::AuthorizationRequired)
    }

    assert!(returns_ok().is_ok());
    assert!(returns_err().is_err());
}

// ============================================================================
// Store Tests
// ============================================================================

#[test]
fn test_store_defaults_when_file_missing() {
    let dir = tempdir().unwrap();
    let store = ConfigStore::load(dir.path().join("config.json"));

    let account = store.account("anyone");
    assert!(account.target_chats.is_empty());
    assert_eq!(account.message_text, DEFAULT_MESSAGE_TEXT);
    assert_eq!(account.send_hour, DEFAULT_SEND_HOUR);
    assert_eq!(account.send_minute, DEFAULT_SEND_MINUTE);
}

#[test]
fn test_store_save_and_reload_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let store = ConfigStore::load(&path);
    store.update_account("alice", |account| {
        account.target_chats.insert(-100111, "News".to_string());
        account.message_text = "Hello all".to_string();
        account.send_hour = 9;
        account.send_minute = 30;
    });
    store.save().unwrap();

    let reloaded = ConfigStore::load(&path);
    let account = reloaded.account("alice");
    assert_eq!(account.target_chats.get(&-100111).unwrap(), "News");
    assert_eq!(account.message_text, "Hello all");
    assert_eq!(account.send_hour, 9);
    assert_eq!(account.send_minute, 30);
}

#[test]
fn test_store_target_chats_use_string_keys_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let store = ConfigStore::load(&path);
    store.update_account("alice", |account| {
        account.target_chats.insert(-100222, "Ops".to_string());
    });
    store.save().unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"-100222\""), "chat id keys must be strings");
}

#[test]
fn test_store_toggle_recipient() {
    let dir = tempdir().unwrap();
    let store = ConfigStore::load(dir.path().join("config.json"));

    store.toggle_recipient("alice", -100333, "Team", true);
    assert!(store.account("alice").target_chats.contains_key(&-100333));

    store.toggle_recipient("alice", -100333, "Team", false);
    assert!(store.account("alice").target_chats.is_empty());
}

#[test]
fn test_store_remove_all_saved() {
    let dir = tempdir().unwrap();
    let store = ConfigStore::load(dir.path().join("config.json"));

    store.toggle_recipient("alice", 1, "A", true);
    store.toggle_recipient("alice", 2, "B", true);
    store.remove_all_saved("alice");

    assert!(store.account("alice").target_chats.is_empty());
}

#[test]
fn test_store_corrupt_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = ConfigStore::load(&path);
    assert!(store.account_ids().is_empty());
}

// ============================================================================
// Candidate Tests
// ============================================================================

fn saved_map(entries: &[(i64, &str)]) -> BTreeMap<i64, String> {
    entries
        .iter()
        .map(|(id, name)| (*id, name.to_string()))
        .collect()
}

#[test]
fn test_build_candidates_merges_saved_and_fetched() {
    let fetched = vec![(1, "Alpha".to_string()), (2, "Beta".to_string())];
    let saved = saved_map(&[(2, "Beta"), (9, "Gone")]);

    let rows = build_candidates(&fetched, &saved);
    assert_eq!(rows.len(), 3);

    // Saved entries first, including the stale one no longer fetched
    assert!(rows.iter().any(|c| c.id == 9 && c.is_saved()));
    assert!(rows.iter().any(|c| c.id == 2 && c.is_saved()));
    assert!(rows.iter().any(|c| c.id == 1 && !c.is_saved()));
}

#[test]
fn test_filter_candidates_case_insensitive() {
    let rows = vec![
        ChatCandidate {
            id: 1,
            title: "Dev Team".to_string(),
            membership: Membership::Discovered,
        },
        ChatCandidate {
            id: 2,
            title: "Marketing".to_string(),
            membership: Membership::Saved,
        },
    ];

    let hits = filter_candidates(&rows, "dev");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 1);
}

// ============================================================================
// Dispatch Tests
// ============================================================================

#[tokio::test]
async fn test_dispatch_reports_per_chat_results() {
    let mut gateway = TestGateway::new();
    gateway.failing_chats = vec![2];

    let outcome = dispatch(&gateway, "alice", &[1, 2, 3], "hi").await;

    assert!(outcome.success);
    assert_eq!(outcome.sent_ids, vec![1, 3]);
    assert_eq!(outcome.message, "Sent to 2 of 3 chats");
    assert_eq!(*gateway.attempts.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_dispatch_closes_session_exactly_once() {
    let gateway = TestGateway::new();
    dispatch(&gateway, "alice", &[1, 2], "hi").await;
    assert_eq!(gateway.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dispatch_open_failure() {
    let mut gateway = TestGateway::new();
    gateway.fail_open = true;

    let outcome = dispatch(&gateway, "alice", &[1], "hi").await;

    assert!(!outcome.success);
    assert!(outcome.sent_ids.is_empty());
    assert_eq!(gateway.closes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_reconcile_inserts_without_removing() {
    let mut account = AccountConfig::default();
    account.target_chats.insert(5, "Kept".to_string());

    let candidates = vec![ChatCandidate {
        id: 1,
        title: "Alpha".to_string(),
        membership: Membership::Discovered,
    }];

    reconcile(&mut account, &[1, 7], &candidates);

    assert_eq!(account.target_chats.get(&5).unwrap(), "Kept");
    assert_eq!(account.target_chats.get(&1).unwrap(), "Alpha");
    assert_eq!(account.target_chats.get(&7).unwrap(), UNKNOWN_CHAT_NAME);
}

// ============================================================================
// Scheduler Tests
// ============================================================================

#[test]
fn test_job_id_format() {
    assert_eq!(job_id("alice"), "daily_send_alice");
}

#[test]
fn test_next_daily_run_rejects_invalid_time() {
    let now = chrono::Local::now();
    assert!(next_daily_run(now, 24, 0).is_none());
    assert!(next_daily_run(now, 0, 60).is_none());
}

#[test]
fn test_next_daily_run_is_strictly_after() {
    let now = chrono::Local::now();
    let next = next_daily_run(now, 12, 23).unwrap();
    assert!(next > now);
    assert!(next - now <= chrono::Duration::days(1));
}

#[tokio::test]
async fn test_manager_skips_accounts_without_targets() {
    let dir = tempdir().unwrap();
    let store = Arc::new(ConfigStore::load(dir.path().join("config.json")));
    let gateway: Arc<dyn Gateway> = Arc::new(TestGateway::new());
    let manager = ScheduleManager::new(Arc::clone(&store), gateway);
    manager.start();

    store.update_account("alice", |account| {
        account.message_text = "hello".to_string();
    });
    manager.sync_schedule("alice");

    assert_eq!(manager.job_count(), 0);
    manager.shutdown();
}

#[tokio::test]
async fn test_manager_registers_job_for_account_with_targets() {
    let dir = tempdir().unwrap();
    let store = Arc::new(ConfigStore::load(dir.path().join("config.json")));
    let gateway: Arc<dyn Gateway> = Arc::new(TestGateway::new());
    let manager = ScheduleManager::new(Arc::clone(&store), gateway);
    manager.start();

    store.update_account("alice", |account| {
        account.target_chats.insert(1, "A".to_string());
        account.send_hour = 8;
        account.send_minute = 15;
    });
    manager.sync_schedule("alice");

    assert_eq!(manager.job_count(), 1);
    assert_eq!(manager.trigger_for("alice"), Some((8, 15)));

    // Clearing targets unregisters the job on the next sync
    store.remove_all_saved("alice");
    manager.sync_schedule("alice");
    assert_eq!(manager.job_count(), 0);

    manager.shutdown();
}

// ============================================================================
// Session Helper Tests
// ============================================================================

#[test]
fn test_valid_account_name() {
    assert!(valid_account_name("alice_01"));
    assert!(!valid_account_name(""));
    assert!(!valid_account_name("has space"));
    assert!(!valid_account_name("dot.name"));
}

#[test]
fn test_session_path_layout() {
    let mut config = Config::new();
    config.session_dir = "/tmp/sessions".into();
    let path = session_path(&config, "alice");
    assert_eq!(path, std::path::PathBuf::from("/tmp/sessions/alice.session"));
}
