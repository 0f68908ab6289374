//! Daily send scheduling
//!
//! One process-wide job table, at most one job per account, keyed
//! `daily_send_<account>`. Syncing an account's schedule is always a full
//! replace: remove whatever job exists, then register a fresh one if the
//! account still has targets. Job actions capture only the account id and
//! the store handle; targets and message text are re-read at fire time, so
//! edits made after scheduling are honored on the next fire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tracing::{error, info};

use crate::dispatch::{dispatch, DispatchOutcome};
use crate::gateway::Gateway;
use crate::store::ConfigStore;

/// Job table key for one account's daily send.
pub fn job_id(account_id: &str) -> String {
    format!("daily_send_{}", account_id)
}

struct ScheduledJob {
    hour: u8,
    minute: u8,
    task: tokio::task::JoinHandle<()>,
}

/// Owns the job table and the spawned trigger tasks.
pub struct ScheduleManager {
    store: Arc<ConfigStore>,
    gateway: Arc<dyn Gateway>,
    jobs: Mutex<HashMap<String, ScheduledJob>>,
    running: AtomicBool,
}

impl ScheduleManager {
    pub fn new(store: Arc<ConfigStore>, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            store,
            gateway,
            jobs: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Start the scheduler. Starting twice is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("scheduler started");
    }

    /// Stop the scheduler: abort every job task and clear the table.
    /// Stopping when not running is a no-op; failures never propagate.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut jobs = self.jobs.lock().unwrap();
        for (id, job) in jobs.drain() {
            job.task.abort();
            info!("job {} removed on shutdown", id);
        }
        info!("scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Create or replace the daily job for `account_id` from its current
    /// configuration. An account with no targets ends up with no job. An
    /// invalid trigger time is logged and leaves no job registered; the
    /// caller may fix the configuration and retry.
    pub fn sync_schedule(&self, account_id: &str) {
        let id = job_id(account_id);
        let mut jobs = self.jobs.lock().unwrap();

        // Unconditional replace, never an incremental update.
        if let Some(existing) = jobs.remove(&id) {
            existing.task.abort();
        }

        let account = self.store.account(account_id);
        if !account.has_targets() {
            info!("({}) no send targets, job not scheduled", account_id);
            return;
        }

        let (hour, minute) = (account.send_hour, account.send_minute);
        if next_daily_run(Local::now(), hour, minute).is_none() {
            error!(
                "({}) invalid trigger time {:02}:{:02}, job not scheduled",
                account_id, hour, minute
            );
            return;
        }

        let store = Arc::clone(&self.store);
        let gateway = Arc::clone(&self.gateway);
        let task_account = account_id.to_string();
        let task = tokio::spawn(async move {
            run_daily(store, gateway, task_account, hour, minute).await;
        });

        jobs.insert(id, ScheduledJob { hour, minute, task });
        info!(
            "({}) daily job scheduled at {:02}:{:02}",
            account_id, hour, minute
        );
    }

    /// Sync every account known to the store. Called once at startup.
    pub fn sync_all(&self) {
        for account_id in self.store.account_ids() {
            self.sync_schedule(&account_id);
        }
    }

    /// Trigger time of the account's registered job, if any.
    pub fn trigger_for(&self, account_id: &str) -> Option<(u8, u8)> {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(&job_id(account_id)).map(|j| (j.hour, j.minute))
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

impl Drop for ScheduleManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sleep until each daily occurrence of `hour:minute` local time, firing the
/// account's broadcast with a live config read every time.
async fn run_daily(
    store: Arc<ConfigStore>,
    gateway: Arc<dyn Gateway>,
    account_id: String,
    hour: u8,
    minute: u8,
) {
    loop {
        let now = Local::now();
        let Some(next) = next_daily_run(now, hour, minute) else {
            // Validated at registration; bail out rather than spin.
            error!("({}) trigger time became invalid, job exiting", account_id);
            return;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::from_secs(60));
        tokio::time::sleep(wait).await;

        info!("({}) scheduled trigger fired", account_id);
        fire(&store, gateway.as_ref(), &account_id).await;
    }
}

/// One scheduled fire: re-read the persisted document, then the account's
/// targets and message text, and dispatch. Returns None when the account has
/// no targets left.
pub async fn fire(
    store: &ConfigStore,
    gateway: &dyn Gateway,
    account_id: &str,
) -> Option<DispatchOutcome> {
    // Edits saved by other CLI invocations since startup land here.
    store.reload();
    let account = store.account(account_id);
    if !account.has_targets() {
        info!("({}) no targets at fire time, skipping", account_id);
        return None;
    }

    let outcome = dispatch(
        gateway,
        account_id,
        &account.target_ids(),
        &account.message_text,
    )
    .await;

    if outcome.success {
        info!("({}) scheduled send done: {}", account_id, outcome.message);
    } else {
        error!("({}) scheduled send failed: {}", account_id, outcome.message);
    }
    Some(outcome)
}

/// Next occurrence of `hour:minute` local time strictly after `after`.
/// Returns None for an out-of-range trigger time.
pub fn next_daily_run(
    after: DateTime<Local>,
    hour: u8,
    minute: u8,
) -> Option<DateTime<Local>> {
    if hour > 23 || minute > 59 {
        return None;
    }
    let mut date = after.date_naive();
    // Two iterations normally; a third covers DST gaps on the target time.
    for _ in 0..3 {
        if let Some(naive) = date.and_hms_opt(u32::from(hour), u32::from(minute), 0) {
            if let Some(candidate) = Local.from_local_datetime(&naive).earliest() {
                if candidate > after {
                    return Some(candidate);
                }
            }
        }
        date = date.succ_opt()?;
    }
    None
}
