//! Run the daily-send scheduler until interrupted
//!
//! Loads the accounts document, registers one job per account with targets,
//! and waits for Ctrl-C. Jobs are not persisted; this startup sync is what
//! rebuilds them.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::{Gateway, TelegramGateway};
use crate::scheduler::ScheduleManager;
use crate::store::ConfigStore;

pub async fn run(config: &Config) -> Result<()> {
    let store = Arc::new(ConfigStore::load(&config.accounts_file));
    let gateway: Arc<dyn Gateway> = Arc::new(TelegramGateway::new(config.clone()));

    let manager = ScheduleManager::new(store, gateway);
    manager.start();
    manager.sync_all();
    info!("{} daily job(s) registered", manager.job_count());
    println!(
        "Scheduler running with {} job(s). Press Ctrl-C to stop.",
        manager.job_count()
    );

    tokio::signal::ctrl_c().await?;

    manager.shutdown();
    println!("Scheduler stopped.");
    Ok(())
}
