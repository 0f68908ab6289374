//! Immediate broadcast ("send now")
//!
//! Sends to the saved targets, or to an explicit chat list, then merges
//! every successfully sent chat back into the saved targets and persists.
//! A successful delivery is evidence the recipient is worth remembering.

use crate::candidates::saved_candidates;
use crate::config::Config;
use crate::dispatch::{dispatch, reconcile};
use crate::error::{Error, Result};
use crate::gateway::TelegramGateway;
use crate::store::ConfigStore;

pub async fn run(
    config: &Config,
    account_id: &str,
    text: Option<String>,
    chats: Vec<i64>,
) -> Result<()> {
    let store = ConfigStore::load(&config.accounts_file);
    let account = store.account(account_id);

    let chat_ids = if chats.is_empty() {
        account.target_ids()
    } else {
        chats
    };
    if chat_ids.is_empty() {
        return Err(Error::ConfigError(
            "no target chats: save some with `targets add` or pass --chat".into(),
        ));
    }

    let text = text.unwrap_or_else(|| account.message_text.clone());
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(Error::ConfigError("message text cannot be empty".into()));
    }

    let gateway = TelegramGateway::new(config.clone());
    let outcome = dispatch(&gateway, account_id, &chat_ids, &text).await;

    if !outcome.success {
        return Err(Error::ConnectionError(outcome.message));
    }

    // Reconcile sent ids into the saved targets and remember the text.
    let candidates = saved_candidates(&account.target_chats);
    store.update_account(account_id, |account| {
        account.message_text = text.clone();
        reconcile(account, &outcome.sent_ids, &candidates);
    });
    store.save()?;

    println!("{}", outcome.message);
    for chat_id in &outcome.sent_ids {
        println!("  sent: {}", chat_id);
    }
    let failed: Vec<i64> = chat_ids
        .iter()
        .copied()
        .filter(|id| !outcome.sent_ids.contains(id))
        .collect();
    for chat_id in failed {
        println!("  failed: {}", chat_id);
    }
    Ok(())
}
