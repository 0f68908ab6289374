//! Edit an account's saved target list
//!
//! Every mutation is persisted immediately; the `run` daemon rebuilds its
//! job table from the saved document, so a persisted edit is a resynced
//! schedule on the next startup.

use crate::candidates::{build_candidates, filter_candidates};
use crate::config::Config;
use crate::dispatch::UNKNOWN_CHAT_NAME;
use crate::error::Result;
use crate::gateway::{Gateway, TelegramGateway};
use crate::store::ConfigStore;

/// Save one chat as a target. The display name defaults to a placeholder
/// until the next `list-chats` merge shows the real title.
pub fn add(config: &Config, account_id: &str, chat_id: i64, name: Option<String>) -> Result<()> {
    let store = ConfigStore::load(&config.accounts_file);
    let name = name.unwrap_or_else(|| UNKNOWN_CHAT_NAME.to_string());
    store.toggle_recipient(account_id, chat_id, &name, true);
    store.save()?;
    println!("Saved {} for '{}'.", chat_id, account_id);
    Ok(())
}

/// Remove one chat from the targets.
pub fn remove(config: &Config, account_id: &str, chat_id: i64) -> Result<()> {
    let store = ConfigStore::load(&config.accounts_file);
    store.toggle_recipient(account_id, chat_id, "", false);
    store.save()?;
    println!("Removed {} from '{}'.", chat_id, account_id);
    Ok(())
}

/// Clear the whole saved target list. The CLI requires an explicit flag
/// before calling this; the operation itself does not ask.
pub fn clear(config: &Config, account_id: &str) -> Result<()> {
    let store = ConfigStore::load(&config.accounts_file);
    store.remove_all_saved(account_id);
    store.save()?;
    println!("Cleared all saved targets for '{}'.", account_id);
    Ok(())
}

/// Save (or unsave) every group/channel currently visible for the account,
/// after an optional title filter. This is the "select all" bulk action.
pub async fn select_all(
    config: &Config,
    account_id: &str,
    query: Option<String>,
    included: bool,
) -> Result<()> {
    let store = ConfigStore::load(&config.accounts_file);
    let saved = store.account(account_id).target_chats;

    let gateway = TelegramGateway::new(config.clone());
    let session = gateway.open(account_id).await?;
    let fetched = session.group_chats().await;
    session.close().await;

    let fetched: Vec<(i64, String)> = fetched?
        .into_iter()
        .map(|chat| (chat.id, chat.title))
        .collect();

    let mut rows = build_candidates(&fetched, &saved);
    if let Some(query) = query {
        rows = filter_candidates(&rows, &query);
    }

    store.select_all(account_id, &rows, included);
    store.save()?;

    let verb = if included { "Saved" } else { "Unsaved" };
    println!("{} {} chats for '{}'.", verb, rows.len(), account_id);
    Ok(())
}
