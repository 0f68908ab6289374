//! Edit an account's trigger time and message text

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::ConfigStore;

/// Parse a `HH:MM` trigger time. Rejected input never reaches the store.
pub fn parse_trigger(raw: &str) -> Result<(u8, u8)> {
    let invalid = || Error::InvalidTriggerTime(raw.to_string());

    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u8 = hour.trim().parse().map_err(|_| invalid())?;
    let minute: u8 = minute.trim().parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Set the daily send time.
pub fn set_time(config: &Config, account_id: &str, raw: &str) -> Result<()> {
    let (hour, minute) = parse_trigger(raw)?;

    let store = ConfigStore::load(&config.accounts_file);
    store.update_account(account_id, |account| {
        account.send_hour = hour;
        account.send_minute = minute;
    });
    store.save()?;
    println!("'{}' now sends daily at {:02}:{:02}.", account_id, hour, minute);
    Ok(())
}

/// Set the broadcast message text.
pub fn set_message(config: &Config, account_id: &str, text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::ConfigError("message text cannot be empty".into()));
    }

    let store = ConfigStore::load(&config.accounts_file);
    store.update_account(account_id, |account| {
        account.message_text = text.to_string();
    });
    store.save()?;
    println!("Message text updated for '{}'.", account_id);
    Ok(())
}
