//! List registered accounts with their broadcast settings

use crate::config::Config;
use crate::error::Result;
use crate::session::list_accounts;
use crate::store::ConfigStore;

pub fn run(config: &Config) -> Result<()> {
    let accounts = list_accounts(config);
    if accounts.is_empty() {
        println!("No registered accounts. Use `add-account` to log one in.");
        return Ok(());
    }

    let store = ConfigStore::load(&config.accounts_file);

    println!("Accounts: {}\n", accounts.len());
    println!("{:<20} {:<8} {:<8} Message", "Account", "Targets", "Trigger");
    println!("{}", "-".repeat(70));
    for name in accounts {
        let account = store.account(&name);
        let preview: String = account.message_text.chars().take(30).collect();
        println!(
            "{:<20} {:<8} {:02}:{:02}    {}",
            name,
            account.target_chats.len(),
            account.send_hour,
            account.send_minute,
            preview
        );
    }
    Ok(())
}
