//! List an account's groups and channels
//!
//! Merges the remote listing with the saved target list so each row carries
//! a saved/discovered tag, optionally filtered by a title search.

use crate::candidates::{build_candidates, filter_candidates, ChatCandidate};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, TelegramGateway};
use crate::store::ConfigStore;

#[derive(Debug, Clone, Copy)]
enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(Error::ConfigError(format!(
                "Unsupported format '{}'. Use table|json|yaml",
                other
            ))),
        }
    }
}

pub async fn run(
    config: &Config,
    account_id: &str,
    query: Option<String>,
    format: &str,
) -> Result<()> {
    let fmt = OutputFormat::parse(format)?;

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

    match fmt {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => {
            let payload = serde_json::to_string_pretty(&rows)
                .map_err(|e| Error::SerializationError(e.to_string()))?;
            println!("{payload}");
        }
        OutputFormat::Yaml => {
            let payload = serde_yaml::to_string(&rows)
                .map_err(|e| Error::SerializationError(e.to_string()))?;
            println!("{payload}");
        }
    }

    Ok(())
}

fn print_table(rows: &[ChatCandidate]) {
    println!("Groups/channels: {}\n", rows.len());
    println!("{:<4} {:<16} {:<12} Title", "#", "ID", "Status");
    println!("{}", "-".repeat(60));
    for (idx, row) in rows.iter().enumerate() {
        let tag = if row.is_saved() { "saved" } else { "discovered" };
        println!("{:<4} {:<16} {:<12} {}", idx + 1, row.id, tag, row.title);
    }
}
