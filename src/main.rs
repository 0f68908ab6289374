//! Broadcast controller CLI - main entry point

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tg_broadcast::{commands, Config};

#[derive(Parser)]
#[command(name = "tg_broadcast")]
#[command(about = "Telegram broadcast controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered accounts and their broadcast settings
    Accounts,

    /// Register a new account via interactive login
    AddAccount {
        /// Account alias (letters, digits and underscore)
        name: String,

        /// Phone number in international format (e.g. +15551234567)
        phone: String,
    },

    /// List an account's groups and channels with saved/discovered tags
    ListChats {
        /// Account alias
        account: String,

        /// Filter by title substring
        #[arg(short, long)]
        query: Option<String>,

        /// Output format: table | json | yaml
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Edit the saved target list
    Targets {
        #[command(subcommand)]
        action: TargetAction,
    },

    /// Set the daily send time (24h HH:MM)
    Schedule {
        /// Account alias
        account: String,

        /// Trigger time, e.g. 09:30
        time: String,
    },

    /// Set the broadcast message text
    Message {
        /// Account alias
        account: String,

        /// Message body
        text: String,
    },

    /// Send the broadcast immediately
    SendNow {
        /// Account alias
        account: String,

        /// Override the saved message text
        #[arg(short, long)]
        text: Option<String>,

        /// Send to these chat ids instead of the saved targets (repeatable)
        #[arg(long = "chat")]
        chats: Vec<i64>,
    },

    /// Run the daily-send scheduler until Ctrl-C
    Run,
}

#[derive(Subcommand)]
enum TargetAction {
    /// Save one chat as a target
    Add {
        account: String,
        chat_id: i64,

        /// Display name (defaults to a placeholder)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove one chat from the targets
    Remove { account: String, chat_id: i64 },

    /// Remove every saved target
    Clear {
        account: String,

        /// Required confirmation for the destructive clear
        #[arg(long)]
        yes: bool,
    },

    /// Save (or unsave) every currently visible group/channel
    SelectAll {
        account: String,

        /// Filter by title substring first
        #[arg(short, long)]
        query: Option<String>,

        /// Unsave instead of save
        #[arg(long)]
        unselect: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::new();

    match cli.command {
        Commands::Accounts => commands::accounts_run(&config)?,
        Commands::AddAccount { name, phone } => {
            commands::add_account::run(&config, &name, &phone).await?
        }
        Commands::ListChats {
            account,
            query,
            format,
        } => commands::list_chats_run(&config, &account, query, &format).await?,
        Commands::Targets { action } => match action {
            TargetAction::Add {
                account,
                chat_id,
                name,
            } => commands::targets::add(&config, &account, chat_id, name)?,
            TargetAction::Remove { account, chat_id } => {
                commands::targets::remove(&config, &account, chat_id)?
            }
            TargetAction::Clear { account, yes } => {
                if !yes {
                    anyhow::bail!("refusing to clear all targets without --yes");
                }
                commands::targets::clear(&config, &account)?
            }
            TargetAction::SelectAll {
                account,
                query,
                unselect,
            } => commands::targets::select_all(&config, &account, query, !unselect).await?,
        },
        Commands::Schedule { account, time } => {
            commands::schedule::set_time(&config, &account, &time)?
        }
        Commands::Message { account, text } => {
            commands::schedule::set_message(&config, &account, &text)?
        }
        Commands::SendNow {
            account,
            text,
            chats,
        } => commands::send_now_run(&config, &account, text, chats).await?,
        Commands::Run => commands::run_scheduler::run(&config).await?,
    }

    Ok(())
}
