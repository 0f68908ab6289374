//! Register a new account via interactive login

use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::login::{add_account, LoginPrompter};

/// Prompter reading answers from stdin. An empty line cancels.
struct StdinPrompter;

fn ask(prompt: &str) -> Option<String> {
    print!("{}: ", prompt);
    io::stdout().flush().ok()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let answer = line.trim().to_string();
    if answer.is_empty() {
        None
    } else {
        Some(answer)
    }
}

#[async_trait]
impl LoginPrompter for StdinPrompter {
    async fn verification_code(&self, phone: &str) -> Option<String> {
        ask(&format!("Verification code sent to {}", phone))
    }

    async fn two_factor_password(&self, hint: &str) -> Option<String> {
        if hint.is_empty() {
            ask("Two-factor password")
        } else {
            ask(&format!("Two-factor password (hint: {})", hint))
        }
    }
}

pub async fn run(config: &Config, name: &str, phone: &str) -> Result<()> {
    match add_account(config, &StdinPrompter, name, phone).await {
        Ok(()) => {
            println!("Account '{}' registered.", name);
            println!("Confirm the login on your other Telegram device if prompted.");
            Ok(())
        }
        // Cancellation is silent: no error output, only the warn log
        Err(Error::LoginCancelled) => Ok(()),
        Err(e) => Err(e),
    }
}
