//! Account-add flow
//!
//! Interactive login for a new account: request a verification code, sign
//! in, and handle the two-factor branch. The session file is created by the
//! connect step, so any failure or cancellation after that point must delete
//! it. A half-initialized account must never appear selectable.

use async_trait::async_trait;
use grammers_client::SignInError;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{
    remove_session, session_exists, valid_account_name, TelegramClient,
};

/// Source of the interactive answers during login. `None` means the user
/// cancelled; cancellation aborts silently (no error dialog, only a log).
#[async_trait]
pub trait LoginPrompter: Send + Sync {
    async fn verification_code(&self, phone: &str) -> Option<String>;
    async fn two_factor_password(&self, hint: &str) -> Option<String>;
}

/// Register a new account under `account_id` by logging in with `phone`.
pub async fn add_account(
    config: &Config,
    prompter: &dyn LoginPrompter,
    account_id: &str,
    phone: &str,
) -> Result<()> {
    if !valid_account_name(account_id) {
        return Err(Error::InvalidAccountName(account_id.to_string()));
    }
    if session_exists(config, account_id) {
        return Err(Error::AccountExists(account_id.to_string()));
    }

    // This creates the session file; from here on failure must roll it back.
    let client = TelegramClient::connect_for_login(config, account_id).await?;
    let result = run_login(config, &client, prompter, phone).await;
    client.shutdown();

    match result {
        Ok(()) => {
            info!("({}) login complete, account registered", account_id);
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = remove_session(config, account_id) {
                error!(
                    "({}) failed to remove partial session file: {}",
                    account_id, cleanup
                );
            }
            if matches!(e, Error::LoginCancelled) {
                warn!("({}) login cancelled by user", account_id);
            } else {
                error!("({}) login failed: {}", account_id, e);
            }
            Err(e)
        }
    }
}

async fn run_login(
    config: &Config,
    client: &TelegramClient,
    prompter: &dyn LoginPrompter,
    phone: &str,
) -> Result<()> {
    let authorized = client
        .is_authorized()
        .await
        .map_err(|e| Error::ConnectionError(e.to_string()))?;
    if authorized {
        return Ok(());
    }

    let token = client
        .request_login_code(phone, &config.api_hash)
        .await
        .map_err(|e| Error::TelegramError(e.to_string()))?;

    let code = prompter
        .verification_code(phone)
        .await
        .ok_or(Error::LoginCancelled)?;

    match client.sign_in(&token, &code).await {
        Ok(_) => Ok(()),
        Err(SignInError::PasswordRequired(password_token)) => {
            // Distinguishable two-factor branch
            let hint = password_token.hint().unwrap_or_default().to_string();
            let password = prompter
                .two_factor_password(&hint)
                .await
                .ok_or(Error::LoginCancelled)?;
            client
                .check_password(password_token, password)
                .await
                .map_err(|e| Error::TelegramError(e.to_string()))?;
            Ok(())
        }
        Err(e) => Err(Error::TelegramError(e.to_string())),
    }
}
