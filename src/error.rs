//! Error types for the broadcast controller

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Session file not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Invalid trigger time: {0}")]
    InvalidTriggerTime(String),

    #[error("Telegram API error: {0}")]
    TelegramError(String),

    #[error("Chat not found in dialogs: {0}")]
    ChatNotFound(i64),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authorization required")]
    AuthorizationRequired,

    #[error("Login cancelled by user")]
    LoginCancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<grammers_client::InvocationError> for Error {
    fn from(err: grammers_client::InvocationError) -> Self {
        Error::TelegramError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
