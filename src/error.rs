use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Another conflicting operation is already in progress. Please try again later.")]
    Busy,
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {0}: {1}")]
    Read(String, String),
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("begin write on {0}: {1}")]
    Begin(String, String),
    #[error("commit on {0}: {1}")]
    Commit(String, String),
}

pub type Result<T> = std::result::Result<T, VaultError>;

impl VaultError {
    pub fn message(msg: impl Into<String>) -> Self {
        VaultError::Message(msg.into())
    }
}

impl From<ConfigError> for VaultError {
    fn from(err: ConfigError) -> Self {
        VaultError::Config(err)
    }
}
