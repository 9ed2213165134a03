use crate::domain::model::DataKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("{kind} request failed: {source}")]
    Transport {
        kind: DataKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{kind} API request failed with status code: {status}")]
    UnexpectedStatus { kind: DataKind, status: u16 },

    #[error("Failed to append to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{field} is not set in the environment")]
    MissingConfig { field: String },

    #[error("Invalid value for {field} ({value:?}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// 單筆資料略過，迴圈繼續
    Recoverable,
    /// 啟動前終止
    Fatal,
}

impl CollectorError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CollectorError::Transport { .. }
            | CollectorError::UnexpectedStatus { .. }
            | CollectorError::Io { .. } => ErrorSeverity::Recoverable,
            CollectorError::Client(_)
            | CollectorError::MissingConfig { .. }
            | CollectorError::InvalidConfigValue { .. }
            | CollectorError::EnvFile(_) => ErrorSeverity::Fatal,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            CollectorError::Transport { .. } => {
                "Check network connectivity; the next tick will try again".to_string()
            }
            CollectorError::UnexpectedStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check that MTDDATA_API_KEY is valid".to_string()
            }
            CollectorError::UnexpectedStatus { .. } => {
                "The API rejected the request; the next tick will try again".to_string()
            }
            CollectorError::Io { .. } => {
                "Check that the output directory exists, is writable and has free space".to_string()
            }
            CollectorError::Client(_) => "Check the TLS configuration of this host".to_string(),
            CollectorError::MissingConfig { field } => {
                format!("Set {} in the environment or in a .env file", field)
            }
            CollectorError::InvalidConfigValue { field, .. } => {
                format!("Fix the value of {}", field)
            }
            CollectorError::EnvFile(_) => {
                "Make sure the env file exists and uses KEY=value lines".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CollectorError>;
