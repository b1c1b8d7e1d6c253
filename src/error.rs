//! Error taxonomy shared by every plugin operation.
//!
//! Each variant maps to a stable `kind` string so the webview can branch on
//! "permission needed" vs "not supported here" vs "storage broken" without
//! parsing messages.

use serde::{ser::SerializeStruct, Serialize, Serializer};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("notification access not granted: {0}")]
    Permission(String),

    #[error("not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("storage failure: {message}")]
    Storage { message: String },

    #[error("batch write stopped at '{failed_id}' after {} committed records: {message}", committed.len())]
    PartialWrite {
        committed: Vec<String>,
        failed_id: String,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Permission(_) => "permission",
            Error::UnsupportedPlatform(_) => "unsupported_platform",
            Error::Validation(_) => "validation",
            Error::Storage { .. } | Error::PartialWrite { .. } => "storage",
            Error::Config(_) => "config",
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Wraps a database-layer failure, keeping the full context chain.
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        Error::Storage {
            message: format!("{err:#}"),
        }
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Error::PartialWrite {
                committed,
                failed_id,
                ..
            } => {
                let mut state = serializer.serialize_struct("Error", 4)?;
                state.serialize_field("kind", self.kind())?;
                state.serialize_field("message", &self.to_string())?;
                state.serialize_field("committed", committed)?;
                state.serialize_field("failedId", failed_id)?;
                state.end()
            }
            _ => {
                let mut state = serializer.serialize_struct("Error", 2)?;
                state.serialize_field("kind", self.kind())?;
                state.serialize_field("message", &self.to_string())?;
                state.end()
            }
        }
    }
}
