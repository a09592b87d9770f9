//! Error taxonomy shared by every stage of a run.
//!
//! Per-item normalization problems are not errors (see
//! [`crate::pipeline::Diagnostic`]); everything here aborts the run and is
//! surfaced to the caller unchanged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("missing credentials: {missing}. {hint}")]
    MissingCredentials { missing: String, hint: &'static str },
    #[error("authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("{0}")]
    NotFound(String),
    #[error("data integrity violated: {0}")]
    DataIntegrity(String),
    #[error("sink error: {0}")]
    Sink(String),
    #[error("config error: {0}")]
    Config(String),
}

impl EtlError {
    /// Short machine-readable kind, used in failed run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::MissingCredentials { .. } => "missing_credentials",
            EtlError::Auth { .. } => "auth",
            EtlError::Transport(_) => "transport",
            EtlError::Http { .. } => "http",
            EtlError::Protocol(_) => "protocol",
            EtlError::NotFound(_) => "not_found",
            EtlError::DataIntegrity(_) => "data_integrity",
            EtlError::Sink(_) => "sink",
            EtlError::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for EtlError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            EtlError::Protocol(e.to_string())
        } else {
            EtlError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(e: serde_json::Error) -> Self {
        EtlError::Protocol(e.to_string())
    }
}

impl From<csv::Error> for EtlError {
    fn from(e: csv::Error) -> Self {
        EtlError::Sink(e.to_string())
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(e: rusqlite::Error) -> Self {
        EtlError::Sink(e.to_string())
    }
}
