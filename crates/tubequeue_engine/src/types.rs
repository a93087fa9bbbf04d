use std::fmt;

use thiserror::Error;
use tubequeue_core::{Outcome, Settings};

/// Events published by the engine to presentation-layer subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A per-item acceptance, warning or rejection.
    Outcome(Outcome),
    /// Local settings changed (by the user or by server config) and should be saved.
    SettingsChanged(Settings),
    /// A full-state refresh failed; the previous mirror is kept.
    RefreshFailed(String),
    /// A category, link or config change finished on the backend.
    MutationFinished {
        action: &'static str,
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == FailureKind::Conflict
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// HTTP 409 from the backend.
    Conflict,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Conflict => write!(f, "conflict"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
        }
    }
}
