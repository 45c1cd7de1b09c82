use thiserror::Error;

use crate::session::FailureInfo;

/// Why a ticket poll produced no snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),
    /// The backend answered with a non-success status.
    #[error("backend responded with status {status}{}", reason_suffix(.status_text))]
    Status {
        status: u16,
        status_text: Option<String>,
    },
    /// The body could not be decoded as a ticket list.
    #[error("malformed ticket payload: {0}")]
    Malformed(String),
}

fn reason_suffix(status_text: &Option<String>) -> String {
    match status_text {
        Some(text) if !text.is_empty() => format!(" ({text})"),
        _ => String::new(),
    }
}

impl FetchError {
    /// HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Diagnostic detail published in the failed view.
    pub fn failure_info(&self) -> FailureInfo {
        let message = match self {
            FetchError::Status {
                status_text: Some(text),
                ..
            } if !text.is_empty() => text.clone(),
            other => other.to_string(),
        };
        FailureInfo {
            status: self.status(),
            message: Some(message),
        }
    }
}
