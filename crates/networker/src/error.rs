use thiserror::Error;

use crate::request::RequestKind;

/// Errors raised by the pool and by request construction. Failures of the
/// HTTP call itself never surface here; they reach the completion handler.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("networker pool is already initialized")]
    AlreadyInitialized,
    #[error("networker pool was already killed")]
    AlreadyKilled,
    #[error("networker pool is not running")]
    NotRunning,
    #[error("could not start networker thread {index}: {source}")]
    ThreadSpawn {
        index: usize,
        source: std::io::Error,
    },
    #[error("request kind {0:?} cannot be submitted")]
    UnsupportedKind(RequestKind),
    #[error("request body does not match kind {kind:?}: {reason}")]
    BodyMismatch {
        kind: RequestKind,
        reason: &'static str,
    },
    #[error("invalid networker config: {0}")]
    InvalidConfig(String),
    #[error("failed to build transport: {0}")]
    Transport(#[from] TransportError),
}

/// Connection-level failures reported by a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("request kind {0:?} has no HTTP mapping")]
    UnsupportedKind(RequestKind),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("could not connect: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        if err.is_timeout() {
            Self::Timeout(message)
        } else if err.is_connect() {
            Self::Connect(message)
        } else {
            Self::Other(message)
        }
    }
}

pub type Result<T, E = NetError> = std::result::Result<T, E>;
