use thiserror::Error;

use crate::SessionId;

/// Failure of a request to the responder.
///
/// Callers treat every variant the same way; the split only exists for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Failure reading or writing persisted state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("malformed data under {key}: {reason}")]
    Malformed { key: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("a reply is already in flight")]
    Busy,

    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
