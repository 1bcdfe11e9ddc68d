use std::fmt;

use crate::hooks::HookError;
use crate::persist::PersistError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    pub kind: FailureKind,
    pub message: String,
}

impl StoreError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Anything that stops one page from reaching disk.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("header hook failed: {0}")]
    Header(#[source] HookError),
    #[error("image hook failed on block {block_id}: {source}")]
    Image {
        block_id: String,
        #[source]
        source: HookError,
    },
    #[error("output path {0} has no file name")]
    OutputPath(String),
    #[error("write failed: {0}")]
    Persist(#[from] PersistError),
}
