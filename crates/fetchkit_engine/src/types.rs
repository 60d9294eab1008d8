use std::fmt;

use fetchkit_core::{ErrorInfo, FetchResult};

pub use fetchkit_core::Generation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent<T> {
    /// A request ran to completion, successfully or not.
    Settled {
        generation: Generation,
        result: FetchResult<T>,
    },
    /// A request was aborted before it settled.
    Cancelled { generation: Generation },
}

/// The background engine could not take a command.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start fetch engine: {0}")]
    Start(#[source] std::io::Error),
    #[error("fetch engine has stopped")]
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub status: u16,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    HttpStatus(u16),
    Parse,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Parse => write!(f, "parse error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<FetchError> for ErrorInfo {
    fn from(err: FetchError) -> Self {
        match err.kind {
            FailureKind::HttpStatus(code) => ErrorInfo::status(code, err.message),
            FailureKind::Parse => ErrorInfo::parse(err.message),
            _ => ErrorInfo::transport(err.to_string()),
        }
    }
}
