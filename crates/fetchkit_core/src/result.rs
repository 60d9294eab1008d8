use std::fmt;

/// Outcome of the most recent fetch initiation, as seen by the owner.
///
/// Exactly one branch is populated at a time, so data and error can never
/// coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult<T> {
    /// Initiated but not yet settled.
    Pending,
    Success {
        data: T,
    },
    Failure {
        error: ErrorInfo,
    },
}

impl<T> Default for FetchResult<T> {
    fn default() -> Self {
        FetchResult::Pending
    }
}

impl<T> FetchResult<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchResult::Pending)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchResult::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            FetchResult::Failure { error } => Some(error),
            _ => None,
        }
    }

    /// Returns the fetched data, or `default` while pending or failed.
    pub fn data_or<'a>(&'a self, default: &'a T) -> &'a T {
        self.data().unwrap_or(default)
    }

    /// Settled outcome, or `None` while pending.
    pub fn into_outcome(self) -> Option<Result<T, ErrorInfo>> {
        match self {
            FetchResult::Pending => None,
            FetchResult::Success { data } => Some(Ok(data)),
            FetchResult::Failure { error } => Some(Err(error)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchResult<U> {
        match self {
            FetchResult::Pending => FetchResult::Pending,
            FetchResult::Success { data } => FetchResult::Success { data: f(data) },
            FetchResult::Failure { error } => FetchResult::Failure { error },
        }
    }
}

impl<T> From<Result<T, ErrorInfo>> for FetchResult<T> {
    fn from(outcome: Result<T, ErrorInfo>) -> Self {
        match outcome {
            Ok(data) => FetchResult::Success { data },
            Err(error) => FetchResult::Failure { error },
        }
    }
}

/// Caller-facing failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be sent or no response arrived.
    Transport,
    /// The server answered with a non-success status code.
    Status,
    /// The body could not be decoded.
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::Status => write!(f, "status error"),
            ErrorKind::Parse => write!(f, "parse error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status code; only set for [`ErrorKind::Status`].
    pub status: Option<u16>,
}

impl ErrorInfo {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: message.into(),
            status: None,
        }
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Status,
            message: message.into(),
            status: Some(code),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: message.into(),
            status: None,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "{} ({}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}
