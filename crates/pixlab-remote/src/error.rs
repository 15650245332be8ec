//! Error types for the remote service contract

/// Errors produced while building a request or talking to the service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// A parameter failed validation; no request was sent
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Operation or batch operation name not in the contract
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Batch input set outside 1..=max
    #[error("batch holds {count} images (allowed 1..={max})")]
    BatchSize { count: usize, max: usize },

    /// Non-success HTTP status
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection failure, timeout, or broken body stream
    #[error("transport error: {0}")]
    Transport(String),

    /// Response could not be interpreted as the expected payload
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Build an `InvalidParameter` error
    #[inline]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build a `Decode` error
    #[inline]
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Detected locally before any request was issued
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::UnknownOperation(_) | Self::BatchSize { .. }
        )
    }

    /// Response arrived but could not be decoded
    #[inline]
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}
