//! Error types for the editing session
//!
//! Every failure falls into one of four kinds:
//! - precondition: detected locally, no remote call issued
//! - busy: another call holds the session
//! - remote: non-success status or transport failure
//! - decode: a response arrived but could not be interpreted
//!
//! None of them leave partial state behind.

use pixlab_document::DocumentError;
use pixlab_remote::RemoteError;

/// Coarse classification of an [`EditorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Precondition,
    Busy,
    Remote,
    Decode,
}

/// Main session error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// An operation needs a loaded document
    #[error("no document loaded")]
    NoDocument,

    /// The selected tool is `Select`
    #[error("no processing tool selected")]
    NoToolSelected,

    /// Batch run with nothing pending
    #[error("no images pending for batch processing")]
    BatchEmpty,

    /// Pending batch index outside the set
    #[error("pending batch index {index} out of range (len {len})")]
    BatchIndex { index: usize, len: usize },

    /// Parameters or request shape rejected before sending
    #[error("invalid request: {0}")]
    InvalidRequest(RemoteError),

    /// History navigation not possible from the current cursor
    #[error("history: {0}")]
    History(DocumentError),

    /// A call is already in flight
    #[error("session busy: another operation is in progress")]
    Busy,

    /// The service failed the call
    #[error("{label} failed: {source}")]
    Remote {
        label: String,
        #[source]
        source: RemoteError,
    },

    /// The service answered with something unusable
    #[error("{label} returned an undecodable response: {source}")]
    Decode {
        label: String,
        #[source]
        source: RemoteError,
    },
}

impl EditorError {
    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Busy => ErrorKind::Busy,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::NoDocument
            | Self::NoToolSelected
            | Self::BatchEmpty
            | Self::BatchIndex { .. }
            | Self::InvalidRequest(_)
            | Self::History(_) => ErrorKind::Precondition,
        }
    }

    /// Detected before any remote call was issued
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }

    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.kind() == ErrorKind::Busy
    }

    /// Remote or decode failure: the call reached the service
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.kind(), ErrorKind::Remote | ErrorKind::Decode)
    }

    /// Label of the failed operation, for remote and decode failures
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Remote { label, .. } | Self::Decode { label, .. } => Some(label.as_str()),
            _ => None,
        }
    }

    /// Attach an operation label to a remote failure
    ///
    /// Locally detected request errors stay preconditions.
    pub(crate) fn from_remote(label: impl Into<String>, source: RemoteError) -> Self {
        if source.is_precondition() {
            Self::InvalidRequest(source)
        } else if source.is_decode() {
            Self::Decode {
                label: label.into(),
                source,
            }
        } else {
            Self::Remote {
                label: label.into(),
                source,
            }
        }
    }
}

impl From<DocumentError> for EditorError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotLoaded => Self::NoDocument,
            other => Self::History(other),
        }
    }
}

impl From<RemoteError> for EditorError {
    fn from(err: RemoteError) -> Self {
        Self::InvalidRequest(err)
    }
}
