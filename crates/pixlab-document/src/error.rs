//! Error types for the document model and history

/// Document and history errors
///
/// All of these are precondition failures: they are detected before any
/// state changes and leave the document and history untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// No source image has been loaded
    #[error("no document loaded")]
    NotLoaded,

    /// Cursor already at the first entry (or history is empty)
    #[error("nothing to undo")]
    NothingToUndo,

    /// Cursor already at the last entry (or history is empty)
    #[error("nothing to redo")]
    NothingToRedo,

    /// History index outside the timeline
    #[error("history index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
