//! Read-only session projection for rendering

use crate::batch::JobId;
use crate::comparison::ComparisonSnapshot;
use crate::tool::Tool;
use pixlab_remote::BatchOperation;

/// Short description of the last batch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub job_id: JobId,
    pub operation: BatchOperation,
    pub count: usize,
}

/// Everything an interface needs to draw the session
///
/// Taken in one lock acquisition, so the fields are mutually consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// History labels in timeline order
    pub labels: Vec<String>,
    /// Index of the active entry
    pub active: Option<usize>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub busy: bool,
    pub has_document: bool,
    /// Name of the loaded source
    pub document_name: Option<String>,
    pub tool: Tool,
    pub comparison: Option<ComparisonSnapshot>,
    /// Names of files waiting for a batch run
    pub pending_batch: Vec<String>,
    pub batch_result: Option<BatchSummary>,
    /// Undrained notifications
    pub notifications: usize,
}

impl SessionView {
    /// Label of the active entry
    #[must_use]
    pub fn active_label(&self) -> Option<&str> {
        self.active
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn is_comparing(&self) -> bool {
        self.comparison.is_some()
    }
}
