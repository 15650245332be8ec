//! Comparison Controller
//!
//! Holds at most one ephemeral original/processed pairing for side-by-side
//! review. The preview is computed against the visible `current` payload,
//! not the original, and it never touches history.

use crate::dispatcher::{Completed, Plan, TransformationDispatcher};
use crate::error::EditorError;
use pixlab_document::{BinaryRef, Workspace};
use pixlab_remote::{OperationId, Parameters};
use tracing::info;

/// A transient side-by-side pairing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonSnapshot {
    /// The payload displayed when the preview was requested
    pub original_ref: BinaryRef,
    /// The previewed result
    pub processed_ref: BinaryRef,
    /// Label of the previewed operation
    pub label: String,
}

/// Holds at most one side-by-side preview; never touches history
#[derive(Debug, Default)]
pub struct ComparisonController {
    snapshot: Option<ComparisonSnapshot>,
}

impl ComparisonController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a preview request against the visible payload
    ///
    /// # Errors
    /// `NoDocument` if nothing is loaded, `InvalidRequest` for bad parameters
    pub fn plan(
        &self,
        dispatcher: &TransformationDispatcher,
        workspace: &Workspace,
        id: OperationId,
        params: &Parameters,
    ) -> Result<Plan, EditorError> {
        let current = workspace.document().current()?.clone();
        dispatcher.plan_against(current, id, params)
    }

    /// Show a finished preview, replacing any previous one
    pub fn enter(&mut self, shown: BinaryRef, completed: Completed) -> &ComparisonSnapshot {
        info!(label = %completed.label, "comparison shown");
        self.snapshot.insert(ComparisonSnapshot {
            original_ref: shown,
            processed_ref: completed.result,
            label: completed.label,
        })
    }

    /// Discard the preview; returns whether one was shown
    pub fn exit(&mut self) -> bool {
        let was_active = self.snapshot.take().is_some();
        if was_active {
            info!("comparison closed");
        }
        was_active
    }

    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Option<&ComparisonSnapshot> {
        self.snapshot.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.snapshot.is_some()
    }
}
