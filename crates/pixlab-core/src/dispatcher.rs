//! Transformation Dispatcher
//!
//! Maps an operation id and its parameters to exactly one remote call via
//! the [`CommandTable`]. Dispatch is split in three steps so the session
//! never holds its state lock across the remote call:
//!
//! 1. [`TransformationDispatcher::plan`]: preconditions and validation
//!    against a borrowed [`Workspace`], no I/O
//! 2. [`TransformationDispatcher::execute`]: the remote call
//! 3. [`Completed::commit`]: append to history and replace `current`
//!
//! Every plan sources `Document.original`, so results never compound and
//! any entry can be reproduced from the original alone.

use crate::error::EditorError;
use pixlab_document::{BinaryRef, HistoryEntry, Workspace};
use pixlab_remote::{CommandTable, OperationId, Parameters, PreparedOperation, RemoteService};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A validated request waiting for its remote call
#[derive(Debug, Clone)]
pub struct Plan {
    source: BinaryRef,
    prepared: PreparedOperation,
}

impl Plan {
    /// Payload the request will carry
    #[inline]
    #[must_use]
    pub fn source(&self) -> &BinaryRef {
        &self.source
    }

    /// History label the result will get
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.prepared.label
    }

    #[inline]
    #[must_use]
    pub fn prepared(&self) -> &PreparedOperation {
        &self.prepared
    }
}

/// A successful remote result not yet recorded
#[derive(Debug, Clone)]
pub struct Completed {
    pub label: String,
    pub result: BinaryRef,
}

impl Completed {
    /// Record the result: truncate the undone branch, append, set `current`
    ///
    /// # Errors
    /// `NoDocument` if the document disappeared meanwhile
    pub fn commit(self, workspace: &mut Workspace) -> Result<HistoryEntry, EditorError> {
        let entry = workspace.commit(self.label, self.result)?.clone();
        info!(
            label = entry.label(),
            cursor = ?workspace.history().cursor(),
            "operation committed"
        );
        Ok(entry)
    }
}

/// Table-driven single-image dispatch
#[derive(Clone)]
pub struct TransformationDispatcher {
    table: CommandTable,
    remote: Arc<dyn RemoteService>,
}

impl TransformationDispatcher {
    /// Dispatcher over the standard command table
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self {
            table: CommandTable::standard(),
            remote,
        }
    }

    /// Validate an apply against the original
    ///
    /// # Errors
    /// - `NoDocument` if nothing is loaded
    /// - `InvalidRequest` for unknown operations or bad parameters
    pub fn plan(
        &self,
        workspace: &Workspace,
        id: OperationId,
        params: &Parameters,
    ) -> Result<Plan, EditorError> {
        let source = workspace.document().original()?.clone();
        self.plan_against(source, id, params)
    }

    /// Validate a request against an explicit source payload
    ///
    /// # Errors
    /// `InvalidRequest` for unknown operations or bad parameters
    pub fn plan_against(
        &self,
        source: BinaryRef,
        id: OperationId,
        params: &Parameters,
    ) -> Result<Plan, EditorError> {
        let prepared = self.table.prepare(id, params).map_err(EditorError::InvalidRequest)?;
        debug!(operation = %id, label = %prepared.label, "request prepared");
        Ok(Plan { source, prepared })
    }

    /// Issue the remote call for a plan
    ///
    /// # Errors
    /// `Remote` or `Decode` carrying the plan's label
    pub async fn execute(&self, plan: Plan) -> Result<Completed, EditorError> {
        let label = plan.prepared.label.clone();
        debug!(%label, endpoint = plan.prepared.endpoint, "dispatching");
        match self.remote.process(plan.source, plan.prepared).await {
            Ok(result) => Ok(Completed { label, result }),
            Err(source) => {
                warn!(%label, error = %source, "dispatch failed");
                Err(EditorError::from_remote(label, source))
            }
        }
    }
}

impl std::fmt::Debug for TransformationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformationDispatcher")
            .field("operations", &self.table.len())
            .finish_non_exhaustive()
    }
}
