//! Editor session façade
//!
//! [`EditorSession`] is the explicitly constructed owner of one editing
//! session: workspace (document and history), selected tool, comparison
//! snapshot, batch orchestrator and notification queue.
//!
//! # Concurrency
//!
//! All methods take `&self`; state sits behind one mutex that is never held
//! across a remote call. Every call that mutates the session or reads the
//! payload takes the [`BusyFlag`] first, including tool selection and
//! leaving comparison. A call arriving while the flag is held fails with
//! [`EditorError::Busy`] and is not queued. [`view`] and
//! [`drain_notifications`] stay available while busy.
//!
//! # Failure
//!
//! A failed call leaves document, history, pending batch set and
//! comparison exactly as they were and queues a notification.
//!
//! [`view`]: EditorSession::view
//! [`drain_notifications`]: EditorSession::drain_notifications

use crate::batch::{BatchOrchestrator, BatchResult, SubmitOutcome};
use crate::busy::{BusyFlag, BusyGuard};
use crate::comparison::{ComparisonController, ComparisonSnapshot};
use crate::config::{ConfigError, EditorConfig};
use crate::dispatcher::TransformationDispatcher;
use crate::error::EditorError;
use crate::notify::{
    Notification, Notifications, BATCH_LIMIT, LOAD_FIRST, NOTHING_TO_REDO, NOTHING_TO_UNDO,
    NO_SUCH_ENTRY, NO_SUCH_PENDING, SELECT_TOOL_FIRST, WAIT_FOR_CURRENT,
};
use crate::tool::Tool;
use crate::view::{BatchSummary, SessionView};
use parking_lot::Mutex;
use pixlab_document::{BinaryRef, DocumentError, History, HistoryEntry, Workspace};
use pixlab_remote::{
    BatchOperation, ExportFormat, ExportRequest, ExportedFile, HttpRemote, ImageInfo,
    OperationId, Parameters, RemoteError, RemoteService, SessionReport,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct EditorState {
    workspace: Workspace,
    tool: Tool,
    comparison: ComparisonController,
    batch: BatchOrchestrator,
    notifications: Notifications,
}

impl EditorState {
    /// Queue the user-facing warning for a locally rejected call
    fn notify_rejection(&mut self, err: &EditorError) {
        match err {
            EditorError::NoDocument => self.notifications.warning(LOAD_FIRST),
            EditorError::NoToolSelected => self.notifications.warning(SELECT_TOOL_FIRST),
            EditorError::Busy => self.notifications.warning(WAIT_FOR_CURRENT),
            EditorError::BatchEmpty => {
                self.notifications.warning("No images selected for batch processing");
            }
            EditorError::InvalidRequest(source) => {
                self.notifications.warning(format!("Invalid parameters: {source}"));
            }
            EditorError::BatchIndex { .. } => self.notifications.warning(NO_SUCH_PENDING),
            EditorError::History(DocumentError::NothingToUndo) => {
                self.notifications.warning(NOTHING_TO_UNDO);
            }
            EditorError::History(DocumentError::NothingToRedo) => {
                self.notifications.warning(NOTHING_TO_REDO);
            }
            EditorError::History(DocumentError::IndexOutOfRange { .. }) => {
                self.notifications.warning(NO_SUCH_ENTRY);
            }
            EditorError::History(DocumentError::NotLoaded) => {
                self.notifications.warning(LOAD_FIRST);
            }
            // Remote failures are reported by the caller with the operation label
            EditorError::Remote { .. } | EditorError::Decode { .. } => {}
        }
    }

    fn selected(&self) -> Result<(OperationId, Parameters), EditorError> {
        self.workspace.document().original()?;
        self.tool
            .as_operation()
            .map(|(id, params)| (id, params.clone()))
            .ok_or(EditorError::NoToolSelected)
    }
}

/// One interactive editing session
pub struct EditorSession {
    config: EditorConfig,
    remote: Arc<dyn RemoteService>,
    dispatcher: TransformationDispatcher,
    busy: BusyFlag,
    state: Mutex<EditorState>,
}

impl EditorSession {
    /// Session over an arbitrary remote service
    pub fn new(config: EditorConfig, remote: Arc<dyn RemoteService>) -> Self {
        Self {
            dispatcher: TransformationDispatcher::new(Arc::clone(&remote)),
            config,
            remote,
            busy: BusyFlag::new(),
            state: Mutex::new(EditorState::default()),
        }
    }

    /// Session talking HTTP to `config.backend_url`
    ///
    /// # Errors
    /// `Invalid` for a configuration failing validation, `Client` if the
    /// HTTP client cannot be built
    pub fn connect(config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let remote = HttpRemote::new(
            config.backend_url.clone(),
            config.request_timeout(),
            config.connect_timeout(),
        )?;
        info!(backend = %config.backend_url, "session connected");
        Ok(Self::new(config, Arc::new(remote)))
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    // ── Guards ──────────────────────────────────────────────────────────────

    fn acquire(&self, action: &'static str) -> Result<BusyGuard, EditorError> {
        self.busy.acquire().map_err(|err| {
            warn!(action, "rejected: session busy");
            self.state.lock().notifications.warning(WAIT_FOR_CURRENT);
            err
        })
    }

    /// Run a check against the state, queueing a warning if it fails
    fn checked<T>(
        &self,
        check: impl FnOnce(&mut EditorState) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let mut state = self.state.lock();
        let result = check(&mut *state);
        if let Err(err) = &result {
            debug!(error = %err, "rejected");
            state.notify_rejection(err);
        }
        result
    }

    /// Await a non-mutating remote read and report its outcome
    async fn remote_read<T>(
        &self,
        label: &'static str,
        call: impl Future<Output = Result<T, RemoteError>>,
        success: impl FnOnce(&T) -> String,
        failure: &'static str,
    ) -> Result<T, EditorError> {
        match call.await {
            Ok(value) => {
                self.state.lock().notifications.success(success(&value));
                Ok(value)
            }
            Err(source) => {
                warn!(label, error = %source, "remote read failed");
                self.state.lock().notifications.error(failure);
                Err(EditorError::from_remote(label, source))
            }
        }
    }

    // ── Document lifecycle ──────────────────────────────────────────────────

    /// Load a new source image
    ///
    /// Sets original and current, resets history to `[Original]` and exits
    /// comparison.
    ///
    /// # Errors
    /// `Busy` while another call is in flight
    pub fn load(&self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<(), EditorError> {
        let _guard = self.acquire("load")?;
        let source = BinaryRef::new(name, bytes);
        let mut state = self.state.lock();
        state.comparison.exit();
        info!(name = source.name(), bytes = source.len(), "document loaded");
        state.workspace.load(source);
        Ok(())
    }

    /// Original payload, if loaded
    #[must_use]
    pub fn original(&self) -> Option<BinaryRef> {
        self.state.lock().workspace.document().original().ok().cloned()
    }

    /// Current payload, if loaded
    #[must_use]
    pub fn current(&self) -> Option<BinaryRef> {
        self.state.lock().workspace.document().current().ok().cloned()
    }

    /// Snapshot of the timeline
    #[must_use]
    pub fn history(&self) -> History {
        self.state.lock().workspace.history().clone()
    }

    // ── Tools ───────────────────────────────────────────────────────────────

    /// Select a tool; leaves comparison mode
    ///
    /// # Errors
    /// `Busy` while another call is in flight
    pub fn select_tool(&self, tool: Tool) -> Result<(), EditorError> {
        let _guard = self.acquire("select_tool")?;
        let mut state = self.state.lock();
        debug!(%tool, "tool selected");
        state.tool = tool;
        state.comparison.exit();
        Ok(())
    }

    /// Set one parameter of the selected tool; ignored for `Select`
    ///
    /// # Errors
    /// `Busy` while another call is in flight
    pub fn set_tool_parameter(&self, key: &str, value: impl ToString) -> Result<(), EditorError> {
        let _guard = self.acquire("set_tool_parameter")?;
        self.state.lock().tool.set_parameter(key, value);
        Ok(())
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.state.lock().tool.clone()
    }

    // ── Transformation dispatch ─────────────────────────────────────────────

    /// Apply an operation to the original and record the result
    ///
    /// # Errors
    /// - `Busy` while another call is in flight
    /// - `NoDocument`, `InvalidRequest` before any remote call
    /// - `Remote` / `Decode` carrying the operation label; nothing changes
    pub async fn apply(
        &self,
        id: OperationId,
        params: &Parameters,
    ) -> Result<HistoryEntry, EditorError> {
        let guard = self.acquire("apply")?;
        self.apply_held(guard, id, params).await
    }

    /// Apply the selected tool with its parameters
    ///
    /// # Errors
    /// As [`Self::apply`], plus `NoToolSelected` for `Select`
    pub async fn apply_selected(&self) -> Result<HistoryEntry, EditorError> {
        let guard = self.acquire("apply")?;
        let (id, params) = self.checked(|state| state.selected())?;
        self.apply_held(guard, id, &params).await
    }

    async fn apply_held(
        &self,
        _guard: BusyGuard,
        id: OperationId,
        params: &Parameters,
    ) -> Result<HistoryEntry, EditorError> {
        let plan = self.checked(|state| self.dispatcher.plan(&state.workspace, id, params))?;
        let label = plan.label().to_string();
        info!(operation = %id, %label, "apply started");

        match self.dispatcher.execute(plan).await {
            Ok(completed) => {
                let mut state = self.state.lock();
                let entry = completed.commit(&mut state.workspace)?;
                state.notifications.success(format!("Applied {label}"));
                Ok(entry)
            }
            Err(err) => {
                self.state
                    .lock()
                    .notifications
                    .error(format!("Error applying {label}"));
                Err(err)
            }
        }
    }

    // ── History navigation ──────────────────────────────────────────────────

    /// Step back one entry and restore its payload
    ///
    /// # Errors
    /// `Busy`, or `History(NothingToUndo)` at the root
    pub fn undo(&self) -> Result<HistoryEntry, EditorError> {
        let _guard = self.acquire("undo")?;
        let entry = self.checked(|state| Ok(state.workspace.undo()?.clone()))?;
        let cursor = self.state.lock().workspace.history().cursor();
        info!(label = entry.label(), ?cursor, "undo");
        Ok(entry)
    }

    /// Step forward one entry and restore its payload
    ///
    /// # Errors
    /// `Busy`, or `History(NothingToRedo)` at the last entry
    pub fn redo(&self) -> Result<HistoryEntry, EditorError> {
        let _guard = self.acquire("redo")?;
        let entry = self.checked(|state| Ok(state.workspace.redo()?.clone()))?;
        let cursor = self.state.lock().workspace.history().cursor();
        info!(label = entry.label(), ?cursor, "redo");
        Ok(entry)
    }

    /// Jump to any entry and restore its payload
    ///
    /// # Errors
    /// `Busy`, or `History(IndexOutOfRange)`
    pub fn goto(&self, index: usize) -> Result<HistoryEntry, EditorError> {
        let _guard = self.acquire("goto")?;
        let entry = self.checked(|state| Ok(state.workspace.goto(index)?.clone()))?;
        info!(label = entry.label(), index, "history jump");
        Ok(entry)
    }

    /// Empty the timeline; the displayed payload stays as it is
    ///
    /// # Errors
    /// `Busy` while another call is in flight
    pub fn clear_history(&self) -> Result<(), EditorError> {
        let _guard = self.acquire("clear_history")?;
        self.state.lock().workspace.clear_history();
        info!("history cleared");
        Ok(())
    }

    // ── Batch ───────────────────────────────────────────────────────────────

    /// Add files to the pending batch, clipping at capacity
    ///
    /// # Errors
    /// `Busy` while another call is in flight
    pub fn submit_batch(
        &self,
        files: impl IntoIterator<Item = BinaryRef>,
    ) -> Result<SubmitOutcome, EditorError> {
        let _guard = self.acquire("submit_batch")?;
        let mut state = self.state.lock();
        let outcome = state.batch.submit(files);
        if outcome.capacity_exceeded() {
            state.notifications.warning(BATCH_LIMIT);
        }
        Ok(outcome)
    }

    /// Remove one pending batch file
    ///
    /// # Errors
    /// `Busy`, or `BatchIndex` outside the pending set
    pub fn remove_pending(&self, index: usize) -> Result<BinaryRef, EditorError> {
        let _guard = self.acquire("remove_pending")?;
        self.checked(|state| state.batch.remove(index))
    }

    /// Drop every pending batch file
    ///
    /// # Errors
    /// `Busy` while another call is in flight
    pub fn clear_pending(&self) -> Result<(), EditorError> {
        let _guard = self.acquire("clear_pending")?;
        self.state.lock().batch.clear_pending();
        Ok(())
    }

    /// Run one operation over the pending set in a single remote call
    ///
    /// On success the result replaces the previous one and the pending set
    /// is consumed. On failure both are left as they were.
    ///
    /// # Errors
    /// - `Busy`, `BatchEmpty`, `InvalidRequest` before any remote call
    /// - `Remote` / `Decode` for the whole job
    pub async fn run_batch(
        &self,
        operation: BatchOperation,
        params: &Parameters,
    ) -> Result<BatchResult, EditorError> {
        let _guard = self.acquire("run_batch")?;
        let job = self.checked(|state| state.batch.prepare(operation, params))?;

        match BatchOrchestrator::execute(self.remote.as_ref(), job).await {
            Ok(result) => {
                let mut state = self.state.lock();
                let result = state.batch.complete(result).clone();
                state.notifications.success(format!(
                    "Batch processing complete: {} images with {operation}",
                    result.len()
                ));
                Ok(result)
            }
            Err(err) => {
                self.state.lock().notifications.error("Error processing batch");
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn batch_result(&self) -> Option<BatchResult> {
        self.state.lock().batch.result().cloned()
    }

    // ── Comparison ──────────────────────────────────────────────────────────

    /// Preview an operation on the visible payload, side by side
    ///
    /// History is never touched.
    ///
    /// # Errors
    /// - `Busy`, `NoDocument`, `InvalidRequest` before any remote call
    /// - `Remote` / `Decode`; any previous snapshot stays
    pub async fn enter_comparison(
        &self,
        id: OperationId,
        params: &Parameters,
    ) -> Result<ComparisonSnapshot, EditorError> {
        let guard = self.acquire("enter_comparison")?;
        self.compare_held(guard, id, params).await
    }

    /// Preview the selected tool
    ///
    /// # Errors
    /// As [`Self::enter_comparison`], plus `NoToolSelected` for `Select`
    pub async fn enter_comparison_selected(&self) -> Result<ComparisonSnapshot, EditorError> {
        let guard = self.acquire("enter_comparison")?;
        let (id, params) = self.checked(|state| state.selected())?;
        self.compare_held(guard, id, &params).await
    }

    async fn compare_held(
        &self,
        _guard: BusyGuard,
        id: OperationId,
        params: &Parameters,
    ) -> Result<ComparisonSnapshot, EditorError> {
        let plan = self.checked(|state| {
            state
                .comparison
                .plan(&self.dispatcher, &state.workspace, id, params)
        })?;
        let shown = plan.source().clone();

        match self.dispatcher.execute(plan).await {
            Ok(completed) => {
                let mut state = self.state.lock();
                let snapshot = state.comparison.enter(shown, completed).clone();
                state.notifications.success("Showing side-by-side comparison");
                Ok(snapshot)
            }
            Err(err) => {
                self.state.lock().notifications.error("Error creating comparison");
                Err(err)
            }
        }
    }

    /// Leave comparison mode; returns whether a snapshot was shown
    ///
    /// # Errors
    /// `Busy` while another call is in flight, so a pending preview cannot
    /// reappear after the user left
    pub fn exit_comparison(&self) -> Result<bool, EditorError> {
        let _guard = self.acquire("exit_comparison")?;
        let mut state = self.state.lock();
        let was_active = state.comparison.exit();
        if was_active {
            state.notifications.success("Exited comparison mode");
        }
        Ok(was_active)
    }

    #[must_use]
    pub fn comparison(&self) -> Option<ComparisonSnapshot> {
        self.state.lock().comparison.snapshot().cloned()
    }

    // ── Export and reporting ────────────────────────────────────────────────

    /// Encode the current payload
    ///
    /// # Errors
    /// - `Busy`, `NoDocument`, `InvalidRequest` (quality outside 1..=100)
    /// - `Remote` / `Decode`
    pub async fn export(&self, format: ExportFormat, quality: u8) -> Result<ExportedFile, EditorError> {
        let _guard = self.acquire("export")?;
        let request = self.checked(|state| {
            let current = state.workspace.document().current()?.clone();
            Ok(ExportRequest::new(current, format, quality)?)
        })?;
        let shown = format.wire_name().to_uppercase();
        self.remote_read(
            "Export",
            self.remote.export(request),
            move |_| format!("Image exported as {shown}"),
            "Error exporting image",
        )
        .await
    }

    /// Render the current payload as a PDF report page
    ///
    /// # Errors
    /// `Busy`, `NoDocument`, `Remote` / `Decode`
    pub async fn export_pdf(&self) -> Result<ExportedFile, EditorError> {
        let _guard = self.acquire("export_pdf")?;
        let current = self.checked(|state| Ok(state.workspace.document().current()?.clone()))?;
        self.remote_read(
            "Export PDF",
            self.remote.export_pdf(current),
            |_| "PDF exported successfully".to_string(),
            "Error exporting PDF",
        )
        .await
    }

    /// Summarize the session: original plus active history labels
    ///
    /// # Errors
    /// `Busy`, `NoDocument`, `Remote` / `Decode`
    pub async fn report(&self) -> Result<SessionReport, EditorError> {
        let _guard = self.acquire("report")?;
        let (original, labels) = self.checked(|state| {
            let original = state.workspace.document().original()?.clone();
            Ok((original, state.workspace.history().active_labels()))
        })?;
        self.remote_read(
            "Report",
            self.remote.create_report(original, labels),
            |report| format!("Report created: {} operations", report.operations_applied),
            "Error creating report",
        )
        .await
    }

    /// Dimensions of the original as reported by the service
    ///
    /// # Errors
    /// `Busy`, `NoDocument`, `Remote` / `Decode`
    pub async fn inspect(&self) -> Result<ImageInfo, EditorError> {
        let _guard = self.acquire("inspect")?;
        let original = self.checked(|state| Ok(state.workspace.document().original()?.clone()))?;
        self.remote_read(
            "Inspect",
            self.remote.inspect(original),
            |info| format!("Image size {info}"),
            "Error reading image info",
        )
        .await
    }

    // ── Projection ──────────────────────────────────────────────────────────

    /// Consistent snapshot for rendering; available while busy
    #[must_use]
    pub fn view(&self) -> SessionView {
        let state = self.state.lock();
        let history = state.workspace.history();
        SessionView {
            labels: history.labels(),
            active: history.cursor(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            busy: self.busy.is_busy(),
            has_document: state.workspace.document().is_loaded(),
            document_name: state
                .workspace
                .document()
                .original()
                .ok()
                .map(|o| o.name().to_string()),
            tool: state.tool.clone(),
            comparison: state.comparison.snapshot().cloned(),
            pending_batch: state
                .batch
                .pending()
                .iter()
                .map(|p| p.name().to_string())
                .collect(),
            batch_result: state.batch.result().map(|r| BatchSummary {
                job_id: r.job_id,
                operation: r.operation,
                count: r.len(),
            }),
            notifications: state.notifications.len(),
        }
    }

    /// Take every queued notification, oldest first
    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.state.lock().notifications.drain()
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("backend", &self.config.backend_url)
            .field("busy", &self.busy.is_busy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Level;
    use pixlab_test_utils::{sample_image, FakeRemote, Failure};
    use pretty_assertions::assert_eq;

    fn session() -> (EditorSession, Arc<FakeRemote>) {
        let fake = FakeRemote::shared();
        (EditorSession::new(EditorConfig::default(), fake.clone()), fake)
    }

    fn loaded() -> (EditorSession, Arc<FakeRemote>) {
        let (session, fake) = session();
        session.load("cat.png", b"cat-pixels".to_vec()).unwrap();
        (session, fake)
    }

    #[test]
    fn load_resets_history() {
        let (session, _) = loaded();
        let view = session.view();
        assert_eq!(view.labels, vec!["Original"]);
        assert_eq!(view.active, Some(0));
        assert!(!view.can_undo);
        assert_eq!(view.document_name.as_deref(), Some("cat.png"));
    }

    #[tokio::test]
    async fn apply_without_document_warns() {
        let (session, fake) = session();
        let err = session.apply(OperationId::Grayscale, &Parameters::new()).await.unwrap_err();
        assert_eq!(err, EditorError::NoDocument);
        assert_eq!(fake.call_count(), 0);
        let notes = session.drain_notifications();
        assert_eq!(notes[0].message, LOAD_FIRST);
        assert_eq!(notes[0].level, Level::Warning);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn apply_selected_requires_tool() {
        let (session, fake) = loaded();
        let err = session.apply_selected().await.unwrap_err();
        assert_eq!(err, EditorError::NoToolSelected);
        assert_eq!(session.drain_notifications()[0].message, SELECT_TOOL_FIRST);

        session.select_tool(Tool::operation(OperationId::MorphEdge)).unwrap();
        session.set_tool_parameter("op", "dilate").unwrap();
        let entry = session.apply_selected().await.unwrap();
        assert_eq!(entry.label(), "Morphology: dilate");
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn apply_notifies_success_and_failure() {
        let (session, fake) = loaded();
        session.apply(OperationId::Grayscale, &Parameters::new()).await.unwrap();
        fake.fail_next(Failure::Status(500));
        session
            .apply(OperationId::Convolution, &Parameters::new().with("op", "sharpen"))
            .await
            .unwrap_err();

        let messages: Vec<_> = session
            .drain_notifications()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            messages,
            vec!["[ok] Applied Grayscale", "[error] Error applying Filter: sharpen"]
        );
    }

    #[tokio::test]
    async fn selecting_a_tool_exits_comparison() {
        let (session, _) = loaded();
        session
            .enter_comparison(OperationId::Grayscale, &Parameters::new())
            .await
            .unwrap();
        assert!(session.view().is_comparing());

        session.select_tool(Tool::operation(OperationId::Threshold)).unwrap();
        assert!(session.comparison().is_none());
    }

    #[tokio::test]
    async fn load_exits_comparison() {
        let (session, _) = loaded();
        session
            .enter_comparison(OperationId::Grayscale, &Parameters::new())
            .await
            .unwrap();
        session.load("dog.png", b"dog".to_vec()).unwrap();
        assert!(session.comparison().is_none());
        assert_eq!(session.view().labels, vec!["Original"]);
    }

    #[tokio::test]
    async fn clear_history_keeps_current() {
        let (session, _) = loaded();
        session.apply(OperationId::Grayscale, &Parameters::new()).await.unwrap();
        let current = session.current().unwrap();

        session.clear_history().unwrap();
        let view = session.view();
        assert!(view.labels.is_empty());
        assert_eq!(view.active, None);
        assert!(!view.can_undo);
        assert_eq!(session.current().unwrap(), current);
        assert!(session.undo().unwrap_err().is_precondition());

        let entry = session.apply(OperationId::Grayscale, &Parameters::new()).await.unwrap();
        assert_eq!(entry.label(), "Grayscale");
        assert_eq!(session.view().active, Some(0));
    }

    #[test]
    fn failed_navigation_warns() {
        let (session, _) = loaded();
        assert!(session.undo().unwrap_err().is_precondition());
        assert!(session.redo().unwrap_err().is_precondition());
        assert!(session.goto(7).unwrap_err().is_precondition());
        assert!(session.remove_pending(0).unwrap_err().is_precondition());

        let notes = session.drain_notifications();
        assert!(notes.iter().all(|n| n.level == Level::Warning));
        let messages: Vec<_> = notes.into_iter().map(|n| n.message).collect();
        assert_eq!(
            messages,
            vec![NOTHING_TO_UNDO, NOTHING_TO_REDO, NO_SUCH_ENTRY, NO_SUCH_PENDING]
        );
        assert_eq!(session.view().active, Some(0));
    }

    #[tokio::test]
    async fn export_uses_current() {
        let (session, fake) = loaded();
        session.apply(OperationId::Grayscale, &Parameters::new()).await.unwrap();
        let current = session.current().unwrap();

        let file = session.export(ExportFormat::Jpeg, 90).await.unwrap();
        assert_eq!(file.filename(), "exported_image.jpg");
        assert_eq!(fake.last_call().unwrap().inputs, vec![current.hash()]);
        assert_eq!(
            session.drain_notifications().last().unwrap().message,
            "Image exported as JPG"
        );
    }

    #[tokio::test]
    async fn export_rejects_bad_quality_locally() {
        let (session, fake) = loaded();
        let err = session.export(ExportFormat::Jpeg, 0).await.unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn report_sends_original_and_active_labels() {
        let (session, fake) = loaded();
        session.apply(OperationId::Grayscale, &Parameters::new()).await.unwrap();
        session
            .apply(OperationId::Convolution, &Parameters::new().with("op", "blur"))
            .await
            .unwrap();
        session.undo().unwrap();

        let report = session.report().await.unwrap();
        assert_eq!(report.operations, vec!["Original", "Grayscale"]);
        assert_eq!(report.original_filename, "cat.png");
        let original = session.original().unwrap();
        assert_eq!(fake.last_call().unwrap().inputs, vec![original.hash()]);
    }

    #[tokio::test]
    async fn inspect_and_pdf() {
        let (session, _) = loaded();
        let info = session.inspect().await.unwrap();
        assert_eq!((info.width, info.height), (640, 480));
        let pdf = session.export_pdf().await.unwrap();
        assert_eq!(pdf.filename(), "image_report.pdf");
        assert_eq!(pdf.media_type, "application/pdf");
    }

    #[tokio::test]
    async fn batch_run_clears_pending_and_records_summary() {
        let (session, _) = session();
        session
            .submit_batch(vec![sample_image("a.png"), sample_image("b.png")])
            .unwrap();
        let result = session
            .run_batch(BatchOperation::Canny, &Parameters::new())
            .await
            .unwrap();
        assert_eq!(result.len(), 2);

        let view = session.view();
        assert!(view.pending_batch.is_empty());
        let summary = view.batch_result.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.operation, BatchOperation::Canny);
        assert!(view.labels.is_empty(), "batch never touches history");
    }
}
