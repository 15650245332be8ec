//! Testing utilities for the PixelLab workspace
//!
//! Shared fixtures plus [`FakeRemote`], an in-memory image service whose
//! output is a pure function of endpoint, fields and input hash.

#![allow(missing_docs)]

use parking_lot::Mutex;
use pixlab_document::{BinaryRef, ContentHash};
use pixlab_remote::{
    BatchItem, BatchRequest, ExportRequest, ExportedFile, ImageInfo, PreparedOperation,
    RemoteError, RemoteService, SessionReport,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Fixed dimensions reported by [`FakeRemote::inspect`]
pub const FAKE_DIMENSIONS: ImageInfo = ImageInfo {
    width: 640,
    height: 480,
};

/// A named payload with distinct bytes
pub fn sample_image(name: &str) -> BinaryRef {
    BinaryRef::new(name, format!("image-bytes:{name}").into_bytes())
}

/// `count` distinct payloads named `img_<i>.png`
pub fn sample_images(count: usize) -> Vec<BinaryRef> {
    (0..count)
        .map(|i| sample_image(&format!("img_{i}.png")))
        .collect()
}

/// Failure modes the fake can inject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Non-success status with a body
    Status(u16),
    /// Payload that cannot be decoded
    Decode,
    /// Connection-level failure
    Transport,
}

impl Failure {
    fn into_error(self, endpoint: &str) -> RemoteError {
        match self {
            Self::Status(status) => RemoteError::Status {
                status,
                body: format!("injected failure on {endpoint}"),
            },
            Self::Decode => RemoteError::decode(format!("injected garbage from {endpoint}")),
            Self::Transport => RemoteError::Transport("connection refused".into()),
        }
    }
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub endpoint: String,
    /// Hash of each uploaded file, in order
    pub inputs: Vec<ContentHash>,
    /// Text fields as `name=value`
    pub fields: Vec<String>,
}

/// Holds calls in flight until released
///
/// Obtained from [`FakeRemote::hold`]. Every call entering the fake signals
/// [`Gate::entered`] and then waits for [`Gate::release`].
#[derive(Debug, Default)]
pub struct Gate {
    entered: Notify,
    released: Notify,
}

impl Gate {
    /// Wait until a call is parked on the gate
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let one parked call proceed
    pub fn release(&self) {
        self.released.notify_one();
    }
}

/// Deterministic in-memory [`RemoteService`]
#[derive(Debug, Default)]
pub struct FakeRemote {
    count: AtomicUsize,
    calls: Mutex<Vec<Call>>,
    next_failures: Mutex<VecDeque<Failure>>,
    sticky_failure: Mutex<Option<Failure>>,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, ready to hand to a session
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Fail the next call only
    pub fn fail_next(&self, failure: Failure) {
        self.next_failures.lock().push_back(failure);
    }

    /// Fail every call until [`FakeRemote::heal`]
    pub fn fail_always(&self, failure: Failure) {
        *self.sticky_failure.lock() = Some(failure);
    }

    pub fn heal(&self) {
        self.next_failures.lock().clear();
        *self.sticky_failure.lock() = None;
    }

    /// Park subsequent calls on a gate
    pub fn hold(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Stop parking calls
    pub fn unhold(&self) {
        *self.gate.lock() = None;
    }

    /// Number of calls that reached the fake, failed ones included
    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().last().cloned()
    }

    /// What [`RemoteService::process`] returns for these inputs
    pub fn expected_output(image: &BinaryRef, operation: &PreparedOperation) -> BinaryRef {
        let fields: Vec<String> = operation
            .fields
            .iter()
            .map(|f| format!("{}={}", f.name, f.value))
            .collect();
        BinaryRef::new(
            image.name(),
            format!("{}?{}#{}", operation.endpoint, fields.join("&"), image.hash()).into_bytes(),
        )
    }

    async fn enter(
        &self,
        endpoint: &str,
        inputs: Vec<ContentHash>,
        fields: Vec<String>,
    ) -> Result<(), RemoteError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(Call {
            endpoint: endpoint.to_string(),
            inputs,
            fields,
        });

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.released.notified().await;
        }

        let failure = self
            .next_failures
            .lock()
            .pop_front()
            .or_else(|| self.sticky_failure.lock().clone());
        match failure {
            Some(failure) => Err(failure.into_error(endpoint)),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl RemoteService for FakeRemote {
    async fn process(
        &self,
        image: BinaryRef,
        operation: PreparedOperation,
    ) -> Result<BinaryRef, RemoteError> {
        let fields = operation
            .fields
            .iter()
            .map(|f| format!("{}={}", f.name, f.value))
            .collect();
        self.enter(operation.endpoint, vec![image.hash()], fields).await?;
        Ok(Self::expected_output(&image, &operation))
    }

    async fn process_batch(&self, request: BatchRequest) -> Result<Vec<BatchItem>, RemoteError> {
        let fields = vec![
            format!("operation={}", request.operation),
            format!("params={}", request.params),
        ];
        let inputs = request.inputs.iter().map(BinaryRef::hash).collect();
        self.enter("/batch_process", inputs, fields).await?;
        Ok(request
            .inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let filename = format!("processed_{}_{}", i + 1, input.name());
                let bytes = format!("batch:{}:{}#{}", request.operation, request.params, input.hash());
                BatchItem {
                    image: BinaryRef::new(filename.clone(), bytes.into_bytes()),
                    filename,
                    original_filename: Some(input.name().to_string()),
                }
            })
            .collect())
    }

    async fn export(&self, request: ExportRequest) -> Result<ExportedFile, RemoteError> {
        let fields = vec![
            format!("format={}", request.format),
            format!("quality={}", request.quality),
        ];
        self.enter("/export", vec![request.image.hash()], fields).await?;
        let bytes = format!("export:{}:{}#{}", request.format, request.quality, request.image.hash());
        Ok(ExportedFile {
            media_type: request.format.media_type().to_string(),
            file: BinaryRef::new(request.filename(), bytes.into_bytes()),
        })
    }

    async fn export_pdf(&self, image: BinaryRef) -> Result<ExportedFile, RemoteError> {
        self.enter("/export_pdf", vec![image.hash()], Vec::new()).await?;
        Ok(ExportedFile {
            media_type: "application/pdf".into(),
            file: BinaryRef::new("image_report.pdf", format!("pdf#{}", image.hash()).into_bytes()),
        })
    }

    async fn create_report(
        &self,
        original: BinaryRef,
        operations: Vec<String>,
    ) -> Result<SessionReport, RemoteError> {
        let fields = vec![format!("operations={}", operations.join("|"))];
        self.enter("/create_report", vec![original.hash()], fields).await?;
        Ok(SessionReport {
            timestamp: "1970-01-01 00:00:00".into(),
            original_filename: original.name().to_string(),
            original_dimensions: FAKE_DIMENSIONS.to_string(),
            operations_applied: operations.len(),
            operations,
        })
    }

    async fn inspect(&self, image: BinaryRef) -> Result<ImageInfo, RemoteError> {
        self.enter("/upload", vec![image.hash()], Vec::new()).await?;
        Ok(FAKE_DIMENSIONS)
    }
}
