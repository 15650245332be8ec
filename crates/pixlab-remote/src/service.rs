//! The remote image service seam
//!
//! The service is stateless: each call carries every input it needs and
//! returns a fresh payload. Implementations must be shareable across tasks.

use crate::batch::{BatchItem, BatchRequest};
use crate::error::RemoteError;
use crate::export::{ExportRequest, ExportedFile, ImageInfo, SessionReport};
use crate::table::PreparedOperation;
use pixlab_document::BinaryRef;

/// Remote image processing service
///
/// Implement this trait to swap the HTTP client for a fake or a different
/// transport.
#[async_trait::async_trait]
pub trait RemoteService: Send + Sync {
    /// Apply one prepared operation to `image`
    async fn process(
        &self,
        image: BinaryRef,
        operation: PreparedOperation,
    ) -> Result<BinaryRef, RemoteError>;

    /// Apply one batch operation to every input; results keep input order
    async fn process_batch(&self, request: BatchRequest) -> Result<Vec<BatchItem>, RemoteError>;

    /// Encode `request.image` in the requested format
    async fn export(&self, request: ExportRequest) -> Result<ExportedFile, RemoteError>;

    /// Render a PDF report page for `image`
    async fn export_pdf(&self, image: BinaryRef) -> Result<ExportedFile, RemoteError>;

    /// Summarize a session: original image plus applied operation labels
    async fn create_report(
        &self,
        original: BinaryRef,
        operations: Vec<String>,
    ) -> Result<SessionReport, RemoteError>;

    /// Image dimensions as reported by the service
    async fn inspect(&self, image: BinaryRef) -> Result<ImageInfo, RemoteError>;
}
