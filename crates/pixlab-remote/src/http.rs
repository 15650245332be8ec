//! HTTP implementation of [`RemoteService`]
//!
//! Every request is a multipart form with the image under `file` (or
//! repeated `files` parts for batches). Image endpoints answer with raw
//! bytes; batch and report endpoints answer with JSON.

use crate::batch::{decode_batch_response, BatchItem, BatchRequest};
use crate::error::RemoteError;
use crate::export::{ExportRequest, ExportedFile, ImageInfo, SessionReport};
use crate::service::RemoteService;
use crate::table::PreparedOperation;
use pixlab_document::BinaryRef;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the image width on `/upload`
pub const WIDTH_HEADER: &str = "x-image-width";
/// Header carrying the image height on `/upload`
pub const HEIGHT_HEADER: &str = "x-image-height";

/// Client for the image service
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// Build a client with the given timeouts
    ///
    /// # Errors
    /// `Transport` when the underlying client cannot be constructed
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// POST a form and return headers and body of a success response
    async fn post(&self, endpoint: &str, form: Form) -> Result<(HeaderMap, Vec<u8>), RemoteError> {
        let url = self.url(endpoint);
        debug!(%url, "POST");
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "service rejected request");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        debug!(%url, bytes = body.len(), "response received");
        Ok((headers, body))
    }

    /// POST to an endpoint that answers with a binary file
    async fn post_binary(
        &self,
        endpoint: &str,
        form: Form,
    ) -> Result<(HeaderMap, Vec<u8>), RemoteError> {
        let (headers, body) = self.post(endpoint, form).await?;
        if is_json(&headers) {
            return Err(RemoteError::decode(format!(
                "{endpoint} answered with JSON where a file was expected"
            )));
        }
        if body.is_empty() {
            return Err(RemoteError::decode(format!("{endpoint} answered with an empty body")));
        }
        Ok((headers, body))
    }
}

fn file_part(image: &BinaryRef) -> Part {
    Part::bytes(image.bytes().to_vec()).file_name(image.name().to_string())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn media_type(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| fallback.to_string(), str::to_string)
}

fn dimension(headers: &HeaderMap, name: &str) -> Result<u32, RemoteError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| RemoteError::decode(format!("missing {name} header")))?
        .trim()
        .parse()
        .map_err(|_| RemoteError::decode(format!("{name} header is not an integer")))
}

#[async_trait::async_trait]
impl RemoteService for HttpRemote {
    async fn process(
        &self,
        image: BinaryRef,
        operation: PreparedOperation,
    ) -> Result<BinaryRef, RemoteError> {
        let mut form = Form::new().part("file", file_part(&image));
        for field in operation.fields {
            form = form.text(field.name, field.value);
        }
        let (_, body) = self.post_binary(operation.endpoint, form).await?;
        Ok(BinaryRef::new(image.name(), body))
    }

    async fn process_batch(&self, request: BatchRequest) -> Result<Vec<BatchItem>, RemoteError> {
        let mut form = Form::new();
        for input in &request.inputs {
            form = form.part("files", file_part(input));
        }
        let form = form
            .text("operation", request.operation.as_str())
            .text("params", request.params.to_string());
        let (_, body) = self.post("/batch_process", form).await?;
        decode_batch_response(&body, request.inputs.len())
    }

    async fn export(&self, request: ExportRequest) -> Result<ExportedFile, RemoteError> {
        let filename = request.filename();
        let form = Form::new()
            .part("file", file_part(&request.image))
            .text("format", request.format.wire_name())
            .text("quality", request.quality.to_string());
        let (headers, body) = self.post_binary("/export", form).await?;
        Ok(ExportedFile {
            media_type: media_type(&headers, request.format.media_type()),
            file: BinaryRef::new(filename, body),
        })
    }

    async fn export_pdf(&self, image: BinaryRef) -> Result<ExportedFile, RemoteError> {
        let form = Form::new().part("file", file_part(&image));
        let (headers, body) = self.post_binary("/export_pdf", form).await?;
        Ok(ExportedFile {
            media_type: media_type(&headers, "application/pdf"),
            file: BinaryRef::new("image_report.pdf", body),
        })
    }

    async fn create_report(
        &self,
        original: BinaryRef,
        operations: Vec<String>,
    ) -> Result<SessionReport, RemoteError> {
        let operations = serde_json::to_string(&operations)
            .map_err(|e| RemoteError::invalid("operations", e.to_string()))?;
        let form = Form::new()
            .part("file", file_part(&original))
            .text("operations", operations);
        let (_, body) = self.post("/create_report", form).await?;
        serde_json::from_slice(&body)
            .map_err(|e| RemoteError::decode(format!("report is not valid JSON: {e}")))
    }

    async fn inspect(&self, image: BinaryRef) -> Result<ImageInfo, RemoteError> {
        let form = Form::new().part("file", file_part(&image));
        let (headers, _) = self.post("/upload", form).await?;
        Ok(ImageInfo {
            width: dimension(&headers, WIDTH_HEADER)?,
            height: dimension(&headers, HEIGHT_HEADER)?,
        })
    }
}
