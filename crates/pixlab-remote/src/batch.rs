//! Batch contract: one call, many independent images
//!
//! Inputs travel as repeated `files` parts, the operation as a text field
//! and its parameters as a JSON object. The service answers with JSON
//! carrying one base64 payload per input.

use crate::error::RemoteError;
use crate::operation::Parameters;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pixlab_document::BinaryRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest input set the service accepts in one call
pub const MAX_BATCH_SIZE: usize = 10;

/// Operations available for batch processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperation {
    Grayscale,
    Blur,
    Sharpen,
    Canny,
    Threshold,
    HistogramEqualize,
    Denoise,
    Resize,
}

impl BatchOperation {
    pub const ALL: [BatchOperation; 8] = [
        Self::Grayscale,
        Self::Blur,
        Self::Sharpen,
        Self::Canny,
        Self::Threshold,
        Self::HistogramEqualize,
        Self::Denoise,
        Self::Resize,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Blur => "blur",
            Self::Sharpen => "sharpen",
            Self::Canny => "canny",
            Self::Threshold => "threshold",
            Self::HistogramEqualize => "histogram_equalize",
            Self::Denoise => "denoise",
            Self::Resize => "resize",
        }
    }

    /// JSON parameter object for this operation
    ///
    /// Only `resize` takes parameters (`width`, `height`, positive integers,
    /// default 100).
    ///
    /// # Errors
    /// `InvalidParameter` for a non-positive or non-numeric dimension
    pub fn params_json(&self, params: &Parameters) -> Result<serde_json::Value, RemoteError> {
        let mut object = serde_json::Map::new();
        if *self == Self::Resize {
            for key in ["width", "height"] {
                let value = match params.get(key) {
                    None => 100,
                    Some(raw) => match raw.parse::<u32>() {
                        Ok(v) if v > 0 => v,
                        _ => {
                            return Err(RemoteError::invalid(
                                key,
                                format!("`{raw}` is not a positive integer"),
                            ))
                        }
                    },
                };
                object.insert(key.to_string(), serde_json::Value::from(value));
            }
        }
        Ok(serde_json::Value::Object(object))
    }
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchOperation {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RemoteError::UnknownOperation(s.to_string()))
    }
}

/// A validated batch call
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub operation: BatchOperation,
    pub params: serde_json::Value,
    pub inputs: Vec<BinaryRef>,
}

impl BatchRequest {
    /// Validate and assemble a batch call
    ///
    /// # Errors
    /// - `BatchSize` for an empty set or more than [`MAX_BATCH_SIZE`] inputs
    /// - `InvalidParameter` from [`BatchOperation::params_json`]
    pub fn new(
        operation: BatchOperation,
        params: &Parameters,
        inputs: Vec<BinaryRef>,
    ) -> Result<Self, RemoteError> {
        if inputs.is_empty() || inputs.len() > MAX_BATCH_SIZE {
            return Err(RemoteError::BatchSize {
                count: inputs.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(Self {
            operation,
            params: operation.params_json(params)?,
            inputs,
        })
    }
}

/// One processed file from a batch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Name assigned by the service, e.g. `processed_1_cat.png`
    pub filename: String,
    /// Name of the uploaded input, when the service echoes it
    pub original_filename: Option<String>,
    /// Decoded payload, named after `filename`
    pub image: BinaryRef,
}

#[derive(Debug, Deserialize)]
struct BatchResponseWire {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    processed_count: Option<usize>,
    results: Vec<BatchItemWire>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct BatchItemWire {
    filename: String,
    image_data: String,
    #[serde(default)]
    original_filename: Option<String>,
}

/// Decode a batch response body
///
/// The whole job fails on any malformed item: partial results are never
/// returned.
///
/// # Errors
/// `Decode` for invalid JSON, `success: false`, a count mismatch, or an item
/// whose `image_data` is not base64
pub fn decode_batch_response(body: &[u8], expected: usize) -> Result<Vec<BatchItem>, RemoteError> {
    let wire: BatchResponseWire = serde_json::from_slice(body)
        .map_err(|e| RemoteError::decode(format!("batch response is not valid JSON: {e}")))?;

    if !wire.success {
        return Err(RemoteError::decode("service reported an unsuccessful batch"));
    }
    if wire.results.len() != expected {
        return Err(RemoteError::decode(format!(
            "expected {expected} results, got {}",
            wire.results.len()
        )));
    }
    if let Some(count) = wire.processed_count {
        if count != wire.results.len() {
            return Err(RemoteError::decode(format!(
                "processed_count {count} disagrees with {} results",
                wire.results.len()
            )));
        }
    }

    wire.results
        .into_iter()
        .map(|item| {
            let bytes = STANDARD.decode(item.image_data.as_bytes()).map_err(|e| {
                RemoteError::decode(format!("image_data for {} is not base64: {e}", item.filename))
            })?;
            Ok(BatchItem {
                image: BinaryRef::new(item.filename.clone(), bytes),
                filename: item.filename,
                original_filename: item.original_filename,
            })
        })
        .collect()
}
