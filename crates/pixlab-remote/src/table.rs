//! Command table: operation id → remote contract
//!
//! Each [`OperationContract`] names one endpoint and a builder that turns
//! loose [`Parameters`] into validated form fields and a history label.
//! Missing parameters take the service's documented defaults; invalid ones
//! fail before any request is sent.

use crate::error::RemoteError;
use crate::operation::{FormField, OperationId, Parameters};
use std::collections::HashMap;

type Builder = fn(&Parameters) -> Result<PreparedOperation, RemoteError>;

/// A fully validated single-image request, minus the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedOperation {
    /// Contract that produced this request
    pub operation: OperationId,
    /// Endpoint path, e.g. `/convolution`
    pub endpoint: &'static str,
    /// History label, e.g. `Filter: sharpen`
    pub label: String,
    /// Text fields sent next to the `file` part
    pub fields: Vec<FormField>,
}

impl PreparedOperation {
    fn new(operation: OperationId, label: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            operation,
            endpoint: endpoint_for(operation),
            label: label.into(),
            fields,
        }
    }
}

/// One remote contract
#[derive(Clone, Copy)]
pub struct OperationContract {
    pub id: OperationId,
    pub endpoint: &'static str,
    build: Builder,
}

impl OperationContract {
    /// Validate parameters against this contract
    ///
    /// # Errors
    /// `InvalidParameter` for a value outside the contract
    pub fn prepare(&self, params: &Parameters) -> Result<PreparedOperation, RemoteError> {
        (self.build)(params)
    }
}

impl std::fmt::Debug for OperationContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationContract")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Maps every [`OperationId`] to exactly one contract
#[derive(Debug, Clone)]
pub struct CommandTable {
    contracts: HashMap<OperationId, OperationContract>,
}

impl CommandTable {
    /// Table covering the full service contract
    #[must_use]
    pub fn standard() -> Self {
        let entries: [(OperationId, Builder); 11] = [
            (OperationId::ResizeCrop, build_resize_crop),
            (OperationId::Transform, build_transform),
            (OperationId::Grayscale, build_grayscale),
            (OperationId::Colorspace, build_colorspace),
            (OperationId::Convolution, build_convolution),
            (OperationId::MorphEdge, build_morph_edge),
            (OperationId::Threshold, build_threshold),
            (OperationId::Draw, build_draw),
            (OperationId::Arithmetic, build_arithmetic),
            (OperationId::Histogram, build_histogram),
            (OperationId::Denoise, build_denoise),
        ];
        let contracts = entries
            .into_iter()
            .map(|(id, build)| {
                let contract = OperationContract {
                    id,
                    endpoint: endpoint_for(id),
                    build,
                };
                (id, contract)
            })
            .collect();
        Self { contracts }
    }

    /// Contract for `id`
    #[must_use]
    pub fn get(&self, id: OperationId) -> Option<&OperationContract> {
        self.contracts.get(&id)
    }

    /// Number of registered contracts
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Look up and validate in one step
    ///
    /// # Errors
    /// `UnknownOperation` if the table has no contract for `id`,
    /// `InvalidParameter` if validation fails
    pub fn prepare(
        &self,
        id: OperationId,
        params: &Parameters,
    ) -> Result<PreparedOperation, RemoteError> {
        self.get(id)
            .ok_or_else(|| RemoteError::UnknownOperation(id.to_string()))?
            .prepare(params)
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Endpoint path for an operation
#[must_use]
pub const fn endpoint_for(id: OperationId) -> &'static str {
    match id {
        OperationId::ResizeCrop => "/resize_crop",
        OperationId::Transform => "/transform",
        OperationId::Grayscale => "/grayscale",
        OperationId::Colorspace => "/colorspace",
        OperationId::Convolution => "/convolution",
        OperationId::MorphEdge => "/morph_edge",
        OperationId::Threshold => "/threshold",
        OperationId::Draw => "/draw",
        OperationId::Arithmetic => "/arithmetic",
        OperationId::Histogram => "/histogram",
        OperationId::Denoise => "/denoise",
    }
}

// ── Parameter readers ────────────────────────────────────────────────────────

fn choice(
    params: &Parameters,
    key: &str,
    allowed: &[&'static str],
    default: Option<&'static str>,
) -> Result<&'static str, RemoteError> {
    match params.get(key) {
        Some(value) => allowed
            .iter()
            .copied()
            .find(|a| a.eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                RemoteError::invalid(key, format!("`{value}` not one of {}", allowed.join("/")))
            }),
        None => default.ok_or_else(|| RemoteError::invalid(key, "required")),
    }
}

fn positive(params: &Parameters, key: &str, default: u32) -> Result<u32, RemoteError> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<u32>() {
            Ok(0) | Err(_) => Err(RemoteError::invalid(key, format!("`{raw}` is not a positive integer"))),
            Ok(v) => Ok(v),
        },
    }
}

fn integer(params: &Parameters, key: &str, default: i64) -> Result<i64, RemoteError> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| RemoteError::invalid(key, format!("`{raw}` is not an integer"))),
    }
}

fn finite(params: &Parameters, key: &str, default: f64) -> Result<f64, RemoteError> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RemoteError::invalid(key, format!("`{raw}` is not a finite number"))),
    }
}

fn flag(params: &Parameters, key: &str, default: bool) -> Result<bool, RemoteError> {
    match params.get(key).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(RemoteError::invalid(key, format!("`{other}` is not a boolean"))),
    }
}

// ── Contract builders ────────────────────────────────────────────────────────

fn build_resize_crop(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    let width = positive(params, "width", 100)?;
    let height = positive(params, "height", 100)?;
    let crop = flag(params, "crop", true)?;
    let label = if crop { "Crop" } else { "Resize" };
    Ok(PreparedOperation::new(
        OperationId::ResizeCrop,
        label,
        vec![
            FormField::new("width", width.to_string()),
            FormField::new("height", height.to_string()),
            FormField::new("crop", crop.to_string()),
        ],
    ))
}

fn build_transform(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    let angle = finite(params, "angle", 0.0)?;
    let tx = integer(params, "tx", 0)?;
    let ty = integer(params, "ty", 0)?;
    Ok(PreparedOperation::new(
        OperationId::Transform,
        "Transform",
        vec![
            FormField::new("angle", angle.to_string()),
            FormField::new("tx", tx.to_string()),
            FormField::new("ty", ty.to_string()),
        ],
    ))
}

fn build_grayscale(_params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    Ok(PreparedOperation::new(OperationId::Grayscale, "Grayscale", Vec::new()))
}

fn build_colorspace(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    // The colour tool lists grayscale next to the real colour spaces
    if params
        .get("space")
        .is_some_and(|s| s.eq_ignore_ascii_case("grayscale"))
    {
        return build_grayscale(params);
    }
    let space = choice(params, "space", &["RGB", "HSV", "LAB"], None)?;
    Ok(PreparedOperation::new(
        OperationId::Colorspace,
        format!("Color Space: {space}"),
        vec![FormField::new("space", space)],
    ))
}

fn build_convolution(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    let op = choice(params, "op", &["blur", "sharpen", "emboss"], Some("blur"))?;
    Ok(PreparedOperation::new(
        OperationId::Convolution,
        format!("Filter: {op}"),
        vec![FormField::new("op", op)],
    ))
}

fn build_morph_edge(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    let op = choice(params, "op", &["canny", "sobel", "dilate", "erode"], Some("canny"))?;
    let family = match op {
        "dilate" | "erode" => "Morphology",
        _ => "Edge Detection",
    };
    Ok(PreparedOperation::new(
        OperationId::MorphEdge,
        format!("{family}: {op}"),
        vec![FormField::new("op", op)],
    ))
}

fn build_threshold(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    let op = choice(params, "op", &["binary", "adaptive"], Some("binary"))?;
    Ok(PreparedOperation::new(
        OperationId::Threshold,
        format!("Threshold: {op}"),
        vec![FormField::new("op", op)],
    ))
}

fn build_draw(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    let shape = choice(params, "shape", &["rectangle", "circle", "text"], Some("rectangle"))?;
    let mut fields = vec![FormField::new("shape", shape)];
    if shape == "text" {
        if let Some(text) = params.get("text") {
            fields.push(FormField::new("text", text));
        }
    }
    Ok(PreparedOperation::new(
        OperationId::Draw,
        format!("Draw: {shape}"),
        fields,
    ))
}

fn build_arithmetic(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    let op = choice(
        params,
        "op",
        &["add", "subtract", "and", "or", "bitwise_and", "bitwise_or"],
        Some("add"),
    )?;
    let (short, wire) = match op {
        "and" | "bitwise_and" => ("and", "bitwise_and"),
        "or" | "bitwise_or" => ("or", "bitwise_or"),
        other => (other, other),
    };
    Ok(PreparedOperation::new(
        OperationId::Arithmetic,
        format!("Arithmetic: {short}"),
        vec![FormField::new("op", wire)],
    ))
}

fn build_histogram(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    let op = choice(params, "op", &["equalize", "clahe"], Some("equalize"))?;
    Ok(PreparedOperation::new(
        OperationId::Histogram,
        format!("Histogram: {op}"),
        vec![FormField::new("op", op)],
    ))
}

fn build_denoise(params: &Parameters) -> Result<PreparedOperation, RemoteError> {
    // Older panels call this field `method`
    let mut params = params.clone();
    if params.get("op").is_none() {
        if let Some(method) = params.get("method").map(str::to_string) {
            params.insert("op", method);
        }
    }
    let op = choice(&params, "op", &["bilateral", "gaussian", "median"], Some("bilateral"))?;
    Ok(PreparedOperation::new(
        OperationId::Denoise,
        format!("Denoise: {op}"),
        vec![FormField::new("op", op)],
    ))
}
