//! Operation identifiers and loose tool parameters

use crate::error::RemoteError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fixed identifier selecting one remote transformation contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationId {
    ResizeCrop,
    Transform,
    Grayscale,
    Colorspace,
    Convolution,
    MorphEdge,
    Threshold,
    Draw,
    Arithmetic,
    Histogram,
    Denoise,
}

impl OperationId {
    /// Every single-image operation
    pub const ALL: [OperationId; 11] = [
        Self::ResizeCrop,
        Self::Transform,
        Self::Grayscale,
        Self::Colorspace,
        Self::Convolution,
        Self::MorphEdge,
        Self::Threshold,
        Self::Draw,
        Self::Arithmetic,
        Self::Histogram,
        Self::Denoise,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ResizeCrop => "resize_crop",
            Self::Transform => "transform",
            Self::Grayscale => "grayscale",
            Self::Colorspace => "colorspace",
            Self::Convolution => "convolution",
            Self::MorphEdge => "morph_edge",
            Self::Threshold => "threshold",
            Self::Draw => "draw",
            Self::Arithmetic => "arithmetic",
            Self::Histogram => "histogram",
            Self::Denoise => "denoise",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationId {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RemoteError::UnknownOperation(s.to_string()))
    }
}

/// Tool parameters as a properties panel produces them: string key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    /// Empty parameter set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Value for `key`, trimmed; blank values count as absent
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over raw pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse `key=value` tokens
    ///
    /// # Errors
    /// `InvalidParameter` for a token without `=` or with an empty key
    pub fn parse_pairs<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Result<Self, RemoteError> {
        let mut params = Self::new();
        for token in tokens {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| RemoteError::invalid(token, "expected key=value"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(RemoteError::invalid(token, "empty key"));
            }
            params.insert(key, value.trim());
        }
        Ok(params)
    }
}

/// One text field of a multipart request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub value: String,
}

impl FormField {
    #[inline]
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}
