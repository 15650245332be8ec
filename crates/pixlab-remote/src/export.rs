//! Export, report and inspection contracts

use crate::error::RemoteError;
use pixlab_document::BinaryRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default encoder quality
pub const DEFAULT_QUALITY: u8 = 95;

/// Target format for `/export`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Pdf,
}

impl ExportFormat {
    /// Value of the `format` form field
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }

    /// File extension for the exported file
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        self.wire_name()
    }

    /// Media type expected back from the service
    #[must_use]
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
        }
    }

    /// Whether `quality` affects the encoder
    #[must_use]
    pub const fn is_lossy(&self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ExportFormat {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            other => Err(RemoteError::invalid("format", format!("unsupported format `{other}`"))),
        }
    }
}

/// A validated `/export` call
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub image: BinaryRef,
    pub format: ExportFormat,
    pub quality: u8,
}

impl ExportRequest {
    /// # Errors
    /// `InvalidParameter` for quality outside 1..=100
    pub fn new(image: BinaryRef, format: ExportFormat, quality: u8) -> Result<Self, RemoteError> {
        if !(1..=100).contains(&quality) {
            return Err(RemoteError::invalid("quality", format!("{quality} not in 1..=100")));
        }
        Ok(Self {
            image,
            format,
            quality,
        })
    }

    /// Name the exported file is saved under
    #[must_use]
    pub fn filename(&self) -> String {
        format!("exported_image.{}", self.format.extension())
    }
}

/// An encoded file returned by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub media_type: String,
    /// Payload, named with the suggested filename
    pub file: BinaryRef,
}

impl ExportedFile {
    #[inline]
    #[must_use]
    pub fn filename(&self) -> &str {
        self.file.name()
    }
}

/// Processing report returned by `/create_report`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub timestamp: String,
    pub original_filename: String,
    pub original_dimensions: String,
    pub operations_applied: usize,
    pub operations: Vec<String>,
}

/// Dimensions reported by `/upload`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for ImageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!("JPEG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert_eq!("jpg".parse::<ExportFormat>().unwrap().extension(), "jpg");
        assert!("tiff".parse::<ExportFormat>().is_err());
        assert!(ExportFormat::Jpeg.is_lossy());
        assert!(!ExportFormat::Png.is_lossy());
    }

    #[test]
    fn quality_bounds() {
        let image = BinaryRef::new("a.png", vec![1]);
        assert!(ExportRequest::new(image.clone(), ExportFormat::Jpeg, 0).is_err());
        assert!(ExportRequest::new(image.clone(), ExportFormat::Jpeg, 101).is_err());
        let req = ExportRequest::new(image, ExportFormat::Pdf, DEFAULT_QUALITY).unwrap();
        assert_eq!(req.filename(), "exported_image.pdf");
    }

    #[test]
    fn report_decodes_service_json() {
        let json = r#"{
            "timestamp": "2024-01-01 10:00:00",
            "original_filename": "cat.png",
            "original_dimensions": "640 x 480",
            "operations_applied": 2,
            "operations": ["Original", "Filter: blur"]
        }"#;
        let report: SessionReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.operations_applied, 2);
        assert_eq!(report.operations[1], "Filter: blur");
    }
}
