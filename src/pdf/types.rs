//! PDF data types
//!
//! Core types for representing uploaded PDFs and page render requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed PDF document held in the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPdf {
    /// Unique identifier (derived from the uploaded file name)
    pub id: String,
    /// Upload file name without the .pdf suffix; used to name exported files
    pub file_stem: String,
    /// PDF metadata
    pub metadata: PdfMetadata,
    /// Total page count
    pub page_count: usize,
    /// Dimensions for each page (index 0 = page 1)
    pub page_dimensions: Vec<PageDimensions>,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

/// PDF metadata extracted from the document info dictionary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfMetadata {
    /// Document title (falls back to the file stem)
    pub title: String,
    /// Document author
    pub author: Option<String>,
    /// Application that created the document
    pub creator: Option<String>,
    /// PDF producer application
    pub producer: Option<String>,
}

impl Default for PdfMetadata {
    fn default() -> Self {
        Self {
            title: "Unknown".to_string(),
            author: None,
            creator: None,
            producer: None,
        }
    }
}

/// Page dimensions in points (72 points = 1 inch)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
}

/// Request for rendering a single page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRenderRequest {
    /// Page number (1-indexed)
    pub page: usize,
    /// Scale factor (1.0 = 72 DPI, 2.0 = 144 DPI)
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Output format
    #[serde(default)]
    pub format: ImageFormat,
    /// Rotation in degrees (0, 90, 180, 270)
    #[serde(default)]
    pub rotation: u16,
    /// Image quality for lossy formats (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_scale() -> f32 {
    1.5
}

fn default_quality() -> u8 {
    85
}

/// Image output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }

    /// Parse a format string from a query parameter, defaulting to PNG
    pub fn from_query(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => ImageFormat::Jpeg,
            "webp" => ImageFormat::Webp,
            _ => ImageFormat::Png,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_content_type() {
        assert_eq!(ImageFormat::Png.content_type(), "image/png");
        assert_eq!(ImageFormat::Jpeg.content_type(), "image/jpeg");
        assert_eq!(ImageFormat::Webp.content_type(), "image/webp");
    }

    #[test]
    fn test_image_format_from_query() {
        assert_eq!(ImageFormat::from_query("jpg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_query("JPEG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_query("webp"), ImageFormat::Webp);
        assert_eq!(ImageFormat::from_query(""), ImageFormat::Png);
        assert_eq!(ImageFormat::from_query("bmp"), ImageFormat::Png);
    }

    #[test]
    fn test_page_render_request_defaults() {
        let json = r#"{"page": 1}"#;
        let request: PageRenderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.scale, 1.5);
        assert_eq!(request.format, ImageFormat::Png);
        assert_eq!(request.rotation, 0);
        assert_eq!(request.quality, 85);
    }

    #[test]
    fn test_pdf_metadata_serialization() {
        let metadata = PdfMetadata {
            title: "Test PDF".to_string(),
            author: Some("Test Author".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"title\":\"Test PDF\""));
        assert!(json.contains("\"author\":\"Test Author\""));
    }
}
