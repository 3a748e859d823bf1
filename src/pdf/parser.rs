//! PDF parsing and rasterization using MuPDF
//!
//! Extracts metadata and page geometry at upload time and renders pages to
//! PNG/JPEG/WebP on demand.
//!
//! MuPDF's fz_context is not thread-safe, so a fresh document is opened for
//! every operation and callers serialize access (see `cache::SafePdfParser`).

use std::io::Cursor;

use chrono::Utc;
use mupdf::{Colorspace, Document, Matrix, MetadataName};
use thiserror::Error;

use super::types::{
    ImageFormat, PageDimensions, PageRenderRequest, ParsedPdf, PdfMetadata,
};

/// PDF errors
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Not a PDF document: {0}")]
    InvalidDocument(String),
    #[error("Failed to load PDF: {0}")]
    LoadError(String),
    #[error("PDF '{0}' not found")]
    NotCached(String),
    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),
    #[error("Failed to render page: {0}")]
    RenderError(String),
    #[error("Image encoding error: {0}")]
    ImageError(String),
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
    #[error("MuPDF error: {0}")]
    MuPdfError(String),
}

impl From<mupdf::Error> for PdfError {
    fn from(e: mupdf::Error) -> Self {
        PdfError::MuPdfError(e.to_string())
    }
}

impl PdfError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidDocument(_) | Self::LoadError(_) | Self::PageNotFound(_, _) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotCached(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// PDF parser holding the source bytes for the lifetime of the document
///
/// MuPDF's fz_context is not thread-safe. The parser keeps the upload bytes
/// and opens a fresh document per operation; `SafePdfParser` serializes all
/// calls on one document.
pub struct PdfParser {
    /// The document data, kept alive for re-opens
    data: Vec<u8>,
    /// Document identifier
    id: String,
    /// Upload file stem, used for export naming
    file_stem: String,
    /// Cached page count
    page_count: usize,
}

// PdfParser is Send + Sync: `data`, `id` and `file_stem` are plain owned
// values, and every MuPDF call opens a fresh document whose handle never
// escapes the method. Cross-thread serialization is enforced by the
// SafePdfParser mutex in the cache layer.
unsafe impl Send for PdfParser {}
unsafe impl Sync for PdfParser {}

impl PdfParser {
    /// Create a parser from uploaded bytes
    ///
    /// Validates the magic number and that MuPDF can open the document.
    pub fn from_bytes(data: &[u8], id: String, file_stem: String) -> Result<Self, PdfError> {
        if !data.starts_with(b"%PDF-") {
            return Err(PdfError::InvalidDocument(
                "missing %PDF header".to_string(),
            ));
        }

        let owned_data = data.to_vec();

        let doc = Document::from_bytes(&owned_data, "application/pdf")
            .map_err(|e| PdfError::LoadError(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| PdfError::LoadError(e.to_string()))? as usize;

        Ok(Self {
            data: owned_data,
            id,
            file_stem,
            page_count,
        })
    }

    /// Get a fresh document instance for the current operation
    fn open_document(&self) -> Result<Document, PdfError> {
        Document::from_bytes(&self.data, "application/pdf").map_err(Into::into)
    }

    /// Parse the PDF and extract metadata plus page geometry
    pub fn parse(&self) -> Result<ParsedPdf, PdfError> {
        let doc = self.open_document()?;

        let metadata = self.extract_metadata(&doc)?;
        let page_dimensions = self.extract_page_dimensions(&doc)?;

        Ok(ParsedPdf {
            id: self.id.clone(),
            file_stem: self.file_stem.clone(),
            metadata,
            page_count: self.page_count,
            page_dimensions,
            uploaded_at: Utc::now(),
        })
    }

    /// Extract metadata from the PDF info dictionary
    fn extract_metadata(&self, doc: &Document) -> Result<PdfMetadata, PdfError> {
        let get_meta = |name: MetadataName| -> Option<String> {
            doc.metadata(name).ok().filter(|s| !s.is_empty())
        };

        Ok(PdfMetadata {
            title: get_meta(MetadataName::Title).unwrap_or_else(|| self.file_stem.clone()),
            author: get_meta(MetadataName::Author),
            creator: get_meta(MetadataName::Creator),
            producer: get_meta(MetadataName::Producer),
        })
    }

    /// Collect the dimensions of every page
    fn extract_page_dimensions(&self, doc: &Document) -> Result<Vec<PageDimensions>, PdfError> {
        let mut dimensions = Vec::with_capacity(self.page_count);

        for page_idx in 0..self.page_count {
            let page = doc.load_page(page_idx as i32)?;
            let bounds = page.bounds()?;
            dimensions.push(PageDimensions {
                width: bounds.x1 - bounds.x0,
                height: bounds.y1 - bounds.y0,
            });
        }

        Ok(dimensions)
    }

    /// Get page count
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Validate page number (1-indexed)
    fn validate_page_num(&self, page_num: usize) -> Result<(), PdfError> {
        if page_num < 1 || page_num > self.page_count {
            return Err(PdfError::PageNotFound(page_num, self.page_count));
        }
        Ok(())
    }

    /// Render a page to image bytes
    pub fn render_page(&self, request: &PageRenderRequest) -> Result<Vec<u8>, PdfError> {
        self.validate_page_num(request.page)?;

        let doc = self.open_document()?;
        let page = doc.load_page((request.page - 1) as i32)?;

        // Clamp scale to prevent runaway allocations (0.1 to 4.0)
        let scale = request.scale.clamp(0.1, 4.0);

        let mut matrix = Matrix::new_scale(scale, scale);
        if request.rotation != 0 {
            let rotation_matrix = Matrix::new_rotate(request.rotation as f32);
            matrix.concat(rotation_matrix);
        }

        let colorspace = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&matrix, &colorspace, true, true)?;

        encode_pixmap(&pixmap, request.format, request.quality)
    }

    /// Render a low-resolution JPEG thumbnail scaled to fit `max_size`
    pub fn render_thumbnail(&self, page_num: usize, max_size: u32) -> Result<Vec<u8>, PdfError> {
        self.validate_page_num(page_num)?;

        let doc = self.open_document()?;
        let page = doc.load_page((page_num - 1) as i32)?;
        let bounds = page.bounds()?;

        let width = bounds.x1 - bounds.x0;
        let height = bounds.y1 - bounds.y0;
        let scale = (max_size as f32) / width.max(height);

        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&matrix, &colorspace, true, false)?;

        encode_pixmap(&pixmap, ImageFormat::Jpeg, 85)
    }
}

/// Encode a MuPDF pixmap to image bytes in the requested format
fn encode_pixmap(
    pixmap: &mupdf::Pixmap,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, PdfError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize; // components per pixel

    // Convert to an RGBA buffer the image crate can encode
    let mut rgba_buffer = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba_buffer.extend_from_slice(&[r, g, b, a]);
        }
    }

    let img = image::RgbaImage::from_raw(width, height, rgba_buffer)
        .ok_or_else(|| PdfError::ImageError("Failed to create image buffer".to_string()))?;

    let dynamic_img = image::DynamicImage::ImageRgba8(img);

    let mut output = Vec::new();
    match format {
        ImageFormat::Png => {
            dynamic_img
                .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
                .map_err(|e| PdfError::ImageError(e.to_string()))?;
        }
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = dynamic_img.to_rgb8();
            let quality = quality.clamp(1, 100);
            let mut cursor = Cursor::new(&mut output);
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut cursor,
                quality,
            );
            rgb.write_with_encoder(encoder)
                .map_err(|e| PdfError::ImageError(e.to_string()))?;
        }
        ImageFormat::Webp => {
            dynamic_img
                .write_to(&mut Cursor::new(&mut output), image::ImageFormat::WebP)
                .map_err(|e| PdfError::ImageError(e.to_string()))?;
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let result = PdfParser::from_bytes(b"not a pdf", "x".into(), "x".into());
        assert!(matches!(result, Err(PdfError::InvalidDocument(_))));
    }

    #[test]
    fn test_invalid_document_maps_to_400() {
        let err = PdfError::InvalidDocument("missing header".to_string());
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_cached_maps_to_404() {
        let err = PdfError::NotCached("ghost".to_string());
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
