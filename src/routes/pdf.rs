//! PDF API endpoints
//!
//! REST API for the PDF page extraction flow:
//! - Upload PDFs
//! - List cached PDFs
//! - Get PDF metadata and page geometry
//! - Render pages and thumbnails
//! - Export selected pages as a zip archive

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::archive::{self, ArchiveEntry};
use crate::error::{AppError, Result};
use crate::pdf::{ImageFormat, PageDimensions, PageRenderRequest, ParsedPdf, PdfMetadata};
use crate::state::AppState;

/// Response for PDF list
#[derive(Serialize)]
pub struct PdfListResponse {
    pub pdfs: Vec<PdfSummary>,
    pub total: usize,
}

/// Summary of a PDF for list view
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfSummary {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub page_count: usize,
}

/// Full PDF details response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfDetailResponse {
    pub id: String,
    pub file_stem: String,
    pub metadata: PdfMetadata,
    pub page_count: usize,
    /// Dimensions for each page (index 0 = page 1)
    pub page_dimensions: Vec<PageDimensions>,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub title: String,
    pub message: String,
    pub page_count: usize,
}

/// Query parameters for page rendering
#[derive(Debug, Deserialize)]
pub struct PageRenderQuery {
    /// Scale factor (default: 1.5). Ignored if dpi is provided.
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// DPI for rendering. If provided, overrides scale as dpi / 72.
    pub dpi: Option<u32>,
    /// Rotation in degrees (0, 90, 180, 270)
    #[serde(default)]
    pub rotation: u16,
    /// Output format (png, jpeg, webp)
    #[serde(default)]
    pub format: String,
    /// Image quality for lossy formats (1-100). Default: 85
    pub quality: Option<u8>,
}

fn default_scale() -> f32 {
    1.5
}

/// Query parameters for thumbnails
#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    /// Maximum dimension (default: 200)
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
}

fn default_thumbnail_size() -> u32 {
    200
}

/// Query parameters for batch page rendering
#[derive(Debug, Deserialize)]
pub struct BatchRenderQuery {
    /// Comma-separated list of page numbers (e.g., "1,2,3,4,5")
    pub pages: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    pub dpi: Option<u32>,
    #[serde(default)]
    pub rotation: u16,
    #[serde(default)]
    pub format: String,
    pub quality: Option<u8>,
}

/// Individual page result in batch response
#[derive(Serialize)]
pub struct BatchPageResult {
    pub page: usize,
    /// Base64-encoded image data
    pub data: String,
    /// Content type (e.g., "image/png")
    pub content_type: String,
}

/// Batch render response
#[derive(Serialize)]
pub struct BatchRenderResponse {
    pub pages: Vec<BatchPageResult>,
    /// Pages that failed to render
    pub errors: Vec<BatchPageError>,
}

/// Error for individual page in batch
#[derive(Serialize)]
pub struct BatchPageError {
    pub page: usize,
    pub error: String,
}

/// Query parameters for page export
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Comma-separated page selection (default: all pages)
    pub pages: Option<String>,
    /// Scale factor (default: 3.0 for crisp export images)
    #[serde(default = "default_export_scale")]
    pub scale: f32,
    /// Output format (png, jpeg, webp)
    #[serde(default)]
    pub format: String,
    /// Image quality for lossy formats (1-100). Default: 95
    pub quality: Option<u8>,
}

fn default_export_scale() -> f32 {
    3.0
}

/// Validate a PDF exists and the page number is within bounds
async fn validate_page_range(state: &AppState, id: &str, page: usize) -> Result<ParsedPdf> {
    let pdf = state
        .pdf_cache()
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("PDF '{}' not found", id)))?;

    // Pages are 1-indexed
    if page < 1 || page > pdf.page_count {
        return Err(AppError::BadRequest(format!(
            "Page {} is out of range. PDF '{}' has {} pages (valid range: 1-{})",
            page, id, pdf.page_count, pdf.page_count
        )));
    }

    Ok(pdf)
}

/// Create the PDF router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_pdfs).post(upload_pdf))
        .route("/:id", get(get_pdf).delete(delete_pdf))
        .route("/:id/pages/:page", get(render_page))
        .route("/:id/pages/batch", get(batch_render_pages))
        .route("/:id/pages/:page/thumbnail", get(render_thumbnail))
        .route("/:id/export", get(export_pages))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// List all cached PDFs
async fn list_pdfs(State(state): State<AppState>) -> Json<PdfListResponse> {
    let pdfs = state.pdf_cache().list().await;

    let summaries: Vec<PdfSummary> = pdfs
        .iter()
        .map(|pdf| PdfSummary {
            id: pdf.id.clone(),
            title: pdf.metadata.title.clone(),
            author: pdf.metadata.author.clone(),
            page_count: pdf.page_count,
        })
        .collect();

    let total = summaries.len();

    Json(PdfListResponse {
        pdfs: summaries,
        total,
    })
}

/// Upload a new PDF
async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    tracing::debug!("Starting PDF upload processing");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" || name == "pdf" {
            let file_stem = field
                .file_name()
                .map(|s| s.strip_suffix(".pdf").unwrap_or(s).to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let id = file_stem.clone();

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;

            tracing::debug!("Read {} bytes of file data", data.len());

            let pdf = state
                .pdf_cache()
                .load_from_bytes(&data, id, file_stem)
                .await?;

            tracing::info!("PDF uploaded: '{}' with {} pages", pdf.id, pdf.page_count);

            return Ok(Json(UploadResponse {
                id: pdf.id.clone(),
                title: pdf.metadata.title.clone(),
                message: "PDF uploaded successfully".to_string(),
                page_count: pdf.page_count,
            }));
        }
    }

    tracing::warn!("No file field found in multipart upload");
    Err(AppError::BadRequest(
        "No file provided. Use field name 'file' or 'pdf'".to_string(),
    ))
}

/// Get PDF details by ID
async fn get_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PdfDetailResponse>> {
    let pdf = state
        .pdf_cache()
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("PDF '{}' not found", id)))?;

    Ok(Json(PdfDetailResponse {
        id: pdf.id,
        file_stem: pdf.file_stem,
        metadata: pdf.metadata,
        page_count: pdf.page_count,
        page_dimensions: pdf.page_dimensions,
        uploaded_at: pdf.uploaded_at,
    }))
}

/// Delete a PDF from the cache
async fn delete_pdf(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    if !state.pdf_cache().contains(&id).await {
        return Err(AppError::NotFound(format!("PDF '{}' not found", id)));
    }

    state.pdf_cache().remove(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Render a page as an image
async fn render_page(
    State(state): State<AppState>,
    Path((id, page)): Path<(String, usize)>,
    Query(query): Query<PageRenderQuery>,
) -> Result<Response> {
    validate_page_range(&state, &id, page).await?;

    let format = ImageFormat::from_query(&query.format);

    // DPI to scale: scale = dpi / 72.0 (PDF points are 72 per inch)
    let scale = match query.dpi {
        Some(dpi) => (dpi as f32) / 72.0,
        None => query.scale,
    };

    let request = PageRenderRequest {
        page,
        scale,
        format,
        rotation: query.rotation,
        quality: query.quality.unwrap_or(85),
    };

    let data = state.pdf_cache().render_page(&id, &request).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(header::CACHE_CONTROL, "max-age=3600")
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

/// Batch render multiple pages in parallel
///
/// Renders multiple pages concurrently and returns them in a single JSON
/// response, with per-page errors instead of failing the whole batch.
async fn batch_render_pages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<BatchRenderQuery>,
) -> Result<Json<BatchRenderResponse>> {
    let page_numbers: Vec<usize> = query
        .pages
        .split(',')
        .filter_map(|s| s.trim().parse::<usize>().ok())
        .collect();

    if page_numbers.is_empty() {
        return Err(AppError::BadRequest(
            "No valid page numbers provided".to_string(),
        ));
    }

    // Limit batch size for memory safety
    if page_numbers.len() > 20 {
        return Err(AppError::BadRequest(
            "Maximum 20 pages per batch request".to_string(),
        ));
    }

    let pdf = state
        .pdf_cache()
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("PDF '{}' not found", id)))?;

    let format = ImageFormat::from_query(&query.format);
    let scale = match query.dpi {
        Some(dpi) => (dpi as f32) / 72.0,
        None => query.scale,
    };
    let quality = query.quality.unwrap_or(85);
    let rotation = query.rotation;
    let content_type = format.content_type().to_string();

    let cache = state.pdf_cache().clone();
    let mut handles = Vec::with_capacity(page_numbers.len());

    for page in page_numbers.clone() {
        let cache = cache.clone();
        let id = id.clone();
        let page_count = pdf.page_count;

        handles.push(tokio::spawn(async move {
            if page == 0 || page > page_count {
                return Err((page, format!("Page {} out of range (1-{})", page, page_count)));
            }

            let request = PageRenderRequest {
                page,
                scale,
                format,
                rotation,
                quality,
            };

            match cache.render_page(&id, &request).await {
                Ok(data) => Ok((page, data)),
                Err(e) => Err((page, e.to_string())),
            }
        }));
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    let mut errors = Vec::new();

    for handle in handles {
        match handle.await {
            Ok(Ok((page, data))) => {
                pages.push(BatchPageResult {
                    page,
                    data: BASE64.encode(&data),
                    content_type: content_type.clone(),
                });
            }
            Ok(Err((page, error))) => {
                errors.push(BatchPageError { page, error });
            }
            Err(e) => {
                tracing::error!("Task join error during batch render: {}", e);
            }
        }
    }

    // Sort for consistent ordering
    pages.sort_by_key(|p| p.page);
    errors.sort_by_key(|e| e.page);

    Ok(Json(BatchRenderResponse { pages, errors }))
}

/// Render a thumbnail
async fn render_thumbnail(
    State(state): State<AppState>,
    Path((id, page)): Path<(String, usize)>,
    Query(query): Query<ThumbnailQuery>,
) -> Result<Response> {
    validate_page_range(&state, &id, page).await?;

    let data = state
        .pdf_cache()
        .render_thumbnail(&id, page, query.size)
        .await?;

    // Thumbnails are always JPEG
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CACHE_CONTROL, "max-age=86400")
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

/// Export selected pages as images
///
/// Renders the selection sequentially at export quality. A single selected
/// page comes back as a bare image; anything more is packaged into a zip
/// named `{file_stem}_pages.zip`.
async fn export_pages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let pdf = state
        .pdf_cache()
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("PDF '{}' not found", id)))?;

    let pages = match &query.pages {
        Some(selection) => parse_page_selection(selection, pdf.page_count)?,
        None => (1..=pdf.page_count).collect(),
    };

    if pages.is_empty() {
        return Err(AppError::BadRequest("No pages selected".to_string()));
    }

    let format = ImageFormat::from_query(&query.format);
    let quality = query.quality.unwrap_or(95);
    let scale = query.scale;

    // Single page: skip the archive and hand back the image itself
    if pages.len() == 1 {
        let page = pages[0];
        let request = PageRenderRequest {
            page,
            scale,
            format,
            rotation: 0,
            quality,
        };
        let data = state.pdf_cache().render_page(&id, &request).await?;
        let filename = archive::page_entry_name(&pdf.file_stem, page, format.extension());

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, format.content_type())
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            )
            .body(Body::from(data))
            .map_err(|e| AppError::Internal(e.to_string()))?;

        return Ok(response);
    }

    // Render sequentially so one export cannot monopolize the blocking pool
    let total = pages.len();
    let mut entries = Vec::with_capacity(total);

    for (done, &page) in pages.iter().enumerate() {
        let request = PageRenderRequest {
            page,
            scale,
            format,
            rotation: 0,
            quality,
        };
        let data = state.pdf_cache().render_page(&id, &request).await?;
        entries.push(ArchiveEntry::new(
            archive::page_entry_name(&pdf.file_stem, page, format.extension()),
            data,
        ));
        tracing::debug!("Exported page {}/{} of '{}'", done + 1, total, id);
    }

    let zip_bytes = archive::build_zip(&entries)?;
    let filename = format!("{}_pages.zip", pdf.file_stem);

    tracing::info!("Exported {} pages of '{}' as {}", total, id, filename);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(zip_bytes))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

/// Parse a comma-separated page selection, validating against the page count
fn parse_page_selection(selection: &str, page_count: usize) -> Result<Vec<usize>> {
    let mut pages = Vec::new();

    for part in selection.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let page: usize = part
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid page number '{}'", part)))?;

        if page < 1 || page > page_count {
            return Err(AppError::BadRequest(format!(
                "Page {} is out of range (1-{})",
                page, page_count
            )));
        }

        if !pages.contains(&page) {
            pages.push(page);
        }
    }

    Ok(pages)
}
