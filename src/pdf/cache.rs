//! PDF cache for parsed documents and rendered pages
//!
//! In-memory cache to avoid re-parsing PDFs and re-rendering pages.
//!
//! IMPORTANT: MuPDF is NOT thread-safe. Each PdfParser is wrapped in a Mutex
//! to serialize all operations on a given document. This prevents crashes
//! when multiple requests access the same document concurrently.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tokio::time::{timeout, Duration};

use super::parser::{PdfError, PdfParser};
use super::types::{ImageFormat, PageRenderRequest, ParsedPdf};

/// Timeout for PDF parsing (loading a new upload). Some PDFs make the
/// renderer hang indefinitely; the client gets an error instead of waiting
/// forever, even if the blocking thread runs on.
const PARSE_TIMEOUT_SECS: u64 = 30;
/// Timeout for page rendering operations
const RENDER_TIMEOUT_SECS: u64 = 30;

/// Thread-safe wrapper for PdfParser that serializes all operations
pub struct SafePdfParser {
    inner: Mutex<PdfParser>,
}

impl SafePdfParser {
    pub fn new(parser: PdfParser) -> Self {
        Self {
            inner: Mutex::new(parser),
        }
    }

    /// Render a page with exclusive access to the parser
    pub fn render_page(&self, request: &PageRenderRequest) -> Result<Vec<u8>, PdfError> {
        let parser = self.inner.lock();
        parser.render_page(request)
    }

    /// Render a thumbnail with exclusive access
    pub fn render_thumbnail(&self, page: usize, max_size: u32) -> Result<Vec<u8>, PdfError> {
        let parser = self.inner.lock();
        parser.render_thumbnail(page, max_size)
    }
}

/// Cache key for rendered pages
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct PageCacheKey {
    pub pdf_id: String,
    pub page: usize,
    pub scale: u32, // Scale * 100 as integer for hashing
    pub rotation: u16,
    pub format: ImageFormat,
    pub quality: u8,
}

impl PageCacheKey {
    pub fn new(pdf_id: &str, request: &PageRenderRequest) -> Self {
        Self {
            pdf_id: pdf_id.to_string(),
            page: request.page,
            scale: (request.scale * 100.0) as u32,
            rotation: request.rotation,
            format: request.format,
            quality: request.quality,
        }
    }

    pub fn thumbnail(pdf_id: &str, page: usize, max_size: u32) -> Self {
        Self {
            pdf_id: pdf_id.to_string(),
            page,
            scale: max_size,
            rotation: 0,
            format: ImageFormat::Jpeg,
            quality: 85,
        }
    }
}

/// Thread-safe PDF cache
#[derive(Clone)]
pub struct PdfCache {
    /// Parsed PDF metadata cache
    pdfs: Arc<RwLock<HashMap<String, ParsedPdf>>>,
    /// Active parser instances wrapped in SafePdfParser for thread-safety
    parsers: Arc<RwLock<HashMap<String, Arc<SafePdfParser>>>>,
    /// LRU cache for rendered pages
    page_cache: Arc<RwLock<LruCache<PageCacheKey, Vec<u8>>>>,
}

impl Default for PdfCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfCache {
    /// Create a new empty cache with the default page capacity
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Create a cache with specified rendered-page capacity
    pub fn with_capacity(page_cache_size: usize) -> Self {
        let page_size =
            NonZeroUsize::new(page_cache_size).unwrap_or(NonZeroUsize::new(100).unwrap());

        Self {
            pdfs: Arc::new(RwLock::new(HashMap::new())),
            parsers: Arc::new(RwLock::new(HashMap::new())),
            page_cache: Arc::new(RwLock::new(LruCache::new(page_size))),
        }
    }

    /// Load and cache a PDF from uploaded bytes
    ///
    /// Parsing is CPU-bound and offloaded to the blocking thread pool with
    /// a timeout. A duplicate id overwrites the previous entry.
    pub async fn load_from_bytes(
        &self,
        data: &[u8],
        id: String,
        file_stem: String,
    ) -> Result<ParsedPdf, PdfError> {
        let data_owned = data.to_vec();
        let id_clone = id.clone();

        let parse_result = timeout(
            Duration::from_secs(PARSE_TIMEOUT_SECS),
            tokio::task::spawn_blocking(move || {
                let parser = PdfParser::from_bytes(&data_owned, id_clone, file_stem)?;
                let pdf = parser.parse()?;
                Ok::<_, PdfError>((parser, pdf))
            }),
        )
        .await;

        let (parser, pdf) = match parse_result {
            Ok(join_result) => join_result
                .map_err(|e| PdfError::LoadError(format!("Task join error: {}", e)))??,
            Err(_) => return Err(PdfError::Timeout(PARSE_TIMEOUT_SECS)),
        };

        {
            let mut pdfs = self.pdfs.write().await;
            pdfs.insert(id.clone(), pdf.clone());
        }

        {
            let mut parsers = self.parsers.write().await;
            parsers.insert(id, Arc::new(SafePdfParser::new(parser)));
        }

        Ok(pdf)
    }

    /// Get cached PDF metadata
    pub async fn get(&self, id: &str) -> Option<ParsedPdf> {
        let pdfs = self.pdfs.read().await;
        pdfs.get(id).cloned()
    }

    /// Get all cached PDFs, newest upload first
    pub async fn list(&self) -> Vec<ParsedPdf> {
        let pdfs = self.pdfs.read().await;
        let mut all: Vec<ParsedPdf> = pdfs.values().cloned().collect();
        all.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        all
    }

    /// Check if a PDF is cached
    pub async fn contains(&self, id: &str) -> bool {
        let pdfs = self.pdfs.read().await;
        pdfs.contains_key(id)
    }

    /// Fetch the parser handle for a cached PDF
    async fn parser(&self, id: &str) -> Result<Arc<SafePdfParser>, PdfError> {
        let parsers = self.parsers.read().await;
        parsers
            .get(id)
            .cloned()
            .ok_or_else(|| PdfError::NotCached(id.to_string()))
    }

    /// Render a page (with caching)
    pub async fn render_page(
        &self,
        id: &str,
        request: &PageRenderRequest,
    ) -> Result<Vec<u8>, PdfError> {
        let cache_key = PageCacheKey::new(id, request);

        // Check page cache first (write lock: LRU get updates access order)
        {
            let mut page_cache = self.page_cache.write().await;
            if let Some(data) = page_cache.get(&cache_key) {
                return Ok(data.clone());
            }
        }

        let parser = self.parser(id).await?;

        // Offload CPU-bound rendering to blocking thread pool with timeout
        let request_clone = request.clone();
        let render_result = timeout(
            Duration::from_secs(RENDER_TIMEOUT_SECS),
            tokio::task::spawn_blocking(move || parser.render_page(&request_clone)),
        )
        .await;

        let data = match render_result {
            Ok(join_result) => join_result
                .map_err(|e| PdfError::RenderError(format!("Task join error: {}", e)))??,
            Err(_) => return Err(PdfError::Timeout(RENDER_TIMEOUT_SECS)),
        };

        {
            let mut page_cache = self.page_cache.write().await;
            page_cache.put(cache_key, data.clone());
        }

        Ok(data)
    }

    /// Render a thumbnail (with caching)
    pub async fn render_thumbnail(
        &self,
        id: &str,
        page: usize,
        max_size: u32,
    ) -> Result<Vec<u8>, PdfError> {
        let cache_key = PageCacheKey::thumbnail(id, page, max_size);

        {
            let mut page_cache = self.page_cache.write().await;
            if let Some(data) = page_cache.get(&cache_key) {
                return Ok(data.clone());
            }
        }

        let parser = self.parser(id).await?;

        let render_result = timeout(
            Duration::from_secs(RENDER_TIMEOUT_SECS),
            tokio::task::spawn_blocking(move || parser.render_thumbnail(page, max_size)),
        )
        .await;

        let data = match render_result {
            Ok(join_result) => join_result
                .map_err(|e| PdfError::RenderError(format!("Task join error: {}", e)))??,
            Err(_) => return Err(PdfError::Timeout(RENDER_TIMEOUT_SECS)),
        };

        {
            let mut page_cache = self.page_cache.write().await;
            page_cache.put(cache_key, data.clone());
        }

        Ok(data)
    }

    /// Remove a PDF from the cache
    pub async fn remove(&self, id: &str) {
        {
            let mut pdfs = self.pdfs.write().await;
            pdfs.remove(id);
        }

        {
            let mut parsers = self.parsers.write().await;
            parsers.remove(id);
        }

        // LruCache has no retain, so collect matching keys and pop
        {
            let mut page_cache = self.page_cache.write().await;
            let keys_to_remove: Vec<PageCacheKey> = page_cache
                .iter()
                .filter(|(k, _)| k.pdf_id == id)
                .map(|(k, _)| k.clone())
                .collect();
            for key in keys_to_remove {
                page_cache.pop(&key);
            }
        }
    }

    /// Clear the entire cache
    pub async fn clear(&self) {
        {
            let mut pdfs = self.pdfs.write().await;
            pdfs.clear();
        }
        {
            let mut parsers = self.parsers.write().await;
            parsers.clear();
        }
        {
            let mut page_cache = self.page_cache.write().await;
            page_cache.clear();
        }
    }

    /// Get the number of cached PDFs
    pub async fn len(&self) -> usize {
        let pdfs = self.pdfs.read().await;
        pdfs.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let pdfs = self.pdfs.read().await;
        pdfs.is_empty()
    }

    /// Get page cache statistics (used, capacity)
    pub async fn page_cache_stats(&self) -> (usize, usize) {
        let page_cache = self.page_cache.read().await;
        (page_cache.len(), page_cache.cap().get())
    }
}
