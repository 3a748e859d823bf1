//! Zip packaging of in-memory entries
//!
//! Batch assembly for exported PDF pages and downloaded slideshow images.
//! The compression itself is delegated to the `zip` crate; this module only
//! orchestrates entry naming and assembly.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("No entries to archive")]
    Empty,
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single file inside an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Build a Deflate-compressed zip archive from in-memory entries
///
/// Duplicate entry names get a numeric suffix instead of failing the whole
/// archive.
pub fn build_zip(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    if entries.is_empty() {
        return Err(ArchiveError::Empty);
    }

    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut zip = ZipWriter::new(cursor);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut used_names = HashSet::new();
        for entry in entries {
            let name = unique_name(&entry.name, &mut used_names);
            zip.start_file(name, options)?;
            zip.write_all(&entry.data)?;
        }

        zip.finish()?;
    }

    Ok(buffer)
}

/// Entry name for an exported PDF page, e.g. `report_page_3.png`
pub fn page_entry_name(file_stem: &str, page: usize, extension: &str) -> String {
    format!("{}_page_{}.{}", file_stem, page, extension)
}

/// Entry name for a downloaded slideshow image, e.g. `image_1.jpg`
pub fn image_entry_name(index: usize) -> String {
    format!("image_{}.jpg", index)
}

fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    // Split off the extension so `page.png` dedups to `page_2.png`
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };

    let mut counter = 2;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_empty_archive_is_rejected() {
        let result = build_zip(&[]);
        assert!(matches!(result, Err(ArchiveError::Empty)));
    }

    #[test]
    fn test_archive_contains_entries() {
        let entries = vec![
            ArchiveEntry::new("doc_page_1.png", vec![1, 2, 3]),
            ArchiveEntry::new("doc_page_2.png", vec![4, 5, 6]),
        ];
        let bytes = build_zip(&entries).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut data = Vec::new();
        archive
            .by_name("doc_page_2.png")
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(data, vec![4, 5, 6]);
    }

    #[test]
    fn test_duplicate_names_get_suffixed() {
        let entries = vec![
            ArchiveEntry::new("image_1.jpg", vec![1]),
            ArchiveEntry::new("image_1.jpg", vec![2]),
            ArchiveEntry::new("image_1.jpg", vec![3]),
        ];
        let bytes = build_zip(&entries).unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(String::from).collect();
        assert!(names.contains(&"image_1.jpg".to_string()));
        assert!(names.contains(&"image_1_2.jpg".to_string()));
        assert!(names.contains(&"image_1_3.jpg".to_string()));
    }

    #[test]
    fn test_entry_naming() {
        assert_eq!(page_entry_name("report", 3, "png"), "report_page_3.png");
        assert_eq!(image_entry_name(1), "image_1.jpg");
    }
}
