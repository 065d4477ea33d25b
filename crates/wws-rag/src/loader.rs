//! PDF and CSV loading, and text chunking

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use wws_core::{Error, Result, ReviewRecord};

/// Columns the review CSV must carry
pub const REVIEW_COLUMNS: [&str; 5] = ["SKU", "Review_Text", "Rating", "Date", "Customer_ID"];

/// List `*.pdf` files (case-insensitive) directly inside `folder`, sorted by name
pub fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

/// Extract the text of every page of a PDF, whitespace-normalized
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;

    // pdf-extract panics on some malformed inputs
    let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(&bytes)
    }))
    .map_err(|_| {
        Error::DocumentLoader(format!("PDF parser panicked on {}", path.display()))
    })?
    .map_err(|e| Error::DocumentLoader(format!("{}: {}", path.display(), e)))?;

    Ok(normalize_whitespace(&extracted))
}

/// Collapse runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into chunks of at most `chunk_size` characters, consecutive
/// chunks sharing up to `overlap` characters. Splits prefer whitespace in
/// the second half of the window and never cut a UTF-8 character.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + chunk_size).min(chars.len());

        if end < chars.len() {
            let floor = start + chunk_size / 2;
            if let Some(split) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                if split > start {
                    end = split;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect::<String>().trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }

        if end >= chars.len() {
            break;
        }

        start = if end > start + overlap {
            end - overlap
        } else {
            end
        };
    }

    chunks
}

/// Rows of the review CSV: parsed records with their 0-based data row index,
/// and one message per row that failed to parse
#[derive(Debug, Default)]
pub struct ReviewRows {
    pub records: Vec<(usize, ReviewRecord)>,
    pub errors: Vec<String>,
}

/// Load the customer review CSV
///
/// A missing column fails the whole file. A malformed row is reported in
/// `errors` and skipped; the remaining rows keep their original indices.
pub fn load_reviews(path: &Path) -> Result<ReviewRows> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| Error::DocumentLoader(format!("{}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::DocumentLoader(format!("{}: {}", path.display(), e)))?
        .clone();

    for column in REVIEW_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::DocumentLoader(format!(
                "{}: missing column {}",
                path.display(),
                column
            )));
        }
    }

    let mut rows = ReviewRows::default();
    for (row_index, result) in reader.deserialize::<ReviewRecord>().enumerate() {
        match result {
            Ok(record) => rows.records.push((row_index, record)),
            Err(e) => rows
                .errors
                .push(format!("{} row {}: {}", path.display(), row_index, e)),
        }
    }

    Ok(rows)
}
