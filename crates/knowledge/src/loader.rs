//! Document loading and text extraction.
//!
//! Turns raw file bytes into a [`Document`] keyed by its base filename.
//! Only plain text, Markdown and PDF are accepted.

use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// Recognized document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from a filename's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();

        match ext.as_str() {
            "txt" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Markdown => "markdown",
            Self::Pdf => "pdf",
        }
    }
}

/// Extracted text of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Full extracted text
    pub text: String,

    /// Base filename the text came from
    pub source: String,
}

/// File contents handed to the service before extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Strip any directory part from an uploaded filename.
pub fn base_filename(filename: &str) -> &str {
    filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
}

/// Extract a document from raw bytes.
///
/// # Errors
/// - `AppError::UnsupportedFormat` for anything but `.txt`, `.md`, `.markdown`, `.pdf`
/// - `AppError::Extraction` for invalid UTF-8, unreadable PDFs, or blank text
pub async fn load(bytes: Vec<u8>, filename: &str) -> AppResult<Document> {
    let source = base_filename(filename).to_string();

    let format = DocumentFormat::from_filename(&source)
        .ok_or_else(|| AppError::UnsupportedFormat(source.clone()))?;

    tracing::debug!(
        "Loading {} ({} bytes, format: {})",
        source,
        bytes.len(),
        format.as_str()
    );

    let text = match format {
        DocumentFormat::PlainText | DocumentFormat::Markdown => String::from_utf8(bytes)
            .map_err(|e| AppError::extraction(&source, format!("invalid UTF-8: {}", e)))?,
        DocumentFormat::Pdf => extract_pdf(bytes, &source).await?,
    };

    if text.trim().is_empty() {
        return Err(AppError::extraction(&source, "no text"));
    }

    Ok(Document { text, source })
}

async fn extract_pdf(bytes: Vec<u8>, source: &str) -> AppResult<String> {
    // pdf-extract is synchronous and may panic on malformed input
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::extraction(source, format!("PDF parser aborted: {}", e)))?
        .map_err(|e| AppError::extraction(source, e.to_string()))
}

/// Read every regular file directly inside `dir`, sorted by filename.
///
/// A missing directory yields an empty list. Unreadable files are logged and
/// skipped; format checks happen later in [`load`].
pub async fn read_corpus_dir(dir: &Path) -> AppResult<Vec<RawDocument>> {
    if !dir.exists() {
        tracing::warn!("Documents directory {:?} does not exist", dir);
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().to_string();
        match tokio::fs::read(entry.path()).await {
            Ok(bytes) => documents.push(RawDocument { filename, bytes }),
            Err(e) => tracing::warn!("Skipping unreadable file {:?}: {}", entry.path(), e),
        }
    }

    tracing::debug!("Read {} files from {:?}", documents.len(), dir);

    Ok(documents)
}
