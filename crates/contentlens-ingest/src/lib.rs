//! Document ingestion boundary for ContentLens.
//!
//! Turns an uploaded file into cleaned text plus the signals the workflow
//! needs before it starts: the detected source language and whether the
//! text looks like a media brief.
//!
//! # Main types
//!
//! - [`FileLoader`]: Size/extension validation and dispatch to a [`TextExtractor`].
//! - [`IngestConfig`]: The `[ingest]` configuration section.
//! - [`PreparedDocument`]: Output of [`prepare_document`].

pub mod config;
pub mod loader;
pub mod text;

pub use config::{CommandSpec, IngestConfig};
pub use loader::{CommandExtractor, FileLoader, PlainTextExtractor, TextExtractor};
pub use text::{detect_language, sanitize_text, BriefValidator, UNKNOWN_LANGUAGE};

use contentlens_core::{ContentLensError, ContentLensResult};
use std::path::Path;
use tracing::{info, warn};

/// Cleaned document text ready for the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDocument {
    pub text: String,
    pub source_lang: String,
    pub looks_like_brief: bool,
}

/// Load, sanitize, validate and language-tag one file.
///
/// Only loading and an empty result are errors; a failed brief check is
/// logged and reported in [`PreparedDocument::looks_like_brief`].
pub async fn prepare_document(loader: &FileLoader, path: &Path) -> ContentLensResult<PreparedDocument> {
    let raw = loader.load(path).await?;
    let text = sanitize_text(&raw);
    if text.is_empty() {
        return Err(ContentLensError::Ingest(
            "No text could be extracted from the file.".to_string(),
        ));
    }

    let looks_like_brief = BriefValidator::default().is_valid_brief(&text);
    if !looks_like_brief {
        warn!("Document may not be a valid media brief, proceeding anyway");
    }

    let source_lang = detect_language(&text);
    info!(chars = text.len(), language = %source_lang, "Document prepared");

    Ok(PreparedDocument {
        text,
        source_lang,
        looks_like_brief,
    })
}
