//! File loading: validation, then dispatch to a [`TextExtractor`] by extension.

use crate::config::{CommandSpec, IngestConfig};
use async_trait::async_trait;
use contentlens_core::{ContentLensError, ContentLensResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Turns one file into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn extract_text(&self, path: &Path) -> ContentLensResult<String>;
}

/// Reads UTF-8 text files.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    async fn extract_text(&self, path: &Path) -> ContentLensResult<String> {
        let bytes = tokio::fs::read(path).await?;
        String::from_utf8(bytes)
            .map_err(|_| ContentLensError::Ingest("file is not valid UTF-8 text".to_string()))
    }
}

/// Runs an external program and takes its stdout as the file's text.
pub struct CommandExtractor {
    spec: CommandSpec,
}

impl CommandExtractor {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }

    fn args_for(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.spec
            .args
            .iter()
            .map(|arg| arg.replace("{path}", &path))
            .collect()
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.spec.program
    }

    async fn extract_text(&self, path: &Path) -> ContentLensResult<String> {
        let args = self.args_for(path);
        info!(program = %self.spec.program, ?args, "Running external text extractor");

        let result = tokio::time::timeout(
            Duration::from_secs(self.spec.timeout_secs),
            tokio::process::Command::new(&self.spec.program)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ContentLensError::Ingest(format!(
                    "'{}' exited with code {}: {}",
                    self.spec.program,
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                )))
            }
            Ok(Err(e)) => Err(ContentLensError::Ingest(format!(
                "failed to run '{}': {e}",
                self.spec.program
            ))),
            Err(_) => Err(ContentLensError::Ingest(format!(
                "'{}' timed out after {}s",
                self.spec.program, self.spec.timeout_secs
            ))),
        }
    }
}

/// Validates files and routes them to the extractor for their extension.
pub struct FileLoader {
    config: IngestConfig,
    extractors: HashMap<String, Arc<dyn TextExtractor>>,
}

impl FileLoader {
    /// Build a loader with the plain-text extractor for `txt` and one
    /// [`CommandExtractor`] per configured command.
    pub fn new(config: IngestConfig) -> Self {
        let mut loader = Self {
            extractors: HashMap::new(),
            config: config.clone(),
        };
        loader.register("txt", Arc::new(PlainTextExtractor));
        for spec in config.commands {
            let extractor: Arc<dyn TextExtractor> = Arc::new(CommandExtractor::new(spec.clone()));
            for ext in &spec.extensions {
                loader.register(ext, extractor.clone());
            }
        }
        loader
    }

    /// Register (or replace) the extractor for one extension.
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn TextExtractor>) {
        self.extractors
            .insert(extension.to_ascii_lowercase(), extractor);
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Check existence, extension and size. Returns the lowercased extension.
    pub async fn validate(&self, path: &Path) -> ContentLensResult<String> {
        let metadata = tokio::fs::metadata(path).await.map_err(|_| {
            error!(path = %path.display(), "File not found");
            ContentLensError::Ingest(format!("File not found: {}", path.display()))
        })?;

        let ext = extension_of(path);
        if !self.config.is_allowed(&ext) {
            error!(extension = %ext, "Unsupported file type");
            return Err(ContentLensError::Ingest(format!(
                "File type '.{ext}' is not supported. Supported formats: {}",
                self.config.allowed_extensions.join(",")
            )));
        }

        if metadata.len() > self.config.max_file_size_bytes() {
            error!(path = %path.display(), bytes = metadata.len(), "File too large");
            return Err(ContentLensError::Ingest(format!(
                "File exceeds max size of {} MB",
                self.config.max_file_size_mb
            )));
        }

        Ok(ext)
    }

    /// Validate `path` and extract its text.
    pub async fn load(&self, path: &Path) -> ContentLensResult<String> {
        let ext = self.validate(path).await?;
        let extractor = self.extractors.get(&ext).ok_or_else(|| {
            ContentLensError::Ingest(format!("No loader found for extension: .{ext}"))
        })?;

        info!(path = %path.display(), extractor = extractor.name(), "Loading file");
        extractor.extract_text(path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "FileLoader error");
            match e {
                ContentLensError::Ingest(msg) => {
                    ContentLensError::Ingest(format!("Failed to process file: {msg}"))
                }
                other => ContentLensError::Ingest(format!("Failed to process file: {other}")),
            }
        })
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}
