// ============================================================
// Layer 4 — Document Loader
// ============================================================
// Lists the `.txt` files of an input directory and reads them
// as UTF-8.
//
// Order matters: the training corpus is the concatenation of
// documents in listing order, so the listing is sorted by file
// name to make runs reproducible across file systems.
//
// Only the top level of the directory is read; derived
// artifacts written next to the inputs (.cp1251, .json, ...)
// are ignored because of their extensions.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::document::{Document, SourceFile};
use crate::domain::error::{PipelineError, Stage};
use crate::domain::traits::DocumentSource;

/// Extension of raw input documents
pub const TEXT_EXTENSION: &str = "txt";

/// Loads UTF-8 `.txt` documents from one directory.
pub struct TextDirLoader {
    /// Path to the directory containing .txt files
    dir: PathBuf,

    /// Name of the legacy encoding, for fault messages
    target_encoding: String,
}

impl TextDirLoader {
    pub fn new(dir: impl Into<PathBuf>, target_encoding: impl Into<String>) -> Self {
        Self { dir: dir.into(), target_encoding: target_encoding.into() }
    }
}

impl DocumentSource for TextDirLoader {
    fn discover(&self) -> Result<Vec<SourceFile>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read input directory '{}'", self.dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("Cannot list '{}'", self.dir.display()))?;
            let path  = entry.path();

            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(TEXT_EXTENSION) {
                continue;
            }
            match SourceFile::from_path(&path) {
                Some(file) => files.push(file),
                None => tracing::warn!("Skipping '{}': file name is not UTF-8", path.display()),
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::info!("Found {} documents in '{}'", files.len(), self.dir.display());
        Ok(files)
    }

    fn load(&self, file: &SourceFile) -> std::result::Result<Document, PipelineError> {
        let bytes = fs::read(&file.path)
            .map_err(|e| PipelineError::io(&file.name, Stage::Load, &file.path, e))?;

        let text = String::from_utf8(bytes).map_err(|e| PipelineError::Transcoding {
            document: file.name.clone(),
            encoding: self.target_encoding.clone(),
            reason:   format!("input is not valid UTF-8 ({e})"),
        })?;

        tracing::debug!("Loaded: {} ({} chars)", file.name, text.chars().count());
        Ok(Document::new(file.name.clone(), text))
    }
}
