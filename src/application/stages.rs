// ============================================================
// Layer 2 — Shared Document Stages
// ============================================================
// The steps both workflows start with, and the plumbing that
// wraps every tool call in the artifact cache:
//
//   <stem>.txt ──transcode──▶ <stem>.cp1251 ──analyze──▶ <stem>.json
//
// After `prepare` the document's text is the DECODED transcoded
// file, i.e. exactly the characters the tools saw.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::application::config::{ArtifactPaths, PipelineConfig};
use crate::domain::document::{Document, SourceFile};
use crate::domain::error::{PipelineError, Stage};
use crate::domain::traits::{DocumentSource, ToolInvocation, ToolStep, Toolchain};
use crate::infra::cache::ArtifactCache;
use crate::infra::transcoder::Transcoder;

/// Steps shared by the annotate and train workflows: transcoding
/// into the work directory and cache-aware tool calls.
pub struct StageRunner<T: Toolchain> {
    toolchain:  T,
    transcoder: Transcoder,
    cache:      ArtifactCache,
    work_dir:   PathBuf,
}

impl<T: Toolchain> StageRunner<T> {
    pub fn new(config: &PipelineConfig, toolchain: T) -> Result<Self> {
        Ok(Self {
            toolchain,
            transcoder: config.transcoder()?,
            cache:      ArtifactCache::new(config.cache),
            work_dir:   config.work_dir().to_path_buf(),
        })
    }

    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn paths(&self, file: &SourceFile) -> ArtifactPaths {
        ArtifactPaths::new(&self.work_dir, &file.stem)
    }

    /// Transcode (or reuse) the document and return the text the
    /// tools will see.
    pub fn prepare<S: DocumentSource>(
        &self,
        source: &S,
        file:   &SourceFile,
        paths:  &ArtifactPaths,
    ) -> Result<Document, PipelineError> {
        let name = file.name.as_str();

        self.cache.produce(name, Stage::Transcode, &paths.transcoded, &[file.path.as_path()], |partial| {
            let original = source.load(file)?;
            self.transcoder.write_document(&original, partial).map(|_| ())
        })?;

        let text = self.transcoder.read_text(name, Stage::Transcode, &paths.transcoded)?;
        Ok(Document::new(name, text))
    }

    /// Run one tool step through the cache. The output is reused
    /// when it is fresh with respect to `input` and `annotations`.
    pub fn tool(
        &self,
        step:        ToolStep,
        document:    &str,
        input:       &Path,
        annotations: Option<&Path>,
        output:      &Path,
    ) -> Result<(), PipelineError> {
        let mut inputs = vec![input];
        inputs.extend(annotations);

        self.cache.produce(document, step.stage(), output, &inputs, |partial| {
            self.toolchain.run(step, ToolInvocation { document, input, annotations, output: partial })
        })?;
        Ok(())
    }

    /// Read a legacy-encoded artifact as text.
    pub fn read(&self, document: &str, stage: Stage, path: &Path) -> Result<String, PipelineError> {
        self.transcoder.read_text(document, stage, path)
    }
}
