// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer drives documents through the pipeline
// without knowing where they come from or which binaries do
// the analysis:
//
//   DocumentSource → TextDirLoader (data layer)
//   Toolchain      → ProcessToolchain (infra layer), or a fake
//                    in tests that writes canned artifacts

use std::path::Path;

use anyhow::Result;

use crate::domain::document::{Document, SourceFile};
use crate::domain::error::{PipelineError, Stage};

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Anything that can list input documents and read them.
pub trait DocumentSource {
    /// List input files in processing order. Failing here is
    /// systemic (the input directory itself is unusable).
    fn discover(&self) -> Result<Vec<SourceFile>>;

    /// Read one file. Failing here only affects that document.
    fn load(&self, file: &SourceFile) -> std::result::Result<Document, PipelineError>;
}

// ─── Toolchain ────────────────────────────────────────────────────────────────
/// The external programs the pipeline shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStep {
    /// Morphological analysis of the transcoded text
    Analyze,
    /// Token descriptors (offset, length, surface) from the analysis
    ExtractTokens,
    /// Feature vectors, one line per token
    Featurize,
    /// Feature vectors with a trailing gold label column
    FeaturizeTraining,
    /// Sequence tagger: feature vectors in, labelled lines out
    Tag,
}

impl ToolStep {
    pub fn stage(self) -> Stage {
        match self {
            Self::Analyze           => Stage::Analyze,
            Self::ExtractTokens     => Stage::ExtractTokens,
            Self::Featurize         => Stage::Featurize,
            Self::FeaturizeTraining => Stage::Featurize,
            Self::Tag               => Stage::Tag,
        }
    }
}

/// Files handed to one tool invocation.
#[derive(Debug, Clone, Copy)]
pub struct ToolInvocation<'a> {
    /// Name of the document being processed, for fault messages
    pub document:    &'a str,
    pub input:       &'a Path,
    /// Label annotations, only for FeaturizeTraining
    pub annotations: Option<&'a Path>,
    /// Where the tool's result must end up
    pub output:      &'a Path,
}

pub trait Toolchain {
    /// Run one step. On success `invocation.output` exists.
    fn run(&self, step: ToolStep, invocation: ToolInvocation<'_>) -> std::result::Result<(), PipelineError>;
}

impl<T: Toolchain + ?Sized> Toolchain for &T {
    fn run(&self, step: ToolStep, invocation: ToolInvocation<'_>) -> std::result::Result<(), PipelineError> {
        (**self).run(step, invocation)
    }
}
