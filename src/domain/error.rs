// ============================================================
// Layer 3 — Per-Document Faults
// ============================================================
// Everything that can go wrong with ONE document is a
// PipelineError. These never abort a batch: the driver
// collects them and reports them once the batch is done.
//
// Run-level failures (missing tool binary, unwritable output
// directory, bad config) are plain anyhow errors instead.
//
// Every variant carries the document name so a report line is
// actionable on its own.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Where in the pipeline a fault happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Load,
    Transcode,
    Analyze,
    ExtractTokens,
    Featurize,
    Tag,
    Normalize,
    Reconcile,
    Assemble,
    Write,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load          => "load",
            Self::Transcode     => "transcode",
            Self::Analyze       => "analyze",
            Self::ExtractTokens => "extract-tokens",
            Self::Featurize     => "featurize",
            Self::Tag           => "tag",
            Self::Normalize     => "normalize",
            Self::Reconcile     => "reconcile",
            Self::Assemble      => "assemble",
            Self::Write         => "write",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse fault classification for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultKind {
    TranscodingFailure,
    AlignmentMismatch,
    ClassificationError,
    IntegrityFault,
    ExternalToolFailure,
    MalformedArtifact,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input is not valid UTF-8, or (strict mode) has characters
    /// the legacy encoding cannot represent.
    #[error("'{document}': cannot transcode to {encoding}: {reason}")]
    Transcoding {
        document: String,
        encoding: String,
        reason:   String,
    },

    /// Token and sign sequences differ by more than one element.
    #[error("'{document}': {tokens} token descriptors vs {signs} sign records, alignment skipped")]
    AlignmentMismatch {
        document: String,
        tokens:   usize,
        signs:    usize,
    },

    /// Gold spans use categories outside the closed domain.
    #[error("'{document}': unknown annotation categories: {}", .categories.join(", "))]
    Classification {
        document:   String,
        categories: Vec<String>,
    },

    /// Sign record, token descriptor and raw text disagree.
    #[error("'{document}': token {index}: {detail}")]
    Integrity {
        document: String,
        index:    usize,
        detail:   String,
    },

    /// An external tool could not be started, timed out,
    /// exited non-zero or produced no output.
    #[error("'{document}': {stage} tool '{program}' failed: {reason}")]
    ExternalTool {
        document: String,
        stage:    Stage,
        program:  String,
        reason:   String,
    },

    /// An artifact line could not be parsed.
    #[error("'{document}': malformed {artifact} at line {line}: {reason}")]
    MalformedArtifact {
        document: String,
        stage:    Stage,
        artifact: &'static str,
        line:     usize,
        reason:   String,
    },

    #[error("'{document}': {stage}: cannot access '{}': {source}", .path.display())]
    Io {
        document: String,
        stage:    Stage,
        path:     PathBuf,
        #[source]
        source:   std::io::Error,
    },
}

impl PipelineError {
    /// Shorthand used wherever a file operation fails
    pub fn io(document: &str, stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { document: document.to_string(), stage, path: path.into(), source }
    }

    pub fn document(&self) -> &str {
        match self {
            Self::Transcoding { document, .. }
            | Self::AlignmentMismatch { document, .. }
            | Self::Classification { document, .. }
            | Self::Integrity { document, .. }
            | Self::ExternalTool { document, .. }
            | Self::MalformedArtifact { document, .. }
            | Self::Io { document, .. } => document,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Transcoding { .. }             => Stage::Transcode,
            Self::AlignmentMismatch { .. }       => Stage::Reconcile,
            Self::Classification { .. }          => Stage::Normalize,
            Self::Integrity { .. }               => Stage::Reconcile,
            Self::ExternalTool { stage, .. }     => *stage,
            Self::MalformedArtifact { stage, .. } => *stage,
            Self::Io { stage, .. }               => *stage,
        }
    }

    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Transcoding { .. }       => FaultKind::TranscodingFailure,
            Self::AlignmentMismatch { .. } => FaultKind::AlignmentMismatch,
            Self::Classification { .. }    => FaultKind::ClassificationError,
            Self::Integrity { .. }         => FaultKind::IntegrityFault,
            Self::ExternalTool { .. }      => FaultKind::ExternalToolFailure,
            Self::MalformedArtifact { .. } => FaultKind::MalformedArtifact,
            Self::Io { .. }                => FaultKind::Io,
        }
    }

    /// A length mismatch only means one document has no answers;
    /// everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            Self::AlignmentMismatch { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_mismatch_is_a_warning() {
        let err = PipelineError::AlignmentMismatch { document: "a.txt".into(), tokens: 5, signs: 7 };
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(err.kind(), FaultKind::AlignmentMismatch);
        assert_eq!(err.stage(), Stage::Reconcile);
        assert_eq!(err.document(), "a.txt");
    }

    #[test]
    fn test_classification_message_lists_categories() {
        let err = PipelineError::Classification {
            document:   "b.txt".into(),
            categories: vec!["facility".into(), "event".into()],
        };
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(
            err.to_string(),
            "'b.txt': unknown annotation categories: facility, event"
        );
    }

    #[test]
    fn test_tool_failure_keeps_its_stage() {
        let err = PipelineError::ExternalTool {
            document: "c.txt".into(),
            stage:    Stage::Tag,
            program:  "crf_test".into(),
            reason:   "exit status 1".into(),
        };
        assert_eq!(err.stage(), Stage::Tag);
        assert_eq!(err.kind(), FaultKind::ExternalToolFailure);
    }
}
