// ============================================================
// Layer 2 — ReconcileUseCase
// ============================================================
// Runs the Token Aligner on artifacts that already exist for one
// document, without touching any external tool. Useful to redo
// the answers after a tagger run made elsewhere.
//
// All three inputs are in the legacy encoding, as the tools
// wrote them; so is the answer file.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::aligner;
use crate::data::artifacts::{parse_sign_records, parse_token_descriptors, render_answers};
use crate::domain::document::Document;
use crate::domain::error::Stage;
use crate::infra::transcoder::Transcoder;

#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    /// Transcoded document text
    pub text:   PathBuf,
    /// Token descriptors
    pub tokens: PathBuf,
    /// Tagger output
    pub tagged: PathBuf,
    /// Answer file to write; answers are only returned when unset
    pub output: Option<PathBuf>,
}

/// Reconciles existing tool artifacts of a single document.
pub struct ReconcileUseCase {
    transcoder: Transcoder,
}

impl ReconcileUseCase {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self { transcoder: config.transcoder()? })
    }

    /// Reconcile and return the rendered answer lines.
    pub fn execute(&self, request: &ReconcileRequest) -> Result<String> {
        let name = request
            .text
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("'{}' has no file name", request.text.display()))?;

        let text   = self.transcoder.read_text(&name, Stage::Reconcile, &request.text)?;
        let tokens = self.transcoder.read_text(&name, Stage::ExtractTokens, &request.tokens)?;
        let tagged = self.transcoder.read_text(&name, Stage::Tag, &request.tagged)?;

        let document = Document::new(name.as_str(), text);
        let tokens   = parse_token_descriptors(&name, &tokens)?;
        let signs    = parse_sign_records(&name, Stage::Tag, &tagged);
        let answers  = aligner::reconcile(&document, &tokens, &signs)?;
        tracing::info!("{}: {} entities", name, answers.len());

        let rendered = render_answers(&answers);
        if let Some(output) = &request.output {
            self.transcoder.write_text(&name, Stage::Write, output, &rendered)?;
            tracing::info!("Answers written to '{}'", output.display());
        }
        Ok(rendered)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PipelineError;
    use std::fs;

    fn request(dir: &std::path::Path, tagged: &str) -> ReconcileRequest {
        fs::write(dir.join("a.cp1251"), "John lives in Paris.").unwrap();
        fs::write(dir.join("a.tokens"), "0\t4\tJohn\n5\t5\tlives\n14\t5\tParis\n").unwrap();
        fs::write(dir.join("a.crf-tested"), tagged).unwrap();
        ReconcileRequest {
            text:   dir.join("a.cp1251"),
            tokens: dir.join("a.tokens"),
            tagged: dir.join("a.crf-tested"),
            output: Some(dir.join("a.task1")),
        }
    }

    #[test]
    fn test_reconcile_existing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "John\tx\tPerson\nlives\tx\tNO\nParis\tx\tOrg\n\n");

        let use_case = ReconcileUseCase::new(&PipelineConfig::default()).unwrap();
        let rendered = use_case.execute(&req).unwrap();

        assert_eq!(rendered, "PER\t0\t4\t# John\nORG\t14\t5\t# Paris\n");
        assert_eq!(fs::read_to_string(dir.path().join("a.task1")).unwrap(), rendered);
    }

    #[test]
    fn test_surface_disagreement_is_integrity_fault() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "Jon\tx\tPerson\nlives\tx\tNO\nParis\tx\tNO\n");

        let use_case = ReconcileUseCase::new(&PipelineConfig::default()).unwrap();
        let err = use_case.execute(&req).unwrap_err();

        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::Integrity { index: 0, .. })));
        assert!(!dir.path().join("a.task1").exists());
    }
}
