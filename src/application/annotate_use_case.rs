// ============================================================
// Layer 2 — AnnotateUseCase
// ============================================================
// Tags every document in the input directory and writes its
// entity answers. Per document, in order:
//
//   Step 1: Transcode to the legacy encoding   (Layer 6 - infra)
//   Step 2: Morphological analysis             (external tool)
//   Step 3: Featurize                          (external tool)
//   Step 4: Extract token descriptors          (external tool)
//   Step 5: Tag                                (external tool)
//   Step 6: Reconcile tags with tokens         (Layer 4 - data)
//   Step 7: Write <stem>.task1                 (Layer 6 - infra)
//
// A document that fails at any step is recorded in the batch
// report and the next document is processed.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;

use crate::application::config::{ArtifactPaths, PipelineConfig};
use crate::application::report::BatchReport;
use crate::application::stages::StageRunner;
use crate::data::aligner;
use crate::data::artifacts::{parse_sign_records, parse_token_descriptors, render_answers};
use crate::domain::document::SourceFile;
use crate::domain::error::{PipelineError, Stage};
use crate::domain::traits::{DocumentSource, ToolStep, Toolchain};

/// External tools this workflow runs
pub const ANNOTATE_STEPS: [ToolStep; 4] = [
    ToolStep::Analyze,
    ToolStep::Featurize,
    ToolStep::ExtractTokens,
    ToolStep::Tag,
];

/// Tags every document in a directory and writes one answer
/// file per document.
pub struct AnnotateUseCase<S: DocumentSource, T: Toolchain> {
    config: PipelineConfig,
    source: S,
    stages: StageRunner<T>,
}

impl<S: DocumentSource, T: Toolchain> AnnotateUseCase<S, T> {
    pub fn new(config: PipelineConfig, source: S, toolchain: T) -> Result<Self> {
        config.validate()?;
        let stages = StageRunner::new(&config, toolchain)?;
        Ok(Self { config, source, stages })
    }

    /// Annotate every document. Per-document faults end up in
    /// the returned report; only systemic faults are `Err`.
    pub fn execute(&self) -> Result<BatchReport> {
        let work_dir = self.config.work_dir();
        fs::create_dir_all(work_dir)
            .with_context(|| format!("Cannot create work directory '{}'", work_dir.display()))?;

        let files      = self.source.discover()?;
        let mut report = BatchReport::new("annotate");

        for file in &files {
            let paths = self.stages.paths(file);
            match self.annotate(file, &paths) {
                Ok(found) => {
                    tracing::info!("{}: {} entities", file.name, found);
                    report.record_success();
                }
                Err(err) => {
                    remove_stale(&paths);
                    report.record_fault(&err);
                }
            }
        }

        report.log_summary();
        report.save(&self.config.report_path("annotate"))?;
        self.config.save(&self.config.run_config_path())?;
        Ok(report)
    }

    fn annotate(&self, file: &SourceFile, paths: &ArtifactPaths) -> Result<usize, PipelineError> {
        // ── Step 1: Transcode ─────────────────────────────────────────────────
        let document = self.stages.prepare(&self.source, file, paths)?;
        let name     = document.source.as_str();

        // ── Steps 2-5: External tools ─────────────────────────────────────────
        self.stages.tool(ToolStep::Analyze,       name, &paths.transcoded, None, &paths.analysis)?;
        self.stages.tool(ToolStep::Featurize,     name, &paths.analysis,   None, &paths.signs)?;
        self.stages.tool(ToolStep::ExtractTokens, name, &paths.analysis,   None, &paths.tokens)?;
        self.stages.tool(ToolStep::Tag,           name, &paths.signs,      None, &paths.tagged)?;

        // ── Step 6: Reconcile ─────────────────────────────────────────────────
        let tokens = parse_token_descriptors(name, &self.stages.read(name, Stage::ExtractTokens, &paths.tokens)?)?;
        let tagged = self.stages.read(name, Stage::Tag, &paths.tagged)?;
        let signs  = parse_sign_records(name, Stage::Tag, &tagged);
        let answers = aligner::reconcile(&document, &tokens, &signs)?;

        // ── Step 7: Write answers ─────────────────────────────────────────────
        self.stages
            .transcoder()
            .write_text(name, Stage::Write, &paths.answers, &render_answers(&answers))?;
        Ok(answers.len())
    }
}

/// A failed document must not keep answers from an earlier run.
fn remove_stale(paths: &ArtifactPaths) {
    match fs::remove_file(&paths.answers) {
        Ok(()) => tracing::debug!("Removed stale '{}'", paths.answers.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Cannot remove stale '{}': {}", paths.answers.display(), e),
    }
}
