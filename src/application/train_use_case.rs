// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Builds the tagger's training corpus from gold-annotated
// documents. Per document, in order:
//
//   Step 1: Transcode to the legacy encoding   (Layer 6 - infra)
//   Step 2: Morphological analysis             (external tool)
//   Step 3: Normalize gold spans → <stem>.ann  (Layer 4 - data)
//   Step 4: Featurize with labels              (external tool)
//   Step 5: Frame the labelled records         (Layer 4 - data)
//
// Framed blocks are appended to the corpus in directory-listing
// order. The corpus is written under a temporary name and only
// renamed into place once every document has been processed.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;

use crate::application::config::{ArtifactPaths, PipelineConfig};
use crate::application::report::BatchReport;
use crate::application::stages::StageRunner;
use crate::data::artifacts::{parse_annotation_spans, parse_sign_records, render_labeled_spans};
use crate::data::corpus::{CorpusAssembler, CorpusWriter, FramedBlock};
use crate::data::normalizer;
use crate::domain::document::SourceFile;
use crate::domain::error::{PipelineError, Stage};
use crate::domain::traits::{DocumentSource, ToolStep, Toolchain};
use crate::infra::cache::partial_path;

/// Extension of the gold span file next to each `.txt`
pub const SPANS_EXTENSION: &str = "spans";

/// External tools this workflow runs
pub const TRAIN_STEPS: [ToolStep; 2] = [ToolStep::Analyze, ToolStep::FeaturizeTraining];

/// Builds the tagger training corpus from documents with gold spans.
pub struct TrainUseCase<S: DocumentSource, T: Toolchain> {
    config:    PipelineConfig,
    source:    S,
    stages:    StageRunner<T>,
    assembler: CorpusAssembler,
}

impl<S: DocumentSource, T: Toolchain> TrainUseCase<S, T> {
    pub fn new(config: PipelineConfig, source: S, toolchain: T) -> Result<Self> {
        config.validate()?;
        let assembler = config.assembler()?;
        let stages    = StageRunner::new(&config, toolchain)?;
        Ok(Self { config, source, stages, assembler })
    }

    /// Assemble the corpus. Per-document faults end up in the
    /// returned report; a corpus that cannot be written is `Err`.
    pub fn execute(&self) -> Result<BatchReport> {
        let cfg      = &self.config;
        let work_dir = cfg.work_dir();
        fs::create_dir_all(work_dir)
            .with_context(|| format!("Cannot create work directory '{}'", work_dir.display()))?;

        let files = self.source.discover()?;

        // ── Open the corpus under its temporary name ──────────────────────────
        let corpus_tmp = partial_path(&cfg.corpus_path);
        if let Some(parent) = cfg.corpus_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create corpus directory '{}'", parent.display()))?;
        }
        let out = File::create(&corpus_tmp)
            .with_context(|| format!("Cannot create corpus '{}'", corpus_tmp.display()))?;
        let mut corpus = CorpusWriter::new(BufWriter::new(out), self.stages.transcoder().encoding());

        let mut report = BatchReport::new("train");

        for file in &files {
            let paths = self.stages.paths(file);
            match self.prepare_block(file, &paths) {
                Ok(block) => {
                    if let Err(e) = corpus.append(&block) {
                        let _ = fs::remove_file(&corpus_tmp);
                        return Err(e).with_context(|| format!("Cannot write corpus '{}'", corpus_tmp.display()));
                    }
                    tracing::info!("{}: {} corpus lines", file.name, block.len());
                    report.record_success();
                }
                Err(err) => report.record_fault(&err),
            }
        }

        // ── Move the finished corpus into place ───────────────────────────────
        let (documents, lines) = (corpus.documents(), corpus.lines());
        corpus
            .finish()
            .with_context(|| format!("Cannot write corpus '{}'", corpus_tmp.display()))?;
        fs::rename(&corpus_tmp, &cfg.corpus_path)
            .with_context(|| format!("Cannot move corpus to '{}'", cfg.corpus_path.display()))?;
        tracing::info!(
            "Corpus '{}': {} documents, {} lines",
            cfg.corpus_path.display(),
            documents,
            lines
        );

        report.log_summary();
        report.save(&cfg.report_path("train"))?;
        cfg.save(&cfg.run_config_path())?;
        Ok(report)
    }

    fn prepare_block(&self, file: &SourceFile, paths: &ArtifactPaths) -> Result<FramedBlock, PipelineError> {
        // ── Step 1: Transcode ─────────────────────────────────────────────────
        let document = self.stages.prepare(&self.source, file, paths)?;
        let name     = document.source.as_str();

        // ── Step 2: Analyze ───────────────────────────────────────────────────
        self.stages.tool(ToolStep::Analyze, name, &paths.transcoded, None, &paths.analysis)?;

        // ── Step 3: Gold spans → label annotations ────────────────────────────
        // Normalized on every run so unknown categories are always reported
        let spans_path = file.sibling(SPANS_EXTENSION);
        let content = fs::read_to_string(&spans_path)
            .map_err(|e| PipelineError::io(name, Stage::Normalize, &spans_path, e))?;
        let spans   = parse_annotation_spans(name, &content, Some(document.char_len()))?;
        let labeled = normalizer::label_spans(name, &spans)?;
        tracing::debug!("{}: {} gold spans, {} kept", name, spans.len(), labeled.len());

        self.stages.cache().produce(name, Stage::Normalize, &paths.annotations, &[spans_path.as_path()], |partial| {
            self.stages
                .transcoder()
                .write_text(name, Stage::Normalize, partial, &render_labeled_spans(&labeled))
        })?;

        // ── Step 4: Featurize with labels ─────────────────────────────────────
        self.stages.tool(
            ToolStep::FeaturizeTraining,
            name,
            &paths.analysis,
            Some(paths.annotations.as_path()),
            &paths.train_signs,
        )?;

        // ── Step 5: Frame ─────────────────────────────────────────────────────
        let signs   = self.stages.read(name, Stage::Featurize, &paths.train_signs)?;
        let records = parse_sign_records(name, Stage::Featurize, &signs);
        self.assembler.frame(name, &records)
    }
}
