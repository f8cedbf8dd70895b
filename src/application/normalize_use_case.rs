// ============================================================
// Layer 2 — NormalizeUseCase
// ============================================================
// Turns one gold `.spans` file into the label annotation lines
// the training featurizer reads:
//
//   T1 name 0 4 John        →  PER	0	4
//   T2 job 5 6 driver       →  (dropped)
//   T3 loc_name 14 5 Paris  →  LOC	14	19

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::artifacts::{parse_annotation_spans, render_labeled_spans};
use crate::data::normalizer;
use crate::domain::error::Stage;
use crate::infra::transcoder::Transcoder;

#[derive(Debug, Clone)]
pub struct NormalizeRequest {
    /// Gold span file, UTF-8
    pub spans:  PathBuf,
    /// Annotation file to write; lines are only returned when unset
    pub output: Option<PathBuf>,
}

/// Maps one gold span file onto entity class annotations.
pub struct NormalizeUseCase {
    transcoder: Transcoder,
}

impl NormalizeUseCase {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self { transcoder: config.transcoder()? })
    }

    /// Normalize the spans and return the rendered `.ann` lines.
    pub fn execute(&self, request: &NormalizeRequest) -> Result<String> {
        let name = request.spans.display().to_string();
        let content = fs::read_to_string(&request.spans)
            .with_context(|| format!("Cannot read gold spans from '{name}'"))?;

        let spans   = parse_annotation_spans(&name, &content, None)?;
        let labeled = normalizer::label_spans(&name, &spans)?;
        tracing::info!("{}: {} spans, {} kept", name, spans.len(), labeled.len());

        let rendered = render_labeled_spans(&labeled);
        if let Some(output) = &request.output {
            self.transcoder.write_text(&name, Stage::Write, output, &rendered)?;
        }
        Ok(rendered)
    }
}
