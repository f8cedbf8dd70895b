// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// Every path, flag and tool setting a run needs, in one struct
// that is threaded into each stage. Serialisable so it can be
// loaded from a JSON file and saved next to the batch report
// as a record of what the run actually used.
//
// Example config file (any field may be omitted):
//   {
//     "texts_dir": "test-texts",
//     "cache": "exists",
//     "tools": { "tagger": { "program": "/opt/crf/crf_test",
//                            "args": ["-m", "ner.crf-model", "{input}"] } }
//   }

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::data::corpus::{CorpusAssembler, DEFAULT_BEGIN_SENTINEL, DEFAULT_CONTEXT_WINDOW, DEFAULT_END_SENTINEL};
use crate::infra::cache::CachePolicy;
use crate::infra::tools::ToolsConfig;
use crate::infra::transcoder::Transcoder;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding `<stem>.txt` inputs (and `<stem>.spans` for training)
    pub texts_dir:          PathBuf,
    /// Where derived artifacts go; defaults to `texts_dir`
    pub work_dir:           Option<PathBuf>,
    /// Legacy encoding the external tools expect
    pub encoding:           String,
    /// Fail a document on unencodable characters instead of replacing them
    pub strict_transcoding: bool,
    pub cache:              CachePolicy,
    /// Tokens of context the tagger sees on each side; also the
    /// number of sentinel copies framing each training document
    pub context_window:     usize,
    pub begin_sentinel:     String,
    pub end_sentinel:       String,
    /// Assembled training corpus
    pub corpus_path:        PathBuf,
    /// Report file name inside the work dir; `<command>-report.json` if unset
    pub report_name:        Option<String>,
    pub tools:              ToolsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            texts_dir:          PathBuf::from("texts"),
            work_dir:           None,
            encoding:           "windows-1251".to_string(),
            strict_transcoding: false,
            cache:              CachePolicy::default(),
            context_window:     DEFAULT_CONTEXT_WINDOW,
            begin_sentinel:     DEFAULT_BEGIN_SENTINEL.to_string(),
            end_sentinel:       DEFAULT_END_SENTINEL.to_string(),
            corpus_path:        PathBuf::from("train-texts.cp1251.signs"),
            report_name:        None,
            tools:              ToolsConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file, or return defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))?;
        tracing::debug!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.as_deref().unwrap_or(&self.texts_dir)
    }

    pub fn transcoder(&self) -> Result<Transcoder> {
        Transcoder::for_label(&self.encoding, self.strict_transcoding)
    }

    pub fn assembler(&self) -> Result<CorpusAssembler> {
        CorpusAssembler::new(self.context_window, &self.begin_sentinel, &self.end_sentinel)
            .context("Invalid corpus framing settings")
    }

    /// Reject settings that would make every document fail.
    pub fn validate(&self) -> Result<()> {
        self.transcoder()?;
        self.assembler()?;
        anyhow::ensure!(self.tools.timeout_secs > 0, "tools.timeout_secs must be positive");
        Ok(())
    }

    pub fn report_path(&self, command: &str) -> PathBuf {
        let name = self
            .report_name
            .clone()
            .unwrap_or_else(|| format!("{command}-report.json"));
        self.work_dir().join(name)
    }

    pub fn run_config_path(&self) -> PathBuf {
        self.work_dir().join("run_config.json")
    }
}

// ─── Artifact Paths ──────────────────────────────────────────────────────────
/// Names of every file derived from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub transcoded:  PathBuf,
    pub analysis:    PathBuf,
    pub signs:       PathBuf,
    pub tokens:      PathBuf,
    pub tagged:      PathBuf,
    pub answers:     PathBuf,
    pub annotations: PathBuf,
    pub train_signs: PathBuf,
}

impl ArtifactPaths {
    pub fn new(work_dir: &Path, stem: &str) -> Self {
        let at = |ext: &str| work_dir.join(format!("{stem}.{ext}"));
        Self {
            transcoded:  at("cp1251"),
            analysis:    at("json"),
            signs:       at("signs"),
            tokens:      at("tokens"),
            tagged:      at("crf-tested"),
            answers:     at("task1"),
            annotations: at("ann"),
            train_signs: at("train-signs"),
        }
    }
}
