// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and their flags:
//
//   annotate   tag a directory of documents
//   train      assemble the training corpus
//   reconcile  align existing tagger output for one document
//   normalize  convert one gold span file to label annotations
//
// Batch flags override the matching fields of the JSON config
// (or of the defaults when no --config is given); a flag that is
// not passed leaves the configured value alone.

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::application::normalize_use_case::NormalizeRequest;
use crate::application::reconcile_use_case::ReconcileRequest;
use crate::infra::cache::CachePolicy;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag every <stem>.txt in the input directory and write <stem>.task1 answers
    Annotate(AnnotateArgs),

    /// Assemble the tagger training corpus from <stem>.txt + <stem>.spans pairs
    Train(TrainArgs),

    /// Align existing tagger output with token descriptors for one document
    Reconcile(ReconcileArgs),

    /// Map the categories of one gold span file onto PER / LOC / ORG
    Normalize(NormalizeArgs),
}

// ─── Shared batch flags ──────────────────────────────────────────────────────
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Directory containing the input .txt files
    #[arg(long)]
    pub texts_dir: Option<PathBuf>,

    /// Directory for derived artifacts (defaults to the input directory)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// When to reuse artifacts from an earlier run
    #[arg(long, value_enum)]
    pub cache: Option<CacheArg>,

    /// Legacy encoding the external tools read and write
    #[arg(long)]
    pub encoding: Option<String>,

    /// Fail documents with characters the encoding cannot represent
    #[arg(long)]
    pub strict_transcoding: bool,

    /// Seconds an external tool may run before it is killed
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl PipelineArgs {
    /// Lay the flags that were given over `config`.
    pub fn apply(self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(dir) = self.texts_dir {
            config.texts_dir = dir;
        }
        if let Some(dir) = self.work_dir {
            config.work_dir = Some(dir);
        }
        if let Some(cache) = self.cache {
            config.cache = cache.into();
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if self.strict_transcoding {
            config.strict_transcoding = true;
        }
        if let Some(secs) = self.timeout_secs {
            config.tools.timeout_secs = secs;
        }
        config
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CacheArg {
    /// Always recompute
    Always,
    /// Reuse any artifact that exists
    Exists,
    /// Reuse artifacts newer than their inputs
    Timestamp,
}

/// clap types stay in this layer
impl From<CacheArg> for CachePolicy {
    fn from(arg: CacheArg) -> Self {
        match arg {
            CacheArg::Always    => CachePolicy::Always,
            CacheArg::Exists    => CachePolicy::Exists,
            CacheArg::Timestamp => CachePolicy::Timestamp,
        }
    }
}

// ─── Batch commands ──────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct AnnotateArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Where to write the assembled corpus
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Sentinel copies around each document
    #[arg(long)]
    pub context_window: Option<usize>,
}

impl TrainArgs {
    pub fn apply(self, config: PipelineConfig) -> PipelineConfig {
        let mut config = self.pipeline.apply(config);
        if let Some(corpus) = self.corpus {
            config.corpus_path = corpus;
        }
        if let Some(window) = self.context_window {
            config.context_window = window;
        }
        config
    }
}

// ─── Single-document commands ────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Transcoded document text
    #[arg(long)]
    pub text: PathBuf,

    /// Token descriptor file
    #[arg(long)]
    pub tokens: PathBuf,

    /// Tagger output file
    #[arg(long)]
    pub tagged: PathBuf,

    /// Answer file to write (printed to stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Legacy encoding of the inputs and the answer file
    #[arg(long)]
    pub encoding: Option<String>,
}

impl From<ReconcileArgs> for ReconcileRequest {
    fn from(a: ReconcileArgs) -> Self {
        ReconcileRequest {
            text:   a.text,
            tokens: a.tokens,
            tagged: a.tagged,
            output: a.output,
        }
    }
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Gold span file (ID CATEGORY OFFSET LENGTH per line)
    #[arg(long)]
    pub spans: PathBuf,

    /// Annotation file to write (printed to stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl From<NormalizeArgs> for NormalizeRequest {
    fn from(a: NormalizeArgs) -> Self {
        NormalizeRequest { spans: a.spans, output: a.output }
    }
}
