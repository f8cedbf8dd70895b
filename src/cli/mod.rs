// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `annotate`  — tag a directory of documents
//   2. `train`     — assemble the tagger training corpus
//   3. `reconcile` — align existing tagger output for one document
//   4. `normalize` — map one gold span file onto entity classes

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AnnotateArgs, Commands, NormalizeArgs, ReconcileArgs, TrainArgs};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::application::report::BatchReport;
use crate::data::loader::TextDirLoader;
use crate::infra::tools::ProcessToolchain;

#[derive(Parser, Debug)]
#[command(
    name = "ner-pipeline",
    version,
    about = "Drive external NER tools over text collections: tag documents, reconcile answers, assemble training corpora."
)]
pub struct Cli {
    /// JSON config file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Load the config and dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        let config = PipelineConfig::load(self.config.as_deref())?;
        match self.command {
            Commands::Annotate(args)  => run_annotate(args, config),
            Commands::Train(args)     => run_train(args, config),
            Commands::Reconcile(args) => run_reconcile(args, config),
            Commands::Normalize(args) => run_normalize(args, config),
        }
    }
}

fn run_annotate(args: AnnotateArgs, config: PipelineConfig) -> Result<()> {
    use crate::application::annotate_use_case::{AnnotateUseCase, ANNOTATE_STEPS};

    let config = args.pipeline.apply(config);
    tracing::info!("Annotating documents in: {}", config.texts_dir.display());

    let toolchain = ProcessToolchain::new(config.tools.clone());
    toolchain.verify(&ANNOTATE_STEPS)?;
    let loader = TextDirLoader::new(&config.texts_dir, &config.encoding);

    let report = AnnotateUseCase::new(config, loader, toolchain)?.execute()?;
    finish(&report)
}

fn run_train(args: TrainArgs, config: PipelineConfig) -> Result<()> {
    use crate::application::train_use_case::{TrainUseCase, TRAIN_STEPS};

    let config = args.apply(config);
    tracing::info!("Assembling corpus from documents in: {}", config.texts_dir.display());

    let toolchain = ProcessToolchain::new(config.tools.clone());
    toolchain.verify(&TRAIN_STEPS)?;
    let loader = TextDirLoader::new(&config.texts_dir, &config.encoding);

    let report = TrainUseCase::new(config, loader, toolchain)?.execute()?;
    finish(&report)
}

fn run_reconcile(args: ReconcileArgs, mut config: PipelineConfig) -> Result<()> {
    use crate::application::reconcile_use_case::ReconcileUseCase;

    if let Some(encoding) = args.encoding.clone() {
        config.encoding = encoding;
    }
    let print = args.output.is_none();
    let answers = ReconcileUseCase::new(&config)?.execute(&args.into())?;
    if print {
        print!("{answers}");
    }
    Ok(())
}

fn run_normalize(args: NormalizeArgs, config: PipelineConfig) -> Result<()> {
    use crate::application::normalize_use_case::NormalizeUseCase;

    let print = args.output.is_none();
    let lines = NormalizeUseCase::new(&config)?.execute(&args.into())?;
    if print {
        print!("{lines}");
    }
    Ok(())
}

/// The report is already saved; error faults still fail the run.
fn finish(report: &BatchReport) -> Result<()> {
    if report.has_errors() {
        anyhow::bail!(
            "{} of {} documents failed, see the {} report",
            report.errors,
            report.documents,
            report.command
        );
    }
    println!(
        "{}: {} of {} documents processed ({} warnings).",
        report.command, report.succeeded, report.documents, report.warnings
    );
    Ok(())
}
