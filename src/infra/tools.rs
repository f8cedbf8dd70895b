// ============================================================
// Layer 6 — External Tools
// ============================================================
// Runs the analyzer, token extractor, featurizers and tagger as
// child processes.
//
// Each tool is configured as a program plus an argument list in
// which three placeholders are substituted per document:
//
//   {input}        the stage's input artifact
//   {output}       where the result must be written
//   {annotations}  label annotations (training featurizer only)
//
// Tools whose arguments mention {output} write the file
// themselves (the analyzer does); for all others stdout is
// redirected into the output file.
//
// Every run has a timeout. A child that overruns is killed, and
// a non-zero exit status is a fault.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use wait_timeout::ChildExt;

use crate::domain::error::PipelineError;
use crate::domain::traits::{ToolInvocation, ToolStep, Toolchain};

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";
pub const ANNOTATIONS_PLACEHOLDER: &str = "{annotations}";

/// How many bytes of stderr end up in a fault message
const STDERR_TAIL: usize = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub program: String,
    #[serde(default)]
    pub args:    Vec<String>,
}

impl ToolSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args:    args.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the tool writes {output} itself instead of stdout
    pub fn writes_own_output(&self) -> bool {
        self.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER))
    }

    /// Substitute placeholders for one invocation.
    pub fn render_args(&self, invocation: &ToolInvocation<'_>) -> std::result::Result<Vec<String>, String> {
        let input  = invocation.input.to_string_lossy();
        let output = invocation.output.to_string_lossy();
        let annotations = invocation.annotations.map(|p| p.to_string_lossy());

        self.args
            .iter()
            .map(|arg| {
                let mut rendered = arg.replace(INPUT_PLACEHOLDER, &input).replace(OUTPUT_PLACEHOLDER, &output);
                if rendered.contains(ANNOTATIONS_PLACEHOLDER) {
                    let Some(annotations) = &annotations else {
                        return Err(format!("argument '{arg}' needs {ANNOTATIONS_PLACEHOLDER} but none were given"));
                    };
                    rendered = rendered.replace(ANNOTATIONS_PLACEHOLDER, annotations);
                }
                Ok(rendered)
            })
            .collect()
    }
}

// ─── Tool Configuration ──────────────────────────────────────────────────────
/// One ToolSpec per pipeline step plus the shared timeout.
/// Defaults run mystem for analysis and CRF++ for tagging, with
/// the NamedEntityRecognition helper producing tokens and features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub analyzer:         ToolSpec,
    pub token_extractor:  ToolSpec,
    pub featurizer:       ToolSpec,
    pub train_featurizer: ToolSpec,
    pub tagger:           ToolSpec,
    pub timeout_secs:     u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            analyzer: ToolSpec::new(
                "mystem",
                ["-ncisd", "--eng-gr", "-e", "cp1251", "--format", "json", INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER],
            ),
            token_extractor:  ToolSpec::new("NamedEntityRecognition", ["--prepare_answer_file", INPUT_PLACEHOLDER]),
            featurizer:       ToolSpec::new("NamedEntityRecognition", ["--prepare_test_file", INPUT_PLACEHOLDER]),
            train_featurizer: ToolSpec::new(
                "NamedEntityRecognition",
                ["--prepare_train_file", INPUT_PLACEHOLDER, ANNOTATIONS_PLACEHOLDER],
            ),
            tagger:           ToolSpec::new("crf_test", ["-m", "model.crf-model", INPUT_PLACEHOLDER]),
            timeout_secs:     300,
        }
    }
}

impl ToolsConfig {
    pub fn spec(&self, step: ToolStep) -> &ToolSpec {
        match step {
            ToolStep::Analyze           => &self.analyzer,
            ToolStep::ExtractTokens     => &self.token_extractor,
            ToolStep::Featurize         => &self.featurizer,
            ToolStep::FeaturizeTraining => &self.train_featurizer,
            ToolStep::Tag               => &self.tagger,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─── ProcessToolchain ─────────────────────────────────────────────────────────
/// Toolchain backed by real child processes.
pub struct ProcessToolchain {
    tools: ToolsConfig,
}

impl ProcessToolchain {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    /// Check up front that every program the run needs exists.
    /// A missing binary would fail every document, so it aborts
    /// the run instead.
    pub fn verify(&self, steps: &[ToolStep]) -> Result<()> {
        for &step in steps {
            let spec = self.tools.spec(step);
            let path = resolve_program(&spec.program).ok_or_else(|| {
                anyhow::anyhow!("{:?} tool '{}' not found (check the config or PATH)", step, spec.program)
            })?;
            tracing::debug!("{:?} tool: {}", step, path.display());
        }
        Ok(())
    }
}

impl Toolchain for ProcessToolchain {
    fn run(&self, step: ToolStep, invocation: ToolInvocation<'_>) -> std::result::Result<(), PipelineError> {
        run_tool(self.tools.spec(step), step, invocation, self.tools.timeout())
    }
}

/// Find a program the way a shell would: paths with a directory
/// component are taken as-is, bare names are searched on PATH.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let start = trimmed
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| trimmed.len() - i <= STDERR_TAIL)
        .unwrap_or(0);
    format!(": {}", &trimmed[start..])
}

/// Run one tool to completion or timeout.
pub fn run_tool(
    spec:       &ToolSpec,
    step:       ToolStep,
    invocation: ToolInvocation<'_>,
    timeout:    Duration,
) -> std::result::Result<(), PipelineError> {
    let fail = |reason: String| PipelineError::ExternalTool {
        document: invocation.document.to_string(),
        stage:    step.stage(),
        program:  spec.program.clone(),
        reason,
    };

    let args = spec.render_args(&invocation).map_err(fail)?;

    let mut command = Command::new(&spec.program);
    command.args(&args).stdin(Stdio::null()).stderr(Stdio::piped());
    if spec.writes_own_output() {
        command.stdout(Stdio::null());
    } else {
        let out = File::create(invocation.output)
            .map_err(|e| PipelineError::io(invocation.document, step.stage(), invocation.output, e))?;
        command.stdout(Stdio::from(out));
    }

    tracing::debug!("{}: {} {}", invocation.document, spec.program, args.join(" "));
    let mut child = command.spawn().map_err(|e| fail(format!("cannot start: {e}")))?;

    // Drain stderr on a separate thread so a chatty tool cannot
    // block on a full pipe while we wait for it.
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(fail(format!("timed out after {:?}", timeout)));
        }
        Err(e) => return Err(fail(format!("cannot wait for process: {e}"))),
    };

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if !status.success() {
        return Err(fail(format!("{status}{}", stderr_tail(&stderr))));
    }
    if !invocation.output.is_file() {
        return Err(fail(format!("no output written to '{}'", invocation.output.display())));
    }
    if !stderr.trim().is_empty() {
        tracing::debug!("{}: {} stderr: {}", invocation.document, spec.program, stderr.trim());
    }
    Ok(())
}
