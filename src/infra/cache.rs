// ============================================================
// Layer 6 — Artifact Cache
// ============================================================
// Every derived artifact (transcoded text, analysis, signs,
// tokens, tagger output) is a file named after its document.
// Before a stage runs, the cache decides whether the file
// already on disk can be reused:
//
//   always     never reuse, always rebuild
//   exists     reuse any existing file, however old
//   timestamp  reuse only if the file is at least as new as
//              every input it was built from (default)
//
// Artifacts are built into `<name>.partial` and renamed into
// place only when the build succeeds, so a crashed or failed
// tool never leaves a half-written file that a later run would
// mistake for a valid cache entry.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    Always,
    Exists,
    #[default]
    Timestamp,
}

/// What `produce` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Produced {
    Reused,
    Built,
}

/// Decides whether an intermediate artifact on disk can be reused,
/// and writes rebuilt ones atomically.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactCache {
    policy: CachePolicy,
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// `<artifact>.partial`
pub fn partial_path(artifact: &Path) -> PathBuf {
    let mut name: OsString = artifact.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

impl ArtifactCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self { policy }
    }

    /// Can `artifact` be reused given the files it was built from?
    pub fn is_reusable(&self, artifact: &Path, inputs: &[&Path]) -> bool {
        match self.policy {
            CachePolicy::Always => false,
            CachePolicy::Exists => artifact.is_file(),
            CachePolicy::Timestamp => {
                let Some(built) = modified(artifact) else {
                    return false;
                };
                inputs
                    .iter()
                    .all(|input| modified(input).is_some_and(|t| t <= built))
            }
        }
    }

    /// Reuse `artifact` or build it with `build`, which receives
    /// the path it must write to.
    pub fn produce<F>(
        &self,
        document: &str,
        stage:    Stage,
        artifact: &Path,
        inputs:   &[&Path],
        build:    F,
    ) -> Result<Produced, PipelineError>
    where
        F: FnOnce(&Path) -> Result<(), PipelineError>,
    {
        if self.is_reusable(artifact, inputs) {
            tracing::debug!("{}: reusing cached {}", document, artifact.display());
            return Ok(Produced::Reused);
        }

        let partial = partial_path(artifact);
        if let Err(err) = build(&partial) {
            // Best effort: the build error is the one worth reporting
            let _ = fs::remove_file(&partial);
            return Err(err);
        }

        fs::rename(&partial, artifact).map_err(|e| PipelineError::io(document, stage, artifact, e))?;
        tracing::debug!("{}: built {}", document, artifact.display());
        Ok(Produced::Built)
    }
}
