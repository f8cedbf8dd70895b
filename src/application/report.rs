// ============================================================
// Layer 2 — Batch Report
// ============================================================
// One corrupt document must not stop the rest of a batch, so
// per-document faults are collected here and reported once at
// the end: logged as a summary and written as JSON next to the
// artifacts.
//
// Example report:
//   {
//     "command": "annotate",
//     "documents": 3, "succeeded": 2, "warnings": 1, "errors": 0,
//     "faults": [ { "document": "b.txt", "stage": "reconcile",
//                   "kind": "alignment-mismatch", "severity": "warning",
//                   "message": "..." } ]
//   }

use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, path::Path};

use crate::domain::error::{FaultKind, PipelineError, Severity, Stage};

#[derive(Debug, Clone, Serialize)]
pub struct FaultRecord {
    pub document: String,
    pub stage:    Stage,
    pub kind:     FaultKind,
    pub severity: Severity,
    pub message:  String,
}

impl From<&PipelineError> for FaultRecord {
    fn from(err: &PipelineError) -> Self {
        Self {
            document: err.document().to_string(),
            stage:    err.stage(),
            kind:     err.kind(),
            severity: err.severity(),
            message:  err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub command:   String,
    pub documents: usize,
    pub succeeded: usize,
    pub warnings:  usize,
    pub errors:    usize,
    pub faults:    Vec<FaultRecord>,
}

impl BatchReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command:   command.into(),
            documents: 0,
            succeeded: 0,
            warnings:  0,
            errors:    0,
            faults:    Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.documents += 1;
        self.succeeded += 1;
    }

    pub fn record_fault(&mut self, err: &PipelineError) {
        self.documents += 1;
        match err.severity() {
            Severity::Warning => {
                self.warnings += 1;
                tracing::warn!("{}", err);
            }
            Severity::Error => {
                self.errors += 1;
                tracing::error!("{}", err);
            }
        }
        self.faults.push(FaultRecord::from(err));
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "{}: {} documents, {} succeeded, {} warnings, {} errors",
            self.command,
            self.documents,
            self.succeeded,
            self.warnings,
            self.errors
        );
        for fault in &self.faults {
            tracing::info!(
                "  [{:?}] {} at {}: {:?}",
                fault.severity,
                fault.document,
                fault.stage,
                fault.kind
            );
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Cannot write report to '{}'", path.display()))?;
        tracing::info!("Report written to '{}'", path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut report = BatchReport::new("annotate");
        report.record_success();
        report.record_fault(&PipelineError::AlignmentMismatch {
            document: "b.txt".into(),
            tokens:   5,
            signs:    7,
        });
        assert_eq!((report.documents, report.succeeded, report.warnings, report.errors), (2, 1, 1, 0));
        assert!(!report.has_errors());

        report.record_fault(&PipelineError::Integrity {
            document: "c.txt".into(),
            index:    3,
            detail:   "surface mismatch".into(),
        });
        assert!(report.has_errors());
        assert_eq!(report.faults.len(), 2);
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = BatchReport::new("train");
        report.record_fault(&PipelineError::Classification {
            document:   "d.txt".into(),
            categories: vec!["event".into()],
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["command"], "train");
        assert_eq!(json["faults"][0]["document"], "d.txt");
        assert_eq!(json["faults"][0]["stage"], "normalize");
        assert_eq!(json["faults"][0]["kind"], "classification-error");
        assert_eq!(json["faults"][0]["severity"], "error");
    }
}
