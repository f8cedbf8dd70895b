// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal: annotate a batch, assemble a training corpus, or
// run a single pipeline step on existing files.
//
// Rules for this layer:
//   - No parsing or alignment logic here (that's Layer 4)
//   - No UI or printing here (that's Layer 1)
//   - No process spawning or raw encoding work (that's Layer 6)
//   - Only workflow coordination and fault collection

// Run configuration and artifact naming
pub mod config;

// Per-document fault collection
pub mod report;

// Transcode / tool steps shared by the batch workflows
pub mod stages;

// Batch workflows
pub mod annotate_use_case;
pub mod train_use_case;

// Single-document workflows
pub mod reconcile_use_case;
pub mod normalize_use_case;

#[cfg(test)]
mod testing;
