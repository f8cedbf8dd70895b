// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// The pure core of the pipeline plus document discovery.
//
//   .txt files
//       │
//       ▼
//   TextDirLoader     → lists and reads raw documents
//       │
//       ▼   (external tools run here, see infra::tools)
//       │
//   artifacts         → parses token / sign / span files
//       │
//       ├──────────────────────────┐
//       ▼                          ▼
//   normalizer                 aligner
//   (gold categories → classes) (tagger labels → answers)
//       │
//       ▼
//   corpus            → sentinel-framed training corpus
//
// Nothing in this layer except the loader touches the disk,
// so every step is testable on in-memory strings.

/// Lists and reads `.txt` input documents
pub mod loader;

/// Line-format parsers for inter-stage artifacts
pub mod artifacts;

/// Gold category → entity class mapping
pub mod normalizer;

/// Tagger output → verified character-offset answers
pub mod aligner;

/// Sentinel framing and concatenation of training documents
pub mod corpus;
