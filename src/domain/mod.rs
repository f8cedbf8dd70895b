// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the pipeline
// works with: documents, token descriptors, sign records,
// annotation spans, entity classes and answer records.
//
// Rules for this layer:
//   - NO file I/O or process spawning
//   - NO clap types
//   - Only plain Rust data, typed errors and traits
//
// Everything above (application) and below (data, infra)
// speaks in these types.

// A loaded document and its text
pub mod document;

// Token descriptors and sign (feature) records
pub mod token;

// Entity classes, gold annotation spans, answer records
pub mod entity;

// Per-document fault types
pub mod error;

// Abstractions implemented by the data and infra layers
pub mod traits;
