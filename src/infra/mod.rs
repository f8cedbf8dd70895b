// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the outside world on behalf of the
// pipeline:
//
//   transcoder.rs — UTF-8 ⇄ legacy code page. Documents are
//                   re-encoded before the tools see them and
//                   tool artifacts are decoded before parsing.
//
//   cache.rs      — Decides whether an artifact already on
//                   disk can be reused, and writes new ones
//                   atomically via a `.partial` file.
//
//   tools.rs      — Runs the external analyzer, featurizers
//                   and tagger with placeholders substituted,
//                   a timeout, and exit-status checks.
//
// The application layer only sees the Toolchain trait, so the
// driver can be tested with a fake toolchain.

/// Legacy encoding conversion
pub mod transcoder;

/// Artifact reuse policy and atomic writes
pub mod cache;

/// External tool processes
pub mod tools;
