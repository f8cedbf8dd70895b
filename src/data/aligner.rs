// ============================================================
// Layer 4 — Token Aligner / Span Reconstructor
// ============================================================
// Turns the tagger's per-line labels back into character-offset
// answers by pairing line i of the tagger output with token
// descriptor i:
//
//   tagger line i:  John ... Person      → label "PER"
//   descriptor i:   0  4  John           → offset/length
//   text[0..4]:     John                 → must agree
//
//   answer:         PER  0  4  # John
//
// The two sequences come from different tools, so before any
// token is emitted its surface is checked against both the
// descriptor and the text itself. A disagreement means the two
// tool outputs drifted apart and every later offset is suspect,
// so the whole document fails rather than emitting bad spans.
//
// Length tolerance: the sequences may differ by one element;
// the extra tail element is ignored. More than one is a
// mismatch and nothing is emitted.

use crate::domain::document::Document;
use crate::domain::entity::{AnswerRecord, EntityClass};
use crate::domain::error::{PipelineError, Stage};
use crate::domain::token::{SignRecord, TokenDescriptor};

/// Label the tagger uses for non-entity tokens
pub const OUTSIDE_LABEL: &str = "NO";

/// Upper-case the label and keep its first three characters,
/// so `Person` / `Loc` / `Org` / `NO` become `PER` / `LOC` / `ORG` / `NO`.
pub fn normalize_label(label: &str) -> String {
    label.to_uppercase().chars().take(3).collect()
}

/// Maximum allowed difference between token and sign counts
pub const ALIGNMENT_TOLERANCE: usize = 1;

/// Pair tagger output with token descriptors index by index and
/// return the entity answers in token order.
///
/// Counts may differ by at most `ALIGNMENT_TOLERANCE`; the extra
/// tail element is ignored. Each paired token must match its sign
/// surface and the document text at its offset.
pub fn reconcile(
    document: &Document,
    tokens:   &[TokenDescriptor],
    signs:    &[SignRecord],
) -> Result<Vec<AnswerRecord>, PipelineError> {
    let name = document.source.as_str();

    if tokens.len().abs_diff(signs.len()) > ALIGNMENT_TOLERANCE {
        return Err(PipelineError::AlignmentMismatch {
            document: name.to_string(),
            tokens:   tokens.len(),
            signs:    signs.len(),
        });
    }
    if tokens.len() != signs.len() {
        tracing::debug!(
            "{}: ignoring tail element ({} tokens, {} signs)",
            name,
            tokens.len(),
            signs.len()
        );
    }

    let mut answers = Vec::new();

    // zip stops at the shorter sequence, which is exactly the tail rule
    for (index, (token, sign)) in tokens.iter().zip(signs).enumerate() {
        let label = normalize_label(sign.label());
        if label == OUTSIDE_LABEL {
            continue;
        }

        verify_token(document, index, token, sign)?;

        let class = EntityClass::from_code(&label).ok_or_else(|| PipelineError::MalformedArtifact {
            document: name.to_string(),
            stage:    Stage::Reconcile,
            artifact: "tagger output",
            line:     index + 1,
            reason:   format!("unknown label '{}'", sign.label()),
        })?;

        answers.push(AnswerRecord::new(class, token.offset, token.length, token.surface.clone()));
    }

    tracing::debug!("{}: {} entity tokens reconstructed", name, answers.len());
    Ok(answers)
}

/// Sign surface == descriptor surface == text slice.
fn verify_token(
    document: &Document,
    index:    usize,
    token:    &TokenDescriptor,
    sign:     &SignRecord,
) -> Result<(), PipelineError> {
    let fault = |detail: String| PipelineError::Integrity {
        document: document.source.clone(),
        index,
        detail,
    };

    if sign.surface() != token.surface {
        return Err(fault(format!(
            "tagger surface '{}' does not match token descriptor surface '{}'",
            sign.surface(),
            token.surface
        )));
    }

    match document.char_slice(token.offset, token.length) {
        Some(slice) if slice == token.surface => Ok(()),
        Some(slice) => Err(fault(format!(
            "text at {}+{} is '{}', token descriptor says '{}'",
            token.offset, token.length, slice, token.surface
        ))),
        None => Err(fault(format!(
            "range {}+{} is outside the text ({} chars)",
            token.offset,
            token.length,
            document.char_len()
        ))),
    }
}
