// ============================================================
// Layer 4 — Artifact Parsers
// ============================================================
// Line formats of the files that flow between pipeline stages.
// All parsers take already-decoded text; decoding from the
// legacy code page is the transcoder's job.
//
//   token descriptors   OFFSET<TAB>LENGTH<TAB>SURFACE
//   sign records        FIELD FIELD ... LABEL   (whitespace)
//   gold spans          ID CATEGORY OFFSET LENGTH [...]
//   answers             CLASS<TAB>OFFSET<TAB>LENGTH<TAB># SURFACE
//
// Line numbers in errors are 1-based file lines, blank lines
// included, so they point straight at the offending line.

use crate::domain::entity::{AnnotationSpan, AnswerRecord, LabeledSpan};
use crate::domain::error::{PipelineError, Stage};
use crate::domain::token::{SignRecord, TokenDescriptor};

fn malformed(document: &str, stage: Stage, artifact: &'static str, line: usize, reason: impl Into<String>) -> PipelineError {
    PipelineError::MalformedArtifact {
        document: document.to_string(),
        stage,
        artifact,
        line,
        reason: reason.into(),
    }
}

/// Parse the token extractor's output.
pub fn parse_token_descriptors(document: &str, content: &str) -> Result<Vec<TokenDescriptor>, PipelineError> {
    const ARTIFACT: &str = "token descriptors";
    let mut tokens = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let bad = |reason: String| malformed(document, Stage::ExtractTokens, ARTIFACT, line_no, reason);

        let mut parts = line.splitn(3, '\t');
        let (Some(offset), Some(length), Some(surface)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(bad(format!("expected 3 tab-separated fields in '{line}'")));
        };
        let offset: usize = offset
            .trim()
            .parse()
            .map_err(|_| bad(format!("offset '{offset}' is not a non-negative integer")))?;
        let length: usize = length
            .trim()
            .parse()
            .map_err(|_| bad(format!("length '{length}' is not a non-negative integer")))?;
        if length == 0 {
            return Err(bad("token length is zero".to_string()));
        }
        if surface.chars().count() != length {
            return Err(bad(format!("surface '{surface}' is not {length} characters long")));
        }

        tokens.push(TokenDescriptor::new(offset, length, surface));
    }

    Ok(tokens)
}

/// Parse featurizer or tagger output. Blank lines separate
/// sequences in the tagger's format and carry no token.
pub fn parse_sign_records(
    document: &str,
    stage:    Stage,
    content:  &str,
) -> Vec<SignRecord> {
    let records: Vec<SignRecord> = content.lines().filter_map(SignRecord::parse).collect();
    tracing::trace!("{}: {} sign records parsed at {}", document, records.len(), stage);
    records
}

/// Parse a gold `.spans` file into annotation spans
/// with exclusive end offsets. With `text_len` set, spans
/// reaching past the end of the text are rejected.
pub fn parse_annotation_spans(
    document: &str,
    content:  &str,
    text_len: Option<usize>,
) -> Result<Vec<AnnotationSpan>, PipelineError> {
    const ARTIFACT: &str = "gold spans";
    let mut spans = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let bad = |reason: String| malformed(document, Stage::Normalize, ARTIFACT, line_no, reason);

        if fields.len() < 4 {
            return Err(bad(format!("expected 'ID CATEGORY OFFSET LENGTH', got '{line}'")));
        }
        let category = fields[1];
        let offset: usize = fields[2]
            .parse()
            .map_err(|_| bad(format!("offset '{}' is not a non-negative integer", fields[2])))?;
        let length: usize = fields[3]
            .parse()
            .map_err(|_| bad(format!("length '{}' is not a non-negative integer", fields[3])))?;
        if length == 0 {
            return Err(bad("span length is zero".to_string()));
        }
        let end = offset
            .checked_add(length)
            .ok_or_else(|| bad(format!("span {offset}+{length} overflows")))?;
        if let Some(limit) = text_len.filter(|&limit| end > limit) {
            return Err(bad(format!("span {offset}..{end} is outside the text ({limit} chars)")));
        }

        spans.push(AnnotationSpan::new(category, offset, end));
    }

    Ok(spans)
}

/// Render answers, one line each, newline-terminated.
pub fn render_answers(answers: &[AnswerRecord]) -> String {
    answers.iter().map(|a| format!("{a}\n")).collect()
}

/// Render label annotations for the training featurizer.
pub fn render_labeled_spans(spans: &[LabeledSpan]) -> String {
    spans.iter().map(|s| format!("{s}\n")).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EntityClass;

    #[test]
    fn test_parse_token_descriptors() {
        let content = "0\t4\tJohn\n5\t5\tlives\n\n19\t1\t.\n";
        let tokens = parse_token_descriptors("a.txt", content).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], TokenDescriptor::new(0, 4, "John"));
        assert_eq!(tokens[2], TokenDescriptor::new(19, 1, "."));
    }

    #[test]
    fn test_token_descriptor_errors_carry_line_numbers() {
        let content = "0\t4\tJohn\n\nx\t5\tlives\n";
        match parse_token_descriptors("a.txt", content) {
            Err(PipelineError::MalformedArtifact { line, stage, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(stage, Stage::ExtractTokens);
            }
            other => panic!("expected malformed artifact, got {other:?}"),
        }
    }

    #[test]
    fn test_token_descriptor_rejects_zero_length_and_bad_surface() {
        assert!(parse_token_descriptors("a.txt", "0\t0\t\n").is_err());
        assert!(parse_token_descriptors("a.txt", "0\t3\tJohn\n").is_err());
        assert!(parse_token_descriptors("a.txt", "0\t4\n").is_err());
    }

    #[test]
    fn test_sign_records_skip_sequence_breaks() {
        let content = "John\tx\tPerson\nlives\tx\tNO\n\n";
        let records = parse_sign_records("a.txt", Stage::Tag, content);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label(), "Person");
    }

    #[test]
    fn test_parse_gold_spans_converts_length_to_end() {
        let content = "T1 name 0 4 John\nT2 loc_name 14 5 Paris\n\n";
        let spans = parse_annotation_spans("a.txt", content, None).unwrap();
        assert_eq!(spans, vec![
            AnnotationSpan::new("name", 0, 4),
            AnnotationSpan::new("loc_name", 14, 19),
        ]);
    }

    #[test]
    fn test_parse_gold_spans_rejects_short_lines() {
        assert!(matches!(
            parse_annotation_spans("a.txt", "T1 name 0\n", None),
            Err(PipelineError::MalformedArtifact { line: 1, .. })
        ));
        assert!(parse_annotation_spans("a.txt", "T1 name 0 0\n", None).is_err());
    }

    #[test]
    fn test_parse_gold_spans_checks_text_bounds() {
        let content = "T1 name 0 4\n\nT2 loc_name 14 5\n";
        assert!(parse_annotation_spans("a.txt", content, Some(19)).is_ok());
        assert!(matches!(
            parse_annotation_spans("a.txt", content, Some(18)),
            Err(PipelineError::MalformedArtifact { line: 3, .. })
        ));
    }

    #[test]
    fn test_parse_gold_spans_rejects_overflowing_offsets() {
        let content = "T1 name 18446744073709551615 1\n";
        for limit in [None, Some(10)] {
            assert!(matches!(
                parse_annotation_spans("a.txt", content, limit),
                Err(PipelineError::MalformedArtifact { line: 1, stage: Stage::Normalize, .. })
            ));
        }
    }

    #[test]
    fn test_render_answers() {
        let answers = vec![
            AnswerRecord::new(EntityClass::Person, 0, 4, "John"),
            AnswerRecord::new(EntityClass::Location, 14, 5, "Paris"),
        ];
        let text = render_answers(&answers);
        assert_eq!(text, "PER\t0\t4\t# John\nLOC\t14\t5\t# Paris\n");
    }

    #[test]
    fn test_render_labeled_spans() {
        let spans = vec![LabeledSpan { class: EntityClass::Organization, start: 3, end: 9 }];
        assert_eq!(render_labeled_spans(&spans), "ORG\t3\t9\n");
    }
}
