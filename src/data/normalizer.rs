// ============================================================
// Layer 4 — Category Normalizer
// ============================================================
// Maps the fine-grained gold categories onto the closed entity
// class set:
//
//   name, surname, nickname, patronymic  → PER
//   loc_name, loc_descr, geo_adj         → LOC
//   org_name, org_descr                  → ORG
//   job, prj_name, prj_descr             → dropped
//   anything else                        → error
//
// The domain is closed: an unknown category means the gold data
// uses a scheme this mapping was not written for, so it must
// never be silently dropped.

use crate::domain::entity::{AnnotationSpan, EntityClass, LabeledSpan};
use crate::domain::error::PipelineError;

/// Result of normalizing one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    Class(EntityClass),
    Dropped,
}

/// Category is outside the known domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

/// Normalize a single category.
pub fn normalize(category: &str) -> Result<Normalized, UnknownCategory> {
    let normalized = match category {
        "name" | "surname" | "nickname" | "patronymic" => Normalized::Class(EntityClass::Person),
        "loc_name" | "loc_descr" | "geo_adj"           => Normalized::Class(EntityClass::Location),
        "org_name" | "org_descr"                       => Normalized::Class(EntityClass::Organization),
        "job" | "prj_name" | "prj_descr"               => Normalized::Dropped,
        other => return Err(UnknownCategory(other.to_string())),
    };
    Ok(normalized)
}

/// Normalize all spans of one document into `.ann` lines.
///
/// Dropped categories produce nothing. Unknown categories are
/// collected (in first-seen order, no duplicates) and reported
/// together so one run shows everything wrong with the file.
pub fn label_spans(document: &str, spans: &[AnnotationSpan]) -> Result<Vec<LabeledSpan>, PipelineError> {
    let mut labeled = Vec::with_capacity(spans.len());
    let mut unknown: Vec<String> = Vec::new();

    for span in spans {
        match normalize(&span.category) {
            Ok(Normalized::Class(class)) => labeled.push(LabeledSpan {
                class,
                start: span.start,
                end:   span.end,
            }),
            Ok(Normalized::Dropped) => {}
            Err(UnknownCategory(category)) => {
                if !unknown.contains(&category) {
                    unknown.push(category);
                }
            }
        }
    }

    if !unknown.is_empty() {
        return Err(PipelineError::Classification {
            document:   document.to_string(),
            categories: unknown,
        });
    }

    tracing::debug!(
        "{}: {} of {} gold spans kept after normalization",
        document,
        labeled.len(),
        spans.len()
    );
    Ok(labeled)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_CATEGORIES: [&str; 12] = [
        "name", "surname", "nickname", "patronymic",
        "loc_name", "loc_descr", "geo_adj",
        "org_name", "org_descr",
        "job", "prj_name", "prj_descr",
    ];

    #[test]
    fn test_every_known_category_normalizes() {
        for category in KNOWN_CATEGORIES {
            assert!(normalize(category).is_ok(), "{category} should be known");
        }
    }

    #[test]
    fn test_person_location_organization() {
        assert_eq!(normalize("patronymic"), Ok(Normalized::Class(EntityClass::Person)));
        assert_eq!(normalize("geo_adj"),    Ok(Normalized::Class(EntityClass::Location)));
        assert_eq!(normalize("org_descr"),  Ok(Normalized::Class(EntityClass::Organization)));
    }

    #[test]
    fn test_dropped_categories() {
        for category in ["job", "prj_name", "prj_descr"] {
            assert_eq!(normalize(category), Ok(Normalized::Dropped));
        }
    }

    #[test]
    fn test_unknown_categories_are_errors() {
        // Case matters and near-misses are not accepted
        for category in ["", "Name", "location", "org", "facility", "name "] {
            assert_eq!(normalize(category), Err(UnknownCategory(category.to_string())));
        }
    }

    #[test]
    fn test_label_spans_drops_and_keeps_offsets() {
        let spans = vec![
            AnnotationSpan::new("name", 0, 4),
            AnnotationSpan::new("job", 5, 10),
            AnnotationSpan::new("loc_name", 14, 19),
        ];
        let labeled = label_spans("a.txt", &spans).unwrap();
        let lines: Vec<String> = labeled.iter().map(|s| s.to_string()).collect();
        assert_eq!(lines, vec!["PER\t0\t4", "LOC\t14\t19"]);
    }

    #[test]
    fn test_label_spans_only_dropped_gives_nothing() {
        let spans = vec![AnnotationSpan::new("prj_descr", 0, 3)];
        assert!(label_spans("a.txt", &spans).unwrap().is_empty());
    }

    #[test]
    fn test_label_spans_collects_all_unknown_categories() {
        let spans = vec![
            AnnotationSpan::new("event", 0, 4),
            AnnotationSpan::new("name", 5, 9),
            AnnotationSpan::new("facility", 10, 12),
            AnnotationSpan::new("event", 13, 15),
        ];
        match label_spans("bad.txt", &spans) {
            Err(PipelineError::Classification { document, categories }) => {
                assert_eq!(document, "bad.txt");
                assert_eq!(categories, vec!["event", "facility"]);
            }
            other => panic!("expected classification error, got {other:?}"),
        }
    }
}
