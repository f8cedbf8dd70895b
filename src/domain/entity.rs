// ============================================================
// Layer 3 — Entities, Annotation Spans and Answers
// ============================================================
// EntityClass is the closed output vocabulary. On the wire it
// is always the three-letter code (PER / LOC / ORG), which is
// also what a tagger label like "Person" truncates to.
//
// Example answer line:
//   PER	0	4	# John

use std::fmt;

/// Closed set of entity classes the pipeline emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Person,
    Location,
    Organization,
}

impl EntityClass {
    pub const ALL: [EntityClass; 3] = [Self::Person, Self::Location, Self::Organization];

    /// Three-letter code used in answer and annotation files
    pub fn code(self) -> &'static str {
        match self {
            Self::Person       => "PER",
            Self::Location     => "LOC",
            Self::Organization => "ORG",
        }
    }

    /// Look up a class by its three-letter code
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ─── AnnotationSpan ──────────────────────────────────────────────────────────
/// A gold annotation: fine-grained category over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpan {
    pub category: String,
    pub start:    usize,
    pub end:      usize,
}

impl AnnotationSpan {
    pub fn new(category: impl Into<String>, start: usize, end: usize) -> Self {
        Self { category: category.into(), start, end }
    }
}

/// An annotation span after category normalization;
/// one line of the `.ann` file the training featurizer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledSpan {
    pub class: EntityClass,
    pub start: usize,
    pub end:   usize,
}

impl fmt::Display for LabeledSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.class, self.start, self.end)
    }
}

// ─── AnswerRecord ─────────────────────────────────────────────────────────────
/// A reconstructed, verified entity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub class:   EntityClass,
    pub offset:  usize,
    pub length:  usize,
    pub surface: String,
}

impl AnswerRecord {
    pub fn new(class: EntityClass, offset: usize, length: usize, surface: impl Into<String>) -> Self {
        Self { class, offset, length, surface: surface.into() }
    }
}

impl fmt::Display for AnswerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t# {}", self.class, self.offset, self.length, self.surface)
    }
}
