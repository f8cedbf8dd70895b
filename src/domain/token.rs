// ============================================================
// Layer 3 — Token Descriptors and Sign Records
// ============================================================
// Two independently produced views of the same token stream:
//
//   TokenDescriptor — where a token sits in the text
//                     (offset, length, surface)
//   SignRecord      — one line of features for the tagger;
//                     first field is the surface, last field
//                     is the label once the tagger has run
//
// The aligner pairs them index-for-index.

use std::fmt;

/// Ground-truth token boundary from the token extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
    /// Character offset of the first character
    pub offset: usize,

    /// Length in characters, always > 0
    pub length: usize,

    /// Token text as the extractor saw it
    pub surface: String,
}

impl TokenDescriptor {
    pub fn new(offset: usize, length: usize, surface: impl Into<String>) -> Self {
        Self { offset, length, surface: surface.into() }
    }
}

/// One feature line. The raw line is kept so the corpus
/// assembler can copy it through byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRecord {
    line: String,
}

impl SignRecord {
    /// Wrap a line. Returns None for lines with no fields.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.split_whitespace().next().is_none() {
            return None;
        }
        Some(Self { line: line.to_string() })
    }

    /// Build a record from individual fields, tab-joined
    #[cfg(test)]
    pub fn from_fields<I, S>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fields
            .into_iter()
            .map(|f| f.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\t");
        Self::parse(&joined)
    }

    /// Whitespace-separated fields
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.line.split_whitespace()
    }

    pub fn field_count(&self) -> usize {
        self.fields().count()
    }

    /// First field: the token surface
    pub fn surface(&self) -> &str {
        self.fields().next().unwrap_or_default()
    }

    /// Last field: the label column
    pub fn label(&self) -> &str {
        self.fields().last().unwrap_or_default()
    }

    /// The line exactly as read
    pub fn as_line(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for SignRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}
