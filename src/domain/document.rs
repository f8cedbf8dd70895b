// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A single document: the name it was loaded under and its text.
//
// Offsets produced by the external tools are CHARACTER offsets
// into the legacy-encoded text. Since the legacy encoding is a
// single-byte code page, one byte there is one char here, so all
// slicing goes through `char_slice` rather than byte ranges.

use std::path::{Path, PathBuf};

/// A document loaded from disk.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name the text came from, used in every fault message
    pub source: String,

    /// Full text content
    pub text: String,
}

impl Document {
    /// Create a new Document with a source name and text content.
    ///
    /// Example:
    ///   let doc = Document::new("news-01.txt", "John lives in Paris.");
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }

    /// Slice `length` characters starting at character `offset`.
    /// Returns None when the range runs past the end of the text.
    pub fn char_slice(&self, offset: usize, length: usize) -> Option<&str> {
        char_slice(&self.text, offset, length)
    }

    /// Number of characters in the text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Character-indexed slice of `text`.
pub fn char_slice(text: &str, offset: usize, length: usize) -> Option<&str> {
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let start = indices.nth(offset)?;
    if length == 0 {
        return Some(&text[start..start]);
    }
    let end = indices.nth(length - 1)?;
    Some(&text[start..end])
}

// ─── SourceFile ──────────────────────────────────────────────────────────────
/// A raw input file discovered by a DocumentSource, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path to the `.txt` file
    pub path: PathBuf,

    /// File name, e.g. `news-01.txt`
    pub name: String,

    /// File name without extension, e.g. `news-01`;
    /// every derived artifact is named `<stem>.<ext>`
    pub stem: String,
}

impl SourceFile {
    /// Build a SourceFile from a path. Returns None for paths
    /// without a UTF-8 file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        let stem = path.file_stem()?.to_str()?.to_string();
        Some(Self { path: path.to_path_buf(), name, stem })
    }

    /// Path of a sibling file with the same stem, e.g. the gold
    /// `.spans` file next to a training `.txt`.
    pub fn sibling(&self, extension: &str) -> PathBuf {
        self.path.with_extension(extension)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_slice_ascii() {
        let doc = Document::new("a.txt", "John lives in Paris.");
        assert_eq!(doc.char_slice(0, 4), Some("John"));
        assert_eq!(doc.char_slice(14, 5), Some("Paris"));
    }

    #[test]
    fn test_char_slice_counts_chars_not_bytes() {
        // Cyrillic letters are two bytes in UTF-8 but one char
        let doc = Document::new("ru.txt", "Иван живёт в Москве");
        assert_eq!(doc.char_slice(0, 4), Some("Иван"));
        assert_eq!(doc.char_slice(13, 6), Some("Москве"));
    }

    #[test]
    fn test_char_slice_out_of_range() {
        let doc = Document::new("a.txt", "short");
        assert_eq!(doc.char_slice(3, 2), Some("rt"));
        assert_eq!(doc.char_slice(3, 3), None);
        assert_eq!(doc.char_slice(9, 1), None);
    }

    #[test]
    fn test_char_slice_at_end_is_empty() {
        let doc = Document::new("a.txt", "abc");
        assert_eq!(doc.char_slice(3, 0), Some(""));
        assert_eq!(doc.char_len(), 3);
    }

    #[test]
    fn test_source_file_stem_and_sibling() {
        let file = SourceFile::from_path(Path::new("/data/train/doc-7.txt")).unwrap();
        assert_eq!(file.name, "doc-7.txt");
        assert_eq!(file.stem, "doc-7");
        assert_eq!(file.sibling("spans"), PathBuf::from("/data/train/doc-7.spans"));
    }
}
