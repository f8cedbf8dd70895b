// ============================================================
// Layer 6 — Transcoder
// ============================================================
// The external analyzer only understands a legacy single-byte
// code page (windows-1251 by default), so every document is
// re-encoded before any tool sees it, and every tool artifact
// is decoded back to Unicode before parsing.
//
// Characters the code page cannot represent become '?', the
// same placeholder the tools then see. Offsets stay intact
// because one character is replaced by exactly one byte.
//
// Decoding the transcoded file (rather than reusing the UTF-8
// original) gives the text the aligner must verify against:
// it contains the same '?' placeholders as the tool output.

use std::fs;
use std::path::Path;

use anyhow::Result;
use encoding_rs::{EncoderResult, Encoding};

use crate::domain::document::Document;
use crate::domain::error::{PipelineError, Stage};

/// Replacement for unencodable characters
pub const PLACEHOLDER: u8 = b'?';

/// Transcoded bytes plus how many characters were replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes:    Vec<u8>,
    pub replaced: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Transcoder {
    encoding: &'static Encoding,
    strict:   bool,
}

impl Transcoder {
    /// Look up an encoding by WHATWG label (e.g. `windows-1251`, `cp1251`).
    pub fn for_label(label: &str, strict: bool) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| anyhow::anyhow!("Unknown encoding label '{label}'"))?;
        anyhow::ensure!(
            encoding.output_encoding() == encoding,
            "Encoding '{}' cannot be used as an output encoding",
            encoding.name()
        );
        Ok(Self { encoding, strict })
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Encode a document's text, replacing unmappable characters
    /// with '?', or failing on the first one in strict mode.
    pub fn encode(&self, document: &Document) -> Result<Encoded, PipelineError> {
        let mut encoder  = self.encoding.new_encoder();
        let mut bytes    = Vec::with_capacity(document.text.len());
        let mut chunk    = [0u8; 1024];
        let mut src      = document.text.as_str();
        let mut replaced = 0usize;

        loop {
            let (result, read, written) = encoder.encode_from_utf8_without_replacement(src, &mut chunk, true);
            bytes.extend_from_slice(&chunk[..written]);
            src = &src[read..];

            match result {
                EncoderResult::InputEmpty => break,
                EncoderResult::OutputFull => continue,
                EncoderResult::Unmappable(c) => {
                    if self.strict {
                        return Err(PipelineError::Transcoding {
                            document: document.source.clone(),
                            encoding: self.name().to_string(),
                            reason:   format!("character {c:?} (U+{:04X}) has no mapping", c as u32),
                        });
                    }
                    bytes.push(PLACEHOLDER);
                    replaced += 1;
                }
            }
        }

        Ok(Encoded { bytes, replaced })
    }

    /// Encode text that is known to be representable (sentinels,
    /// decoded artifacts, answers built from decoded text).
    pub fn encode_text(&self, text: &str) -> Vec<u8> {
        let (bytes, _, _) = self.encoding.encode(text);
        bytes.into_owned()
    }

    /// Decode legacy bytes. Single-byte code pages map every byte,
    /// so this does not fail.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _) = self.encoding.decode_without_bom_handling(bytes);
        text.into_owned()
    }

    /// Write the transcoded form of `document` to `path`.
    pub fn write_document(&self, document: &Document, path: &Path) -> Result<Encoded, PipelineError> {
        let encoded = self.encode(document)?;
        if encoded.replaced > 0 {
            tracing::warn!(
                "{}: {} characters not representable in {}, replaced with '?'",
                document.source,
                encoded.replaced,
                self.name()
            );
        }
        fs::write(path, &encoded.bytes)
            .map_err(|e| PipelineError::io(&document.source, Stage::Transcode, path, e))?;
        Ok(encoded)
    }

    /// Read and decode a legacy-encoded artifact.
    pub fn read_text(&self, document: &str, stage: Stage, path: &Path) -> Result<String, PipelineError> {
        let bytes = fs::read(path).map_err(|e| PipelineError::io(document, stage, path, e))?;
        Ok(self.decode(&bytes))
    }

    /// Encode and write text as a legacy-encoded artifact.
    pub fn write_text(&self, document: &str, stage: Stage, path: &Path, text: &str) -> Result<(), PipelineError> {
        fs::write(path, self.encode_text(text)).map_err(|e| PipelineError::io(document, stage, path, e))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn cp1251() -> Transcoder {
        Transcoder::for_label("windows-1251", false).unwrap()
    }

    #[test]
    fn test_labels_resolve() {
        assert_eq!(Transcoder::for_label("cp1251", false).unwrap().name(), "windows-1251");
        assert!(Transcoder::for_label("no-such-encoding", false).is_err());
        // UTF-16 encodes as UTF-8 in encoding_rs, so it is refused
        assert!(Transcoder::for_label("utf-16le", false).is_err());
    }

    #[test]
    fn test_cyrillic_is_one_byte_per_char() {
        let doc = Document::new("ru.txt", "Иван");
        let encoded = cp1251().encode(&doc).unwrap();
        assert_eq!(encoded.bytes, vec![0xc8, 0xe2, 0xe0, 0xed]);
        assert_eq!(encoded.replaced, 0);
    }

    #[test]
    fn test_unmappable_chars_become_placeholder() {
        let doc = Document::new("mixed.txt", "a中b😀c");
        let encoded = cp1251().encode(&doc).unwrap();
        assert_eq!(encoded.bytes, b"a?b?c".to_vec());
        assert_eq!(encoded.replaced, 2);
        // Character count, and so every offset, is preserved
        assert_eq!(cp1251().decode(&encoded.bytes).chars().count(), doc.char_len());
    }

    #[test]
    fn test_strict_mode_rejects_unmappable_chars() {
        let strict = Transcoder::for_label("windows-1251", true).unwrap();
        let doc = Document::new("mixed.txt", "a中b");
        assert!(matches!(strict.encode(&doc), Err(PipelineError::Transcoding { .. })));
    }

    #[test]
    fn test_long_text_spans_several_chunks() {
        let text = "Москва ".repeat(1000);
        let doc = Document::new("long.txt", text.clone());
        let encoded = cp1251().encode(&doc).unwrap();
        assert_eq!(encoded.bytes.len(), text.chars().count());
        assert_eq!(cp1251().decode(&encoded.bytes), text);
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.cp1251");
        let t = cp1251();
        t.write_document(&Document::new("doc.txt", "Пётр 中"), &path).unwrap();
        assert_eq!(t.read_text("doc.txt", Stage::Transcode, &path).unwrap(), "Пётр ?");
    }
}
