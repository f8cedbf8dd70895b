// ============================================================
// Layer 4 — Training Corpus Assembler
// ============================================================
// Concatenates every training document's labelled sign records
// into one corpus, framing each document with sentinel records:
//
//   begin-of-file ...  NO   ┐ context_window copies
//   begin-of-file ...  NO   ┘
//   <document's sign records, verbatim>
//   end-of-file   ...  NO   ┐ context_window copies
//   end-of-file   ...  NO   ┘
//
// The tagger looks `context_window` tokens to either side, so
// with that many sentinels a real token at a document edge sees
// only sentinels beyond the edge, never a half-sentinel,
// half-neighbour-document context.
//
// No shuffling and no train/validation split here; the external
// trainer owns that.

use std::io::Write;

use encoding_rs::Encoding;

use crate::domain::error::{PipelineError, Stage};
use crate::domain::token::SignRecord;

pub const DEFAULT_CONTEXT_WINDOW: usize = 2;

pub const DEFAULT_BEGIN_SENTINEL: &str =
    "begin-of-file\tbegin-of-file\tNO\tNO\tL1\tbegin-of-file\tNO\tNO\tNO\tNO\tNO\tNO\tNO\tYES\tNO\tR0\tNO\tNO";

pub const DEFAULT_END_SENTINEL: &str =
    "end-of-file\tend-of-file\tNO\tNO\tL1\tend-of-file\tNO\tNO\tNO\tNO\tNO\tNO\tNO\tYES\tNO\tR0\tNO\tNO";

/// One document's framed lines, ready to append to the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedBlock {
    pub document: String,
    pub lines:    Vec<String>,
}

impl FramedBlock {
    /// Number of corpus lines, sentinels included
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Frames each document's labelled sign records between sentinel
/// rows so tagger context windows never cross document boundaries.
#[derive(Debug, Clone)]
pub struct CorpusAssembler {
    context_window: usize,
    begin:          SignRecord,
    end:            SignRecord,
}

impl CorpusAssembler {
    /// Build an assembler. Both sentinels must be non-empty and
    /// have the same column count, which is then the column
    /// count every document record must have.
    pub fn new(context_window: usize, begin: &str, end: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(context_window > 0, "context window must be at least 1");
        let begin = SignRecord::parse(begin)
            .ok_or_else(|| anyhow::anyhow!("begin-of-document sentinel is empty"))?;
        let end = SignRecord::parse(end)
            .ok_or_else(|| anyhow::anyhow!("end-of-document sentinel is empty"))?;
        anyhow::ensure!(
            begin.field_count() == end.field_count(),
            "sentinels have {} and {} columns",
            begin.field_count(),
            end.field_count()
        );
        Ok(Self { context_window, begin, end })
    }

    /// Columns per record, taken from the sentinels
    pub fn columns(&self) -> usize {
        self.begin.field_count()
    }

    /// Frame one document. A record with the wrong column count
    /// fails the document; nothing of it reaches the corpus.
    pub fn frame(&self, document: &str, records: &[SignRecord]) -> Result<FramedBlock, PipelineError> {
        let columns = self.columns();
        if let Some((index, bad)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.field_count() != columns)
        {
            return Err(PipelineError::MalformedArtifact {
                document: document.to_string(),
                stage:    Stage::Assemble,
                artifact: "labelled sign records",
                line:     index + 1,
                reason:   format!("{} columns, expected {}", bad.field_count(), columns),
            });
        }

        let mut lines = Vec::with_capacity(records.len() + 2 * self.context_window);
        lines.extend(std::iter::repeat(self.begin.as_line().to_string()).take(self.context_window));
        lines.extend(records.iter().map(|r| r.as_line().to_string()));
        lines.extend(std::iter::repeat(self.end.as_line().to_string()).take(self.context_window));

        Ok(FramedBlock { document: document.to_string(), lines })
    }
}

/// Appends framed blocks to a corpus stream, encoding each
/// block the same way the sign files were encoded.
pub struct CorpusWriter<W: Write> {
    out:       W,
    encoding:  &'static Encoding,
    documents: usize,
    lines:     usize,
}

impl<W: Write> CorpusWriter<W> {
    pub fn new(out: W, encoding: &'static Encoding) -> Self {
        Self { out, encoding, documents: 0, lines: 0 }
    }

    /// Encode and write one block, counting its documents and lines.
    pub fn append(&mut self, block: &FramedBlock) -> std::io::Result<()> {
        let mut text = String::new();
        for line in &block.lines {
            text.push_str(line);
            text.push('\n');
        }
        let (bytes, _, _) = self.encoding.encode(&text);
        self.out.write_all(&bytes)?;
        self.documents += 1;
        self.lines += block.len();
        Ok(())
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn default_assembler() -> CorpusAssembler {
        CorpusAssembler::new(DEFAULT_CONTEXT_WINDOW, DEFAULT_BEGIN_SENTINEL, DEFAULT_END_SENTINEL).unwrap()
    }

    /// n records with the default 18-column schema
    fn records(n: usize) -> Vec<SignRecord> {
        (0..n)
            .map(|i| {
                let mut fields = vec![format!("w{i}")];
                fields.extend((1..17).map(|c| format!("f{c}")));
                fields.push("NO".to_string());
                SignRecord::from_fields(fields).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_default_sentinels_have_eighteen_columns() {
        assert_eq!(default_assembler().columns(), 18);
    }

    #[test]
    fn test_block_has_n_plus_four_lines() {
        let asm = default_assembler();
        for n in [0, 1, 7] {
            let block = asm.frame("doc.txt", &records(n)).unwrap();
            assert_eq!(block.len(), n + 4);
        }
    }

    #[test]
    fn test_sentinels_frame_records_in_order() {
        let asm = default_assembler();
        let recs = records(3);
        let block = asm.frame("doc.txt", &recs).unwrap();

        assert_eq!(block.lines[0], DEFAULT_BEGIN_SENTINEL);
        assert_eq!(block.lines[1], DEFAULT_BEGIN_SENTINEL);
        assert_eq!(block.lines[2], recs[0].as_line());
        assert_eq!(block.lines[4], recs[2].as_line());
        assert_eq!(block.lines[5], DEFAULT_END_SENTINEL);
        assert_eq!(block.lines[6], DEFAULT_END_SENTINEL);
    }

    #[test]
    fn test_context_window_controls_sentinel_count() {
        let asm = CorpusAssembler::new(3, DEFAULT_BEGIN_SENTINEL, DEFAULT_END_SENTINEL).unwrap();
        let block = asm.frame("doc.txt", &records(2)).unwrap();
        assert_eq!(block.len(), 2 + 6);
        assert_eq!(block.lines[2], DEFAULT_BEGIN_SENTINEL);
        assert_eq!(block.lines[5], DEFAULT_END_SENTINEL);
    }

    #[test]
    fn test_wrong_column_count_rejects_document() {
        let asm = default_assembler();
        let mut recs = records(2);
        recs.push(SignRecord::from_fields(["short", "NO"]).unwrap());
        assert!(matches!(
            asm.frame("doc.txt", &recs),
            Err(PipelineError::MalformedArtifact { line: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_assembler_config() {
        assert!(CorpusAssembler::new(0, DEFAULT_BEGIN_SENTINEL, DEFAULT_END_SENTINEL).is_err());
        assert!(CorpusAssembler::new(2, "", DEFAULT_END_SENTINEL).is_err());
        assert!(CorpusAssembler::new(2, "a\tb\tNO", DEFAULT_END_SENTINEL).is_err());
    }

    #[test]
    fn test_writer_concatenates_blocks() {
        let asm = default_assembler();
        let mut writer = CorpusWriter::new(Vec::new(), encoding_rs::UTF_8);
        writer.append(&asm.frame("a.txt", &records(2)).unwrap()).unwrap();
        writer.append(&asm.frame("b.txt", &records(1)).unwrap()).unwrap();
        assert_eq!(writer.documents(), 2);
        assert_eq!(writer.lines(), 6 + 5);

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        // Document b's block starts right after a's end sentinels
        assert_eq!(lines[5], DEFAULT_END_SENTINEL);
        assert_eq!(lines[6], DEFAULT_BEGIN_SENTINEL);
    }

    #[test]
    fn test_writer_encodes_to_legacy_code_page() {
        let asm = CorpusAssembler::new(1, "<s>\tNO", "</s>\tNO").unwrap();
        let recs = vec![SignRecord::from_fields(["Москва", "Loc"]).unwrap()];
        let mut writer = CorpusWriter::new(Vec::new(), encoding_rs::WINDOWS_1251);
        writer.append(&asm.frame("ru.txt", &recs).unwrap()).unwrap();
        let bytes = writer.finish().unwrap();

        // One byte per Cyrillic letter
        assert_eq!(bytes, b"<s>\tNO\n\xcc\xee\xf1\xea\xe2\xe0\tLoc\n</s>\tNO\n".to_vec());
    }
}
