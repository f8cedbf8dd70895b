// Test double for the external tools.
//
// A tiny stand-in for the analyzer / featurizer / tagger trio,
// good enough to drive the workflows end to end:
//
//   Analyze            copies the transcoded text
//   ExtractTokens      alphanumeric runs and single punctuation
//                      marks, as OFFSET<TAB>LENGTH<TAB>SURFACE
//   Featurize          SURFACE<TAB>lowercase
//   FeaturizeTraining  SURFACE<TAB>lowercase<TAB>LABEL (from .ann)
//   Tag                appends Person to capitalised tokens, NO
//                      to the rest, then a blank line
//
// All files are windows-1251, like the real tools.

use std::cell::RefCell;
use std::fs;

use encoding_rs::WINDOWS_1251;

use crate::domain::error::PipelineError;
use crate::domain::traits::{ToolInvocation, ToolStep, Toolchain};

#[derive(Default)]
pub struct FakeToolchain {
    /// Fail this step for this document
    pub fail:         Option<(ToolStep, String)>,
    /// Append this many junk lines to the tagger output of a document
    pub extra_tagged: Option<(String, usize)>,
    /// Every call made, in order
    pub calls:        RefCell<Vec<(ToolStep, String)>>,
}

impl FakeToolchain {
    pub fn calls_for(&self, step: ToolStep) -> usize {
        self.calls.borrow().iter().filter(|(s, _)| *s == step).count()
    }
}

/// (char offset, surface) of each token
pub fn tokenize(text: &str) -> Vec<(usize, String)> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (i, c) in text.chars().enumerate() {
        if c.is_alphanumeric() {
            current.get_or_insert_with(|| (i, String::new())).1.push(c);
            continue;
        }
        if let Some(token) = current.take() {
            tokens.push(token);
        }
        if !c.is_whitespace() {
            tokens.push((i, c.to_string()));
        }
    }
    tokens.extend(current);
    tokens
}

fn read(path: &std::path::Path) -> String {
    let bytes = fs::read(path).unwrap_or_default();
    WINDOWS_1251.decode_without_bom_handling(&bytes).0.into_owned()
}

fn label_for(offset: usize, annotations: &str) -> &'static str {
    for line in annotations.lines() {
        let mut fields = line.split('\t');
        let (Some(class), Some(start), Some(end)) = (fields.next(), fields.next(), fields.next()) else {
            continue;
        };
        let (Ok(start), Ok(end)) = (start.parse::<usize>(), end.parse::<usize>()) else {
            continue;
        };
        if (start..end).contains(&offset) {
            return match class {
                "PER" => "Person",
                "LOC" => "Loc",
                _ => "Org",
            };
        }
    }
    "NO"
}

impl Toolchain for FakeToolchain {
    fn run(&self, step: ToolStep, inv: ToolInvocation<'_>) -> Result<(), PipelineError> {
        self.calls.borrow_mut().push((step, inv.document.to_string()));

        if let Some((fail_step, document)) = &self.fail {
            if *fail_step == step && document == inv.document {
                return Err(PipelineError::ExternalTool {
                    document: inv.document.to_string(),
                    stage:    step.stage(),
                    program:  "fake".into(),
                    reason:   "exit status: 1".into(),
                });
            }
        }

        let input = read(inv.input);
        let output = match step {
            ToolStep::Analyze => input,
            ToolStep::ExtractTokens => tokenize(&input)
                .into_iter()
                .map(|(offset, surface)| format!("{offset}\t{}\t{surface}\n", surface.chars().count()))
                .collect(),
            ToolStep::Featurize => tokenize(&input)
                .into_iter()
                .map(|(_, surface)| format!("{surface}\t{}\n", surface.to_lowercase()))
                .collect(),
            ToolStep::FeaturizeTraining => {
                let annotations = inv.annotations.map(read).unwrap_or_default();
                tokenize(&input)
                    .into_iter()
                    .map(|(offset, surface)| {
                        format!("{surface}\t{}\t{}\n", surface.to_lowercase(), label_for(offset, &annotations))
                    })
                    .collect()
            }
            ToolStep::Tag => {
                let mut out: String = input
                    .lines()
                    .filter(|l| !l.is_empty())
                    .map(|line| {
                        let upper = line.chars().next().is_some_and(char::is_uppercase);
                        format!("{line}\t{}\n", if upper { "Person" } else { "NO" })
                    })
                    .collect();
                if let Some((document, extra)) = &self.extra_tagged {
                    if document == inv.document {
                        for _ in 0..*extra {
                            out.push_str("junk\tjunk\tNO\n");
                        }
                    }
                }
                out.push('\n');
                out
            }
        };

        let (bytes, _, _) = WINDOWS_1251.encode(&output);
        fs::write(inv.output, bytes).map_err(|e| PipelineError::io(inv.document, step.stage(), inv.output, e))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
mod tests {
    use super::*;

    #[test]
    fn test_fake_tokenizer() {
        let tokens = tokenize("John lives in Paris.");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3], (14, "Paris".to_string()));
        assert_eq!(tokens[4], (19, ".".to_string()));
    }

    #[test]
    fn test_label_for_skips_blank_and_short_lines() {
        let annotations = "\nPER\n\nLOC\t14\nPER\t0\t4\n";
        assert_eq!(label_for(0, annotations), "Person");
        assert_eq!(label_for(14, annotations), "NO");
    }
}
