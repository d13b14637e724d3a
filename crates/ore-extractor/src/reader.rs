//! Sentence block input
//!
//! Input is a sequence of blocks separated by blank lines. Each block holds
//! three lines: tokens, POS tags and chunk tags, space-joined.

use std::io::BufRead;

use ore_core::{AnnotatedSentence, SentenceRef};

/// Lazily yields `(block index, sentence)`. Block indices count every
/// block, including skipped ones, so they stay aligned with the input.
/// Malformed blocks are logged and skipped; an I/O error ends the stream.
pub struct SentenceReader<R> {
    lines: std::io::Lines<R>,
    line: usize,
    block: usize,
    done: bool,
}

impl<R: BufRead> SentenceReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            lines: input.lines(),
            line: 0,
            block: 0,
            done: false,
        }
    }

    /// Next non-empty block with the line number it starts on
    fn next_block(&mut self) -> Option<(usize, Vec<String>)> {
        let mut block = Vec::new();
        let mut first_line = 0;
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.line += 1;
                    if line.trim().is_empty() {
                        if !block.is_empty() {
                            return Some((first_line, block));
                        }
                    } else {
                        if block.is_empty() {
                            first_line = self.line;
                        }
                        block.push(line);
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(line = self.line + 1, error = %e, "read failed, stopping");
                    self.done = true;
                    return None;
                }
                None => {
                    self.done = true;
                    return (!block.is_empty()).then_some((first_line, block));
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for SentenceReader<R> {
    type Item = (usize, SentenceRef);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let (line, block) = self.next_block()?;
            let index = self.block;
            self.block += 1;

            if block.len() != 3 {
                tracing::warn!(line, block = index, lines = block.len(), "expected 3 lines, skipping block");
                continue;
            }
            match AnnotatedSentence::from_lines(&block[0], &block[1], &block[2]) {
                Ok(sentence) => return Some((index, sentence.into_shared())),
                Err(e) => {
                    tracing::warn!(line, block = index, error = %e, "malformed sentence, skipping block");
                }
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Vec<(usize, String)> {
        SentenceReader::new(text.as_bytes())
            .map(|(i, s)| (i, s.text()))
            .collect()
    }

    #[test]
    fn test_reads_blocks() {
        let input = "\
Mike is here
NNP VBZ RB
B-NP O O

Bob left
NNP VBD
B-NP O
";
        assert_eq!(
            read(input),
            vec![(0, "Mike is here".to_string()), (1, "Bob left".to_string())]
        );
    }

    #[test]
    fn test_extra_blank_lines() {
        let input = "\n\nBob left\nNNP VBD\nB-NP O\n\n\n\nAl ran\nNNP VBD\nB-NP O";
        assert_eq!(
            read(input),
            vec![(0, "Bob left".to_string()), (1, "Al ran".to_string())]
        );
    }

    #[test]
    fn test_malformed_blocks_skipped() {
        let input = "\
Bob left
NNP
B-NP O

Two lines
NNP NNP

Al ran
NNP VBD
B-NP O

Sue ran
NNP VBD
X-NP O
";
        assert_eq!(read(input), vec![(2, "Al ran".to_string())]);
    }
}
