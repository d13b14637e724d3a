//! Labeled extraction interchange
//!
//! One record is ten lines: sentence tokens, POS tags and chunk tags
//! (space-joined), then for arg1, relation and arg2 the span text followed
//! by its `start length`, and finally a label `0` or `1`. Records follow
//! each other without separators.
//!
//! Only canonical records are accepted (single spaces, no padding, decimal
//! numbers without leading zeros, every line ended by a bare `\n`), so
//! writing what was read reproduces the input byte for byte.

use std::io::{BufRead, Write};

use ore_core::{AnnotatedSentence, Interval, OreError, Result, SentenceRef};

use crate::extraction::{ArgumentExtraction, BinaryExtraction, ChunkedExtraction, Field};

/// Lines per record
pub const RECORD_LINES: usize = 10;

/// Property carrying the label on extractions built from records
pub const LABEL_PROPERTY: &str = "label";

/// A labeled binary extraction as stored on disk
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    sentence: SentenceRef,
    arg1: FieldRecord,
    relation: FieldRecord,
    arg2: FieldRecord,
    label: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldRecord {
    text: String,
    interval: Interval,
}

impl LabeledRecord {
    pub fn new(
        sentence: SentenceRef,
        arg1: Interval,
        relation: Interval,
        arg2: Interval,
        label: bool,
    ) -> Result<Self> {
        let field = |interval: Interval| -> Result<FieldRecord> {
            if !interval.fits_within(sentence.len()) {
                return Err(OreError::Bounds(format!(
                    "{interval} exceeds sentence of length {}",
                    sentence.len()
                )));
            }
            Ok(FieldRecord {
                text: sentence.text_of(interval),
                interval,
            })
        };
        Ok(Self {
            arg1: field(arg1)?,
            relation: field(relation)?,
            arg2: field(arg2)?,
            sentence,
            label,
        })
    }

    /// Record for an extraction produced by the pipeline
    pub fn from_extraction(extraction: &BinaryExtraction, label: bool) -> Result<Self> {
        Self::new(
            extraction.sentence_ref().clone(),
            extraction.arg1().interval(),
            extraction.relation().interval(),
            extraction.arg2().interval(),
            label,
        )
    }

    /// Parse one record; `first_line` is the 1-based line number of `lines[0]`
    pub fn parse<S: AsRef<str>>(lines: &[S], first_line: usize) -> Result<Self> {
        if lines.len() != RECORD_LINES {
            return Err(malformed(
                first_line,
                format!("expected {RECORD_LINES} lines, found {}", lines.len()),
            ));
        }
        let line = |i: usize| lines[i].as_ref();

        let sentence = AnnotatedSentence::from_lines(line(0), line(1), line(2))
            .map_err(|e| malformed(first_line, e.to_string()))?;
        for (i, layer) in [sentence.tokens(), sentence.pos_tags(), sentence.chunk_tags()]
            .into_iter()
            .enumerate()
        {
            if layer.join(" ") != line(i) {
                return Err(malformed(first_line + i, "non-canonical spacing"));
            }
        }
        let sentence = sentence.into_shared();

        let mut fields = Vec::with_capacity(3);
        for (k, offset) in [3usize, 5, 7].into_iter().enumerate() {
            let interval = parse_interval(line(offset + 1), first_line + offset + 1)?;
            if !interval.fits_within(sentence.len()) {
                return Err(malformed(
                    first_line + offset + 1,
                    format!(
                        "{} span {interval} exceeds sentence of length {}",
                        Field::ALL[k].as_str(),
                        sentence.len()
                    ),
                ));
            }
            fields.push(FieldRecord {
                text: line(offset).to_string(),
                interval,
            });
        }

        let label = match line(9) {
            "1" => true,
            "0" => false,
            other => {
                return Err(malformed(
                    first_line + 9,
                    format!("label must be 0 or 1, found `{other}`"),
                ))
            }
        };

        let mut fields = fields.into_iter();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(arg1), Some(relation), Some(arg2)) => Ok(Self {
                sentence,
                arg1,
                relation,
                arg2,
                label,
            }),
            _ => Err(malformed(first_line, "missing field")),
        }
    }

    pub fn sentence(&self) -> &SentenceRef {
        &self.sentence
    }

    pub fn interval(&self, field: Field) -> Interval {
        self.field(field).interval
    }

    /// Span text as written in the record
    pub fn text(&self, field: Field) -> &str {
        &self.field(field).text
    }

    pub fn label(&self) -> bool {
        self.label
    }

    fn field(&self, field: Field) -> &FieldRecord {
        match field {
            Field::Arg1 => &self.arg1,
            Field::Relation => &self.relation,
            Field::Arg2 => &self.arg2,
        }
    }

    /// The record as a binary extraction over its own sentence, with the
    /// label stored in the property bag
    pub fn to_extraction(&self) -> Result<BinaryExtraction> {
        let chunk = |field| ChunkedExtraction::new(self.sentence.clone(), self.interval(field));
        let relation = chunk(Field::Relation)?;
        let mut extraction = BinaryExtraction::new(
            ArgumentExtraction::new(chunk(Field::Arg1)?, relation.clone())?,
            relation.clone(),
            ArgumentExtraction::new(chunk(Field::Arg2)?, relation)?,
        )?;
        extraction.set_property(LABEL_PROPERTY, if self.label { "1" } else { "0" });
        Ok(extraction)
    }

    /// Write the ten lines of this record
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", self.sentence.tokens().join(" "))?;
        writeln!(out, "{}", self.sentence.pos_tags().join(" "))?;
        writeln!(out, "{}", self.sentence.chunk_tags().join(" "))?;
        for field in Field::ALL {
            let f = self.field(field);
            writeln!(out, "{}", f.text)?;
            writeln!(out, "{} {}", f.interval.start(), f.interval.len())?;
        }
        writeln!(out, "{}", if self.label { 1 } else { 0 })
    }
}

fn malformed(line: usize, message: impl Into<String>) -> OreError {
    OreError::MalformedRecord {
        line,
        message: message.into(),
    }
}

/// Strict `start length`: two canonical decimal numbers and one space
fn parse_interval(text: &str, line: usize) -> Result<Interval> {
    let (start, length) = text
        .split_once(' ')
        .ok_or_else(|| malformed(line, format!("expected `start length`, found `{text}`")))?;
    let number = |s: &str| -> Result<usize> {
        let canonical = !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && (s == "0" || !s.starts_with('0'));
        if !canonical {
            return Err(malformed(line, format!("invalid number `{s}`")));
        }
        s.parse()
            .map_err(|_| malformed(line, format!("invalid number `{s}`")))
    };
    let (start, length) = (number(start)?, number(length)?);
    if start.checked_add(length).is_none() {
        return Err(malformed(line, format!("span `{text}` overflows")));
    }
    Ok(Interval::new(start, length))
}

// ============================================================================
// Reader / writer
// ============================================================================

/// Lazily reads records. A malformed or truncated record, or an I/O error,
/// is logged and ends the stream.
pub struct LabeledReader<R> {
    input: R,
    line: usize,
    done: bool,
}

impl<R: BufRead> LabeledReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: 0,
            done: false,
        }
    }

    /// Next line without its `\n`; a missing `\n` or a `\r\n` ending is
    /// malformed
    fn next_line(&mut self) -> Option<Result<String>> {
        let mut buf = String::new();
        match self.input.read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line += 1;
                if buf.pop() != Some('\n') {
                    return Some(Err(malformed(self.line, "missing line terminator")));
                }
                if buf.ends_with('\r') {
                    return Some(Err(malformed(self.line, "carriage return in line ending")));
                }
                Some(Ok(buf))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

impl<R: BufRead> Iterator for LabeledReader<R> {
    type Item = LabeledRecord;

    fn next(&mut self) -> Option<LabeledRecord> {
        if self.done {
            return None;
        }
        let first_line = self.line + 1;
        let mut lines = Vec::with_capacity(RECORD_LINES);
        while lines.len() < RECORD_LINES {
            match self.next_line() {
                Some(Ok(line)) => lines.push(line),
                Some(Err(e)) => {
                    tracing::warn!(line = self.line, error = %e, "unreadable labeled record, stopping");
                    self.done = true;
                    return None;
                }
                None => break,
            }
        }
        if lines.is_empty() {
            self.done = true;
            return None;
        }
        match LabeledRecord::parse(&lines, first_line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(line = first_line, error = %e, "malformed labeled record, stopping");
                self.done = true;
                None
            }
        }
    }
}

/// Writes records in the interchange layout
pub struct LabeledWriter<W> {
    output: W,
    written: usize,
}

impl<W: Write> LabeledWriter<W> {
    pub fn new(output: W) -> Self {
        Self { output, written: 0 }
    }

    pub fn write(&mut self, record: &LabeledRecord) -> Result<()> {
        record.write_to(&mut self.output)?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.output.flush()?;
        Ok(self.output)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS: &str = "\
Mike is the mayor of Seattle .
NNP VBZ DT NN IN NNP .
B-NP O B-NP I-NP O B-NP O
Mike
0 1
is the mayor of
1 4
Seattle
5 1
1
Bob left
NNP VBD
B-NP O
Bob
0 1
left
1 1

2 0
0
";

    fn read(text: &str) -> Vec<LabeledRecord> {
        LabeledReader::new(text.as_bytes()).collect()
    }

    #[test]
    fn test_read_records() {
        let records = read(RECORDS);
        assert_eq!(records.len(), 2);

        let mike = &records[0];
        assert!(mike.label());
        assert_eq!(mike.interval(Field::Relation), Interval::new(1, 4));
        assert_eq!(mike.text(Field::Arg2), "Seattle");

        let bob = &records[1];
        assert!(!bob.label());
        assert_eq!(bob.interval(Field::Arg2), Interval::new(2, 0));
        assert_eq!(bob.text(Field::Arg2), "");
    }

    #[test]
    fn test_write_reproduces_input() {
        let mut writer = LabeledWriter::new(Vec::new());
        for record in read(RECORDS) {
            writer.write(&record).unwrap();
        }
        assert_eq!(writer.written(), 2);
        let bytes = writer.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), RECORDS);
    }

    #[test]
    fn test_malformed_record_ends_stream() {
        let broken = RECORDS.replacen("0 1\n", "0 x\n", 1);
        assert!(read(&broken).is_empty());

        let bad_label = RECORDS.replacen("\n1\nBob", "\nyes\nBob", 1);
        assert!(read(&bad_label).is_empty());

        let non_canonical = RECORDS.replacen("5 1", "05 1", 1);
        assert!(read(&non_canonical).is_empty());

        let out_of_range = RECORDS.replacen("5 1", "6 2", 1);
        assert!(read(&out_of_range).is_empty());

        // The first record survives when the second is bad.
        let second_bad = RECORDS.replacen("1 1\n", "1 1 1\n", 1);
        assert_eq!(read(&second_bad).len(), 1);
    }

    #[test]
    fn test_line_endings_must_be_bare_newlines() {
        let unterminated = RECORDS.strip_suffix('\n').unwrap();
        let records = read(unterminated);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text(Field::Arg1), "Mike");

        let crlf = RECORDS.replace('\n', "\r\n");
        assert!(read(&crlf).is_empty());

        // Whatever is read back writes out unchanged.
        let mut writer = LabeledWriter::new(Vec::new());
        for record in &records {
            writer.write(record).unwrap();
        }
        let bytes = writer.into_inner().unwrap();
        let first: String = RECORDS
            .lines()
            .take(RECORD_LINES)
            .map(|l| format!("{l}\n"))
            .collect();
        assert_eq!(String::from_utf8(bytes).unwrap(), first);
    }

    #[test]
    fn test_overflowing_span_ends_stream() {
        let overflowing = RECORDS.replacen("5 1\n", "18446744073709551615 1\n", 1);
        assert!(read(&overflowing).is_empty());

        let lines: Vec<&str> = overflowing.lines().take(RECORD_LINES).collect();
        assert!(matches!(
            LabeledRecord::parse(&lines, 1),
            Err(OreError::MalformedRecord { line: 9, .. })
        ));
    }

    #[test]
    fn test_truncated_record_ends_stream() {
        let truncated: String = RECORDS.lines().take(14).map(|l| format!("{l}\n")).collect();
        assert_eq!(read(&truncated).len(), 1);
    }

    #[test]
    fn test_parse_reports_line() {
        let lines: Vec<&str> = RECORDS.lines().take(10).collect();
        let mut bad = lines.clone();
        bad[9] = "2";
        match LabeledRecord::parse(&bad, 11) {
            Err(OreError::MalformedRecord { line, .. }) => assert_eq!(line, 20),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_extraction_conversion() {
        let record = &read(RECORDS)[0];
        let extraction = record.to_extraction().unwrap();
        assert_eq!(extraction.to_string(), "(Mike; is the mayor of; Seattle)");
        assert_eq!(extraction.property(LABEL_PROPERTY), Some("1"));

        let back = LabeledRecord::from_extraction(&extraction, true).unwrap();
        assert_eq!(&back, record);
    }
}
