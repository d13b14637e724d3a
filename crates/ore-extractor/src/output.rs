//! Extraction output formatting
//!
//! TSV columns: sentence index, arg1, relation, arg2, the three spans as
//! `start length`, confidence (empty when unscored), normalized relation,
//! and optionally the sentence text. JSON output is one object per line.

use std::io::Write;

use serde::Serialize;

use ore_core::{Interval, OutputConfig, OutputFormat, Result};

use crate::extraction::BinaryExtraction;
use crate::relation::normalize;

/// One output row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    pub sentence: usize,
    pub arg1: String,
    pub relation: String,
    pub arg2: String,
    pub arg1_span: Interval,
    pub relation_span: Interval,
    pub arg2_span: Interval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub normalized_relation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ExtractionRecord {
    pub fn new(sentence: usize, extraction: &BinaryExtraction, include_sentence: bool) -> Self {
        Self {
            sentence,
            arg1: extraction.arg1().text(),
            relation: extraction.relation().text(),
            arg2: extraction.arg2().text(),
            arg1_span: extraction.arg1().interval(),
            relation_span: extraction.relation().interval(),
            arg2_span: extraction.arg2().interval(),
            confidence: extraction.confidence(),
            normalized_relation: normalize(extraction.relation()),
            text: include_sentence.then(|| extraction.sentence().text()),
        }
    }

    pub fn to_tsv(&self) -> String {
        let span = |i: Interval| format!("{} {}", i.start(), i.len());
        let mut columns = vec![
            self.sentence.to_string(),
            self.arg1.clone(),
            self.relation.clone(),
            self.arg2.clone(),
            span(self.arg1_span),
            span(self.relation_span),
            span(self.arg2_span),
            self.confidence.map(|c| format!("{c:.4}")).unwrap_or_default(),
            self.normalized_relation.clone(),
        ];
        if let Some(text) = &self.text {
            columns.push(text.clone());
        }
        columns.join("\t")
    }
}

/// Writes extraction rows in the configured format
pub struct OutputWriter<W> {
    output: W,
    format: OutputFormat,
    include_sentence: bool,
    written: usize,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(output: W, config: &OutputConfig) -> Self {
        Self {
            output,
            format: config.format,
            include_sentence: config.include_sentence,
            written: 0,
        }
    }

    pub fn write(&mut self, sentence: usize, extraction: &BinaryExtraction) -> Result<()> {
        let record = ExtractionRecord::new(sentence, extraction, self.include_sentence);
        match self.format {
            OutputFormat::Tsv => writeln!(self.output, "{}", record.to_tsv())?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.output, &record)
                    .map_err(|e| anyhow::anyhow!("failed to serialize extraction: {e}"))?;
                writeln!(self.output)?;
            }
        }
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.output)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeled::LabeledReader;

    const RECORD: &str = "\
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
";

    fn extraction() -> BinaryExtraction {
        LabeledReader::new(RECORD.as_bytes())
            .next()
            .unwrap()
            .to_extraction()
            .unwrap()
    }

    fn render(format: OutputFormat, include_sentence: bool, e: &BinaryExtraction) -> String {
        let config = OutputConfig {
            format,
            include_sentence,
        };
        let mut writer = OutputWriter::new(Vec::new(), &config);
        writer.write(3, e).unwrap();
        assert_eq!(writer.written(), 1);
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_tsv() {
        let mut e = extraction();
        assert_eq!(
            render(OutputFormat::Tsv, false, &e),
            "3\tMike\tis the mayor of\tSeattle\t0 1\t1 4\t5 1\t\tis mayor of\n"
        );

        e.set_confidence(0.25);
        let line = render(OutputFormat::Tsv, true, &e);
        let columns: Vec<&str> = line.trim_end().split('\t').collect();
        assert_eq!(columns.len(), 10);
        assert_eq!(columns[7], "0.2500");
        assert_eq!(columns[9], "Mike is the mayor of Seattle .");
    }

    #[test]
    fn test_json() {
        let mut e = extraction();
        e.set_confidence(0.5);
        let line = render(OutputFormat::Json, false, &e);
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["sentence"], 3);
        assert_eq!(value["relation"], "is the mayor of");
        assert_eq!(value["relation_span"]["start"], 1);
        assert_eq!(value["relation_span"]["length"], 4);
        assert_eq!(value["confidence"], 0.5);
        assert_eq!(value["normalized_relation"], "is mayor of");
        assert!(value.get("text").is_none());
    }
}
