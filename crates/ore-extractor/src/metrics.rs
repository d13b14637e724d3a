//! Evaluation metrics
//!
//! Compares extractor output against labeled records: precision, recall
//! and F1 over triple matches, plus a precision/yield curve obtained by
//! ranking predictions by confidence.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use ore_core::{Result, SentenceRef};

use crate::extraction::{BinaryExtraction, Field};
use crate::labeled::LabeledRecord;
use crate::pipeline::Extractor;

// ============================================================================
// Extraction Metrics
// ============================================================================

/// Match counts for one evaluation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    /// Predictions that match a positive gold record
    pub true_positives: usize,
    /// Predictions with no matching positive record
    pub false_positives: usize,
    /// Positive records nothing matched
    pub false_negatives: usize,
    /// Positive gold records
    pub gold_total: usize,
    /// Predictions made
    pub predicted_total: usize,
}

impl ExtractionMetrics {
    /// TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// 2PR / (P + R)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn merge(&mut self, other: &ExtractionMetrics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.gold_total += other.gold_total;
        self.predicted_total += other.predicted_total;
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Precision after keeping every prediction scored at or above `confidence`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionYieldPoint {
    pub confidence: f64,
    /// Correct predictions kept
    pub yield_count: usize,
    pub precision: f64,
}

/// Result of an evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub sentences: usize,
    pub metrics: ExtractionMetrics,
    pub precision_yield: Vec<PrecisionYieldPoint>,
}

impl EvaluationReport {
    /// Area under the precision/yield curve, normalised by the final yield
    pub fn average_precision(&self) -> f64 {
        let mut previous = 0usize;
        let mut area = 0.0;
        for point in &self.precision_yield {
            area += (point.yield_count - previous) as f64 * point.precision;
            previous = point.yield_count;
        }
        if previous == 0 {
            0.0
        } else {
            area / previous as f64
        }
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Matches predictions to labeled records
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    /// Require identical spans rather than identical (case-folded) text
    strict: bool,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable strict span matching
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether `predicted` is the triple described by `gold`
    pub fn matches(&self, predicted: &BinaryExtraction, gold: &LabeledRecord) -> bool {
        if predicted.sentence().tokens() != gold.sentence().tokens() {
            return false;
        }
        Field::ALL.iter().all(|&field| {
            if self.strict {
                predicted.field(field).interval() == gold.interval(field)
            } else {
                predicted.field(field).text().to_lowercase() == gold.text(field).to_lowercase()
            }
        })
    }

    /// Score `predicted` against the positive records of `gold`. Each
    /// record can be matched once.
    pub fn evaluate(&self, predicted: &[BinaryExtraction], gold: &[LabeledRecord]) -> EvaluationReport {
        let positives: Vec<&LabeledRecord> = gold.iter().filter(|r| r.label()).collect();
        let mut matched: HashSet<usize> = HashSet::new();
        let mut correct = Vec::with_capacity(predicted.len());

        for prediction in predicted {
            let hit = positives
                .iter()
                .enumerate()
                .find(|(idx, g)| !matched.contains(idx) && self.matches(prediction, g))
                .map(|(idx, _)| idx);
            if let Some(idx) = hit {
                matched.insert(idx);
            }
            correct.push(hit.is_some());
        }

        let true_positives = matched.len();
        let metrics = ExtractionMetrics {
            true_positives,
            false_positives: predicted.len() - true_positives,
            false_negatives: positives.len() - true_positives,
            gold_total: positives.len(),
            predicted_total: predicted.len(),
        };

        let sentences = distinct_sentences(gold.iter().map(LabeledRecord::sentence)).len();
        EvaluationReport {
            sentences,
            metrics,
            precision_yield: precision_yield(predicted, &correct),
        }
    }

    /// Run `extractor` over every distinct sentence of `gold` and evaluate
    /// its output. A sentence the extractor fails on is logged and
    /// contributes no predictions.
    pub fn evaluate_extractor<E>(&self, extractor: &E, gold: &[LabeledRecord]) -> Result<EvaluationReport>
    where
        E: Extractor<SentenceRef, BinaryExtraction> + ?Sized,
    {
        let sentences = distinct_sentences(gold.iter().map(LabeledRecord::sentence));
        let mut predicted = Vec::new();
        for (index, sentence) in sentences.iter().enumerate() {
            match extractor.extract(sentence) {
                Ok(extractions) => predicted.extend(extractions),
                Err(e) => tracing::warn!(sentence = index, error = %e, "extraction failed, skipping sentence"),
            }
        }
        tracing::debug!(
            sentences = sentences.len(),
            predicted = predicted.len(),
            "evaluating extractor"
        );
        Ok(self.evaluate(&predicted, gold))
    }
}

/// Sentences in first-seen order, deduplicated by token content
fn distinct_sentences<'a>(sentences: impl Iterator<Item = &'a SentenceRef>) -> Vec<SentenceRef> {
    let mut seen: HashSet<String> = HashSet::new();
    sentences
        .filter(|s| seen.insert(s.tokens().join(" ")))
        .cloned()
        .collect()
}

/// One point per distinct confidence, predictions ranked high to low.
/// Unscored predictions rank last with confidence 0.
fn precision_yield(predicted: &[BinaryExtraction], correct: &[bool]) -> Vec<PrecisionYieldPoint> {
    let mut ranked: Vec<(f64, bool)> = predicted
        .iter()
        .zip(correct)
        .map(|(p, &ok)| (p.confidence().unwrap_or(0.0), ok))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut points: Vec<PrecisionYieldPoint> = Vec::new();
    let mut yield_count = 0;
    for (kept, (confidence, ok)) in ranked.iter().enumerate() {
        if *ok {
            yield_count += 1;
        }
        let point = PrecisionYieldPoint {
            confidence: *confidence,
            yield_count,
            precision: ratio(yield_count, kept + 1),
        };
        match points.last_mut() {
            Some(last) if last.confidence == *confidence => *last = point,
            _ => points.push(point),
        }
    }
    points
}

// ============================================================================
// Tests
// ============================================================================
