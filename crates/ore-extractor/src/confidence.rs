//! Confidence scoring
//!
//! Scoring is an injected [`ConfidenceFunction`]. The crate ships a linear
//! model over boolean features; each feature pairs a range selector (which
//! positions of the sentence to look at) with a position predicate (what to
//! look for there). Weights are supplied from outside; nothing is trained.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ore_core::{AnnotatedSentence, Interval, OreError, Result};

use crate::extraction::{BinaryExtraction, Field};
use crate::pipeline::{ItemStream, Mapper};

/// Scores a finished extraction with a value in `[0, 1]`
pub trait ConfidenceFunction: Send + Sync {
    fn score(&self, extraction: &BinaryExtraction) -> Result<f64>;
}

impl<F> ConfidenceFunction for F
where
    F: Fn(&BinaryExtraction) -> Result<f64> + Send + Sync,
{
    fn score(&self, extraction: &BinaryExtraction) -> Result<f64> {
        self(extraction)
    }
}

/// Same score for every extraction
#[derive(Debug, Clone, Copy)]
pub struct ConstantConfidence(pub f64);

impl ConfidenceFunction for ConstantConfidence {
    fn score(&self, _: &BinaryExtraction) -> Result<f64> {
        Ok(self.0)
    }
}

// ============================================================================
// Features
// ============================================================================

/// Picks the positions a feature inspects; `None` when the range does not
/// exist for this extraction
pub type RangeSelector = Arc<dyn Fn(&BinaryExtraction) -> Option<Interval> + Send + Sync>;

/// Tests one position of a sentence
pub type PositionPredicate = Arc<dyn Fn(usize, &AnnotatedSentence) -> bool + Send + Sync>;

/// Fires when the predicate holds at any position of the selected range
#[derive(Clone)]
pub struct Feature {
    name: String,
    selector: RangeSelector,
    predicate: PositionPredicate,
}

impl Feature {
    pub fn new(name: impl Into<String>, selector: RangeSelector, predicate: PositionPredicate) -> Self {
        Self {
            name: name.into(),
            selector,
            predicate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fires(&self, extraction: &BinaryExtraction) -> bool {
        let sentence = extraction.sentence();
        (self.selector)(extraction)
            .map(|range| {
                range
                    .iter()
                    .take_while(|&i| i < sentence.len())
                    .any(|i| (self.predicate)(i, sentence))
            })
            .unwrap_or(false)
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature").field("name", &self.name).finish()
    }
}

/// Range selectors
pub mod select {
    use super::*;

    /// The span of one field
    pub fn field(field: Field) -> RangeSelector {
        Arc::new(move |e: &BinaryExtraction| Some(e.field(field).interval()))
    }

    pub fn arg1() -> RangeSelector {
        field(Field::Arg1)
    }

    pub fn relation() -> RangeSelector {
        field(Field::Relation)
    }

    pub fn arg2() -> RangeSelector {
        field(Field::Arg2)
    }

    /// Up to `width` positions before arg1
    pub fn before_arg1(width: usize) -> RangeSelector {
        Arc::new(move |e: &BinaryExtraction| {
            let end = e.arg1().start();
            let start = end.saturating_sub(width);
            Interval::from_bounds(start, end).ok()
        })
    }

    /// Up to `width` positions after arg2
    pub fn after_arg2(width: usize) -> RangeSelector {
        Arc::new(move |e: &BinaryExtraction| {
            let start = e.arg2().end();
            let end = (start + width).min(e.sentence().len());
            Interval::from_bounds(start, end).ok()
        })
    }

    /// Positions strictly between the end of `from` and the start of `to`
    pub fn between(from: Field, to: Field) -> RangeSelector {
        Arc::new(move |e: &BinaryExtraction| {
            Interval::from_bounds(e.field(from).end(), e.field(to).start()).ok()
        })
    }
}

/// Position predicates
pub mod predicate {
    use super::*;

    /// Lowercased token is one of `tokens`
    pub fn token_in<S: AsRef<str>>(tokens: &[S]) -> PositionPredicate {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_lowercase()).collect();
        Arc::new(move |i, sentence: &AnnotatedSentence| {
            sentence
                .normalized(i)
                .is_some_and(|t| tokens.iter().any(|x| x == t))
        })
    }

    /// POS tag is one of `tags`
    pub fn pos_in<S: AsRef<str>>(tags: &[S]) -> PositionPredicate {
        let tags: Vec<String> = tags.iter().map(|t| t.as_ref().to_string()).collect();
        Arc::new(move |i, sentence: &AnnotatedSentence| {
            sentence.pos(i).is_some_and(|t| tags.iter().any(|x| x == t))
        })
    }

    /// POS tag starts with `prefix`
    pub fn pos_prefix(prefix: &str) -> PositionPredicate {
        let prefix = prefix.to_string();
        Arc::new(move |i, sentence: &AnnotatedSentence| {
            sentence.pos(i).is_some_and(|t| t.starts_with(&prefix))
        })
    }
}

// ============================================================================
// Serializable feature descriptions
// ============================================================================

/// Range selector as written in a model file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorDef {
    Arg1,
    Relation,
    Arg2,
    BeforeArg1 { width: usize },
    AfterArg2 { width: usize },
    Between { from: Field, to: Field },
}

impl SelectorDef {
    pub fn build(&self) -> RangeSelector {
        match self {
            Self::Arg1 => select::arg1(),
            Self::Relation => select::relation(),
            Self::Arg2 => select::arg2(),
            Self::BeforeArg1 { width } => select::before_arg1(*width),
            Self::AfterArg2 { width } => select::after_arg2(*width),
            Self::Between { from, to } => select::between(*from, *to),
        }
    }
}

/// Position predicate as written in a model file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateDef {
    TokenIn { values: Vec<String> },
    PosIn { values: Vec<String> },
    PosPrefix { prefix: String },
}

impl PredicateDef {
    pub fn build(&self) -> PositionPredicate {
        match self {
            Self::TokenIn { values } => predicate::token_in(values),
            Self::PosIn { values } => predicate::pos_in(values),
            Self::PosPrefix { prefix } => predicate::pos_prefix(prefix),
        }
    }
}

/// One weighted feature of a linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    pub selector: SelectorDef,
    pub predicate: PredicateDef,
    pub weight: f64,
}

/// Weights of a [`LinearConfidence`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    #[serde(default)]
    pub bias: f64,
    #[serde(default)]
    pub features: Vec<FeatureDef>,
}

// ============================================================================
// Linear confidence
// ============================================================================

/// Logistic function over a weighted sum of firing features
#[derive(Debug, Clone, Default)]
pub struct LinearConfidence {
    bias: f64,
    features: Vec<(Feature, f64)>,
}

impl LinearConfidence {
    pub fn new(bias: f64) -> Self {
        Self {
            bias,
            features: Vec::new(),
        }
    }

    pub fn with_feature(mut self, feature: Feature, weight: f64) -> Self {
        self.features.push((feature, weight));
        self
    }

    pub fn from_def(def: &ModelDef) -> Self {
        def.features.iter().fold(Self::new(def.bias), |model, f| {
            model.with_feature(
                Feature::new(&f.name, f.selector.build(), f.predicate.build()),
                f.weight,
            )
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let def: ModelDef = serde_json::from_str(json)
            .map_err(|e| OreError::Confidence(format!("invalid model: {e}")))?;
        Ok(Self::from_def(&def))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let def: ModelDef = toml::from_str(text)
            .map_err(|e| OreError::Confidence(format!("invalid model: {e}")))?;
        Ok(Self::from_def(&def))
    }

    /// Load a model file; `.toml` files are read as TOML, anything else as JSON
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    /// Names of the features that fire for `extraction`
    pub fn firing(&self, extraction: &BinaryExtraction) -> Vec<&str> {
        self.features
            .iter()
            .filter(|(f, _)| f.fires(extraction))
            .map(|(f, _)| f.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl ConfidenceFunction for LinearConfidence {
    fn score(&self, extraction: &BinaryExtraction) -> Result<f64> {
        let sum: f64 = self.bias
            + self
                .features
                .iter()
                .filter(|(f, _)| f.fires(extraction))
                .map(|(_, w)| w)
                .sum::<f64>();
        if !sum.is_finite() {
            return Err(OreError::Confidence(format!(
                "non-finite score for {extraction}"
            )));
        }
        Ok((1.0 / (1.0 + (-sum).exp())).clamp(0.0, 1.0))
    }
}

// ============================================================================
// Scoring stage
// ============================================================================

/// Stage name of [`ScoringMapper`]
pub const SCORING: &str = "extraction.confidence";

/// Records a confidence on each extraction and drops those below a
/// threshold. An extraction whose scoring fails is logged and dropped; the
/// rest of the stream continues.
pub struct ScoringMapper {
    function: Box<dyn ConfidenceFunction>,
    threshold: f64,
}

impl ScoringMapper {
    pub fn new(function: impl ConfidenceFunction + 'static, threshold: f64) -> Self {
        Self::boxed(Box::new(function), threshold)
    }

    pub fn boxed(function: Box<dyn ConfidenceFunction>, threshold: f64) -> Self {
        Self {
            function,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Mapper<BinaryExtraction> for ScoringMapper {
    fn name(&self) -> &str {
        SCORING
    }

    fn map<'a>(&'a self, items: ItemStream<'a, BinaryExtraction>) -> ItemStream<'a, BinaryExtraction> {
        Box::new(items.filter_map(move |mut extraction| {
            let score = self.function.score(&extraction).and_then(|score| {
                if (0.0..=1.0).contains(&score) {
                    Ok(score)
                } else {
                    Err(OreError::Confidence(format!("score {score} outside [0, 1]")))
                }
            });
            match score {
                Ok(score) if score >= self.threshold => {
                    extraction.set_confidence(score);
                    Some(extraction)
                }
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(%extraction, error = %e, "confidence scoring failed");
                    None
                }
            }
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
