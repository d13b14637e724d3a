//! Extraction data model
//!
//! Every extraction refers to its sentence through a shared, immutable
//! [`SentenceRef`]; nothing here copies sentence data. Equality and hashing
//! follow identity (sentence plus interval); confidences and properties are
//! pipeline annotations and do not take part.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ore_core::{AnnotatedSentence, Interval, OreError, Result, SentenceRef};

/// Confidence assigned to new argument extractions
pub const DEFAULT_ARGUMENT_CONFIDENCE: f64 = 0.5;

/// Property holding the extraction confidence
pub const CONFIDENCE_PROPERTY: &str = "confidence";

// ============================================================================
// Chunked extraction
// ============================================================================

/// A contiguous span of one sentence
#[derive(Clone)]
pub struct ChunkedExtraction {
    sentence: SentenceRef,
    interval: Interval,
}

impl ChunkedExtraction {
    /// Fails if `interval` runs past the end of the sentence
    pub fn new(sentence: SentenceRef, interval: Interval) -> Result<Self> {
        if !interval.fits_within(sentence.len()) {
            return Err(OreError::Bounds(format!(
                "extraction {interval} exceeds sentence length {}",
                sentence.len()
            )));
        }
        Ok(Self { sentence, interval })
    }

    pub fn sentence(&self) -> &SentenceRef {
        &self.sentence
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn start(&self) -> usize {
        self.interval.start()
    }

    pub fn end(&self) -> usize {
        self.interval.end()
    }

    pub fn len(&self) -> usize {
        self.interval.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        self.sentence.tokens_in(self.interval)
    }

    pub fn pos_tags(&self) -> &[String] {
        self.sentence.pos_tags_in(self.interval)
    }

    pub fn chunk_tags(&self) -> &[String] {
        self.sentence.chunk_tags_in(self.interval)
    }

    /// Space-joined tokens
    pub fn text(&self) -> String {
        self.sentence.text_of(self.interval)
    }

    /// Whether both extractions refer to the same sentence
    pub fn same_sentence(&self, other: &ChunkedExtraction) -> bool {
        same_sentence(&self.sentence, &other.sentence)
    }

    /// Smallest extraction covering both; `other` must come from the same
    /// sentence
    pub fn join(&self, other: &ChunkedExtraction) -> ChunkedExtraction {
        Self {
            sentence: self.sentence.clone(),
            interval: self.interval.join(&other.interval),
        }
    }

    /// Same sentence, new interval
    pub fn with_interval(&self, interval: Interval) -> Result<Self> {
        Self::new(self.sentence.clone(), interval)
    }
}

fn same_sentence(a: &SentenceRef, b: &SentenceRef) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}

impl PartialEq for ChunkedExtraction {
    fn eq(&self, other: &Self) -> bool {
        self.interval == other.interval && self.same_sentence(other)
    }
}

impl Eq for ChunkedExtraction {}

impl Hash for ChunkedExtraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.interval.hash(state);
        self.sentence.len().hash(state);
    }
}

impl fmt::Debug for ChunkedExtraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedExtraction")
            .field("interval", &self.interval)
            .field("text", &self.text())
            .finish()
    }
}

impl fmt::Display for ChunkedExtraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// ============================================================================
// Argument extraction
// ============================================================================

/// An argument span paired with the relation it was found for
#[derive(Debug, Clone)]
pub struct ArgumentExtraction {
    chunk: ChunkedExtraction,
    relation: ChunkedExtraction,
    confidence: f64,
}

impl ArgumentExtraction {
    pub fn new(chunk: ChunkedExtraction, relation: ChunkedExtraction) -> Result<Self> {
        if !chunk.same_sentence(&relation) {
            return Err(OreError::InvalidExtraction(
                "argument and relation come from different sentences".to_string(),
            ));
        }
        Ok(Self {
            chunk,
            relation,
            confidence: DEFAULT_ARGUMENT_CONFIDENCE,
        })
    }

    /// Zero-length argument at `position`, standing in for a missing one
    pub fn placeholder(relation: &ChunkedExtraction, position: usize) -> Result<Self> {
        let chunk = relation.with_interval(Interval::empty_at(position))?;
        Self::new(chunk, relation.clone())
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn chunk(&self) -> &ChunkedExtraction {
        &self.chunk
    }

    /// The relation this argument was extracted for
    pub fn relation(&self) -> &ChunkedExtraction {
        &self.relation
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = confidence;
    }
}

impl Deref for ArgumentExtraction {
    type Target = ChunkedExtraction;

    fn deref(&self) -> &ChunkedExtraction {
        &self.chunk
    }
}

impl PartialEq for ArgumentExtraction {
    fn eq(&self, other: &Self) -> bool {
        self.chunk == other.chunk && self.relation.interval() == other.relation.interval()
    }
}

impl Eq for ArgumentExtraction {}

impl Hash for ArgumentExtraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chunk.hash(state);
        self.relation.interval().hash(state);
    }
}

// ============================================================================
// Binary extraction
// ============================================================================

/// The three fields of a binary extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Arg1,
    Relation,
    Arg2,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Arg1, Field::Relation, Field::Arg2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arg1 => "arg1",
            Self::Relation => "rel",
            Self::Arg2 => "arg2",
        }
    }
}

/// An (arg1, relation, arg2) triple over one sentence
#[derive(Debug, Clone)]
pub struct BinaryExtraction {
    arg1: ArgumentExtraction,
    relation: ChunkedExtraction,
    arg2: ArgumentExtraction,
    properties: BTreeMap<String, String>,
}

impl BinaryExtraction {
    pub fn new(
        arg1: ArgumentExtraction,
        relation: ChunkedExtraction,
        arg2: ArgumentExtraction,
    ) -> Result<Self> {
        if !arg1.same_sentence(&relation) || !arg2.same_sentence(&relation) {
            return Err(OreError::InvalidExtraction(
                "binary extraction fields come from different sentences".to_string(),
            ));
        }
        Ok(Self {
            arg1,
            relation,
            arg2,
            properties: BTreeMap::new(),
        })
    }

    pub fn arg1(&self) -> &ArgumentExtraction {
        &self.arg1
    }

    pub fn relation(&self) -> &ChunkedExtraction {
        &self.relation
    }

    pub fn arg2(&self) -> &ArgumentExtraction {
        &self.arg2
    }

    pub fn field(&self, field: Field) -> &ChunkedExtraction {
        match field {
            Field::Arg1 => self.arg1.chunk(),
            Field::Relation => &self.relation,
            Field::Arg2 => self.arg2.chunk(),
        }
    }

    pub fn sentence(&self) -> &AnnotatedSentence {
        self.relation.sentence()
    }

    pub fn sentence_ref(&self) -> &SentenceRef {
        self.relation.sentence()
    }

    /// Whether one argument is a zero-length placeholder
    pub fn is_unary(&self) -> bool {
        self.arg1.is_empty() || self.arg2.is_empty()
    }

    /// Tokens of arg1, relation and arg2, in that order
    pub fn tokens(&self) -> Vec<&str> {
        self.concat(ChunkedExtraction::tokens)
    }

    pub fn pos_tags(&self) -> Vec<&str> {
        self.concat(ChunkedExtraction::pos_tags)
    }

    pub fn chunk_tags(&self) -> Vec<&str> {
        self.concat(ChunkedExtraction::chunk_tags)
    }

    fn concat<'a>(&'a self, view: fn(&'a ChunkedExtraction) -> &'a [String]) -> Vec<&'a str> {
        Field::ALL
            .iter()
            .flat_map(|f| view(self.field(*f)))
            .map(String::as_str)
            .collect()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Confidence recorded in the property bag, if any
    pub fn confidence(&self) -> Option<f64> {
        self.property(CONFIDENCE_PROPERTY)?.parse().ok()
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.set_property(CONFIDENCE_PROPERTY, confidence.to_string());
    }
}

impl PartialEq for BinaryExtraction {
    fn eq(&self, other: &Self) -> bool {
        self.relation == other.relation
            && self.arg1.chunk() == other.arg1.chunk()
            && self.arg2.chunk() == other.arg2.chunk()
    }
}

impl Eq for BinaryExtraction {}

impl Hash for BinaryExtraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arg1.chunk().hash(state);
        self.relation.hash(state);
        self.arg2.chunk().hash(state);
    }
}

impl fmt::Display for BinaryExtraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}; {}; {})", self.arg1.text(), self.relation.text(), self.arg2.text())
    }
}

// ============================================================================
// Span extraction
// ============================================================================

/// Named fields over one sentence; a generalisation of the binary triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanExtraction {
    fields: Vec<(String, ChunkedExtraction)>,
}

impl SpanExtraction {
    /// Requires at least one field, all from the same sentence
    pub fn new(fields: Vec<(String, ChunkedExtraction)>) -> Result<Self> {
        let Some((_, first)) = fields.first() else {
            return Err(OreError::InvalidExtraction(
                "span extraction needs at least one field".to_string(),
            ));
        };
        if let Some((name, _)) = fields.iter().find(|(_, c)| !c.same_sentence(first)) {
            return Err(OreError::InvalidExtraction(format!(
                "field {name} comes from a different sentence"
            )));
        }
        Ok(Self { fields })
    }

    pub fn field(&self, name: &str) -> Option<&ChunkedExtraction> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn fields(&self) -> &[(String, ChunkedExtraction)] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn sentence(&self) -> &SentenceRef {
        // `new` guarantees one field.
        self.fields[0].1.sentence()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<&BinaryExtraction> for SpanExtraction {
    fn from(extraction: &BinaryExtraction) -> Self {
        Self {
            fields: Field::ALL
                .iter()
                .map(|f| (f.as_str().to_string(), extraction.field(*f).clone()))
                .collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn mike() -> SentenceRef {
        AnnotatedSentence::from_lines(
            "Mike is the mayor of Seattle .",
            "NNP VBZ DT NN IN NNP .",
            "B-NP O B-NP I-NP O B-NP O",
        )
        .unwrap()
        .into_shared()
    }

    fn chunk(sentence: &SentenceRef, start: usize, len: usize) -> ChunkedExtraction {
        ChunkedExtraction::new(sentence.clone(), Interval::new(start, len)).unwrap()
    }

    fn triple(sentence: &SentenceRef) -> BinaryExtraction {
        let rel = chunk(sentence, 1, 4);
        let arg1 = ArgumentExtraction::new(chunk(sentence, 0, 1), rel.clone()).unwrap();
        let arg2 = ArgumentExtraction::new(chunk(sentence, 5, 1), rel.clone()).unwrap();
        BinaryExtraction::new(arg1, rel, arg2).unwrap()
    }

    #[test]
    fn test_chunk_views() {
        let s = mike();
        let rel = chunk(&s, 1, 4);
        assert_eq!(rel.text(), "is the mayor of");
        assert_eq!(rel.pos_tags(), ["VBZ", "DT", "NN", "IN"]);
        assert_eq!(rel.chunk_tags(), ["O", "B-NP", "I-NP", "O"]);
        assert_eq!(rel.to_string(), "is the mayor of");
    }

    #[test]
    fn test_chunk_out_of_bounds() {
        let err = ChunkedExtraction::new(mike(), Interval::new(5, 3)).unwrap_err();
        assert!(matches!(err, OreError::Bounds(_)));
        assert!(ChunkedExtraction::new(mike(), Interval::new(usize::MAX, 2)).is_err());
    }

    #[test]
    fn test_equality_by_sentence_and_interval() {
        let s = mike();
        let same_content = mike();
        assert_eq!(chunk(&s, 0, 1), chunk(&same_content, 0, 1));
        assert_ne!(chunk(&s, 0, 1), chunk(&s, 0, 2));

        let other = AnnotatedSentence::from_lines("Bob runs", "NNP VBZ", "B-NP O")
            .unwrap()
            .into_shared();
        assert_ne!(chunk(&s, 0, 1), chunk(&other, 0, 1));

        let set: HashSet<ChunkedExtraction> =
            [chunk(&s, 0, 1), chunk(&same_content, 0, 1), chunk(&s, 5, 1)]
                .into_iter()
                .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_argument_defaults() {
        let s = mike();
        let rel = chunk(&s, 1, 4);
        let arg = ArgumentExtraction::new(chunk(&s, 0, 1), rel.clone()).unwrap();
        assert_eq!(arg.confidence(), DEFAULT_ARGUMENT_CONFIDENCE);
        assert_eq!(arg.relation(), &rel);
        assert_eq!(arg.text(), "Mike");

        let scored = arg.clone().with_confidence(0.9);
        assert_eq!(scored, arg);
    }

    #[test]
    fn test_placeholder_argument() {
        let s = mike();
        let rel = chunk(&s, 1, 4);
        let arg = ArgumentExtraction::placeholder(&rel, rel.end()).unwrap();
        assert!(arg.is_empty());
        assert_eq!(arg.start(), 5);
        assert_eq!(arg.text(), "");
    }

    #[test]
    fn test_binary_views_and_properties() {
        let s = mike();
        let mut e = triple(&s);
        assert_eq!(
            e.tokens(),
            vec!["Mike", "is", "the", "mayor", "of", "Seattle"]
        );
        assert_eq!(e.pos_tags().len(), 6);
        assert_eq!(e.to_string(), "(Mike; is the mayor of; Seattle)");
        assert!(!e.is_unary());

        assert_eq!(e.confidence(), None);
        e.set_confidence(0.75);
        e.set_property("doc", "d1");
        assert_eq!(e.confidence(), Some(0.75));
        assert_eq!(e.property("doc"), Some("d1"));
        assert_eq!(e, triple(&s));
    }

    #[test]
    fn test_binary_rejects_mixed_sentences() {
        let s = mike();
        let other = AnnotatedSentence::from_lines("Bob runs", "NNP VBZ", "B-NP O")
            .unwrap()
            .into_shared();
        let rel = chunk(&s, 1, 4);
        let arg1 = ArgumentExtraction::new(chunk(&s, 0, 1), rel.clone()).unwrap();
        let foreign_rel = chunk(&other, 1, 1);
        let arg2 = ArgumentExtraction::new(chunk(&other, 0, 1), foreign_rel).unwrap();
        assert!(BinaryExtraction::new(arg1, rel.clone(), arg2).is_err());
        assert!(ArgumentExtraction::new(chunk(&other, 0, 1), rel).is_err());
    }

    #[test]
    fn test_span_extraction() {
        let s = mike();
        let spans = SpanExtraction::from(&triple(&s));
        assert_eq!(spans.len(), 3);
        assert_eq!(
            spans.field_names().collect::<Vec<_>>(),
            vec!["arg1", "rel", "arg2"]
        );
        assert_eq!(spans.field("arg2").unwrap().text(), "Seattle");

        assert!(SpanExtraction::new(Vec::new()).is_err());

        let other = AnnotatedSentence::from_lines("Bob runs", "NNP VBZ", "B-NP O")
            .unwrap()
            .into_shared();
        let mixed = vec![
            ("a".to_string(), chunk(&s, 0, 1)),
            ("b".to_string(), chunk(&other, 0, 1)),
        ];
        assert!(SpanExtraction::new(mixed).is_err());
    }
}
