//! ORE Extractor - Relation-first binary extraction pipeline
//!
//! Builds (arg1, relation, arg2) triples from tagged sentences:
//! - Pipeline framework (named mapper stages over lazy item streams)
//! - Relation candidates from verb-centred patterns, refined by filters
//!   and an optional lexical constraint
//! - Noun-phrase arguments on either side of each relation
//! - Confidence scoring through an injected function
//! - Labeled interchange, sentence input, output formatting and evaluation

pub mod argument;
pub mod builder;
pub mod confidence;
pub mod extraction;
pub mod labeled;
pub mod metrics;
pub mod output;
pub mod pattern_extractor;
pub mod pipeline;
pub mod reader;
pub mod relation;
pub mod relation_first;

pub use argument::{NounPhraseArgumentExtractor, Side};
pub use builder::ExtractorBuilder;
pub use confidence::{ConfidenceFunction, Feature, LinearConfidence, ScoringMapper};
pub use extraction::{
    ArgumentExtraction, BinaryExtraction, ChunkedExtraction, Field, SpanExtraction,
};
pub use labeled::{LabeledReader, LabeledRecord, LabeledWriter};
pub use metrics::{EvaluationReport, Evaluator, ExtractionMetrics};
pub use output::{ExtractionRecord, OutputWriter};
pub use pattern_extractor::PatternExtractor;
pub use pipeline::{
    Extractor, ExtractorUnion, FilterMapper, IndependentMapper, ItemStream, Mapper, MapperList,
};
pub use reader::SentenceReader;
pub use relation::{MergeOverlappingMapper, RelationDictionary};
pub use relation_first::RelationFirstExtractor;
