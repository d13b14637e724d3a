//! Pattern-driven candidate generation

use ore_core::{Result, SentenceRef};
use ore_pattern::Pattern;

use crate::extraction::ChunkedExtraction;
use crate::pipeline::{Extractor, MapperList};

/// Emits every match of a pattern (or one of its capture groups) as a
/// chunked extraction
pub struct PatternExtractor {
    pattern: Pattern,
    group: usize,
    mappers: MapperList<ChunkedExtraction>,
}

impl PatternExtractor {
    /// Compile `pattern`; syntax errors surface here
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self::from_pattern(Pattern::compile(pattern)?))
    }

    pub fn from_pattern(pattern: Pattern) -> Self {
        Self {
            pattern,
            group: 0,
            mappers: MapperList::new(),
        }
    }

    /// Emit capture group `group` instead of the whole match
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    pub fn with_mappers(mut self, mappers: MapperList<ChunkedExtraction>) -> Self {
        self.mappers = mappers;
        self
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

impl Extractor<SentenceRef, ChunkedExtraction> for PatternExtractor {
    fn candidates(&self, sentence: &SentenceRef) -> Result<Vec<ChunkedExtraction>> {
        let mut found = Vec::new();
        for m in self.pattern.matcher(sentence.sequence())? {
            // Groups that did not take part in this match are skipped.
            if let Some(interval) = m.group(self.group).filter(|i| !i.is_empty()) {
                found.push(ChunkedExtraction::new(sentence.clone(), interval)?);
            }
        }
        tracing::trace!(pattern = %self.pattern, candidates = found.len(), "pattern candidates");
        Ok(found)
    }

    fn mappers(&self) -> &MapperList<ChunkedExtraction> {
        &self.mappers
    }

    fn mappers_mut(&mut self) -> &mut MapperList<ChunkedExtraction> {
        &mut self.mappers
    }
}

// ============================================================================
// Tests
// ============================================================================
