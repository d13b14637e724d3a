//! Relation phrase extraction
//!
//! Relation candidates are verb-mediated phrases over the POS layer:
//!
//! - short: `(V P?)+`, a verb optionally followed by a preposition or particle
//! - long: `(V (W* P)?)+`, which also admits noun, adjective and determiner
//!   words between the verb and the preposition ("is the mayor of")
//!
//! Candidates from both patterns are refined by syntactic and lexical
//! filters and finally merged where they overlap.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use ore_core::{OreError, Result, SentenceRef};

use crate::extraction::ChunkedExtraction;
use crate::pattern_extractor::PatternExtractor;
use crate::pipeline::{ExtractorUnion, FilterMapper, ItemStream, Mapper, MapperList};

// ============================================================================
// Patterns
// ============================================================================

/// Verb with optional leading adverb and trailing particle/adverb
pub const VERB: &str = "RB_pos? [MD_pos VB_pos VBD_pos VBP_pos VBZ_pos VBG_pos VBN_pos] RP_pos? RB_pos?";

/// Noun, adjective, adverb, pronoun, determiner or participle
pub const WORD: &str = "[$_pos PRP$_pos CD_pos DT_pos JJ_pos JJS_pos JJR_pos NN_pos NNS_pos NNP_pos NNPS_pos POS_pos PRP_pos RB_pos RBR_pos RBS_pos VBN_pos VBG_pos]";

/// Preposition, infinitive marker or particle
pub const PREP: &str = "RB_pos? [IN_pos TO_pos RP_pos] RB_pos?";

/// `(V P?)+`
pub fn short_relation_pattern() -> String {
    format!("({VERB} ({PREP})?)+")
}

/// `(V (W* P)?)+`
pub fn long_relation_pattern() -> String {
    format!("({VERB} ({WORD}* {PREP})?)+")
}

/// Candidate generator over the canonical relation patterns
pub fn relation_candidates(use_long: bool) -> Result<ExtractorUnion<SentenceRef, ChunkedExtraction>> {
    let mut union = ExtractorUnion::new().with(PatternExtractor::new(&short_relation_pattern())?);
    if use_long {
        union.add(PatternExtractor::new(&long_relation_pattern())?);
    }
    Ok(union)
}

// ============================================================================
// Stage names
// ============================================================================

pub const HAS_VERB: &str = "relation.has-verb";
pub const FIRST_POS: &str = "relation.first-pos";
pub const FIRST_TOKEN: &str = "relation.first-token";
pub const LEXICAL_CONSTRAINT: &str = "relation.lexical-constraint";
pub const MERGE_OVERLAPPING: &str = "relation.merge-overlapping";

/// POS tags a relation may not start with
pub const BAD_FIRST_POS: &[&str] = &["CC", "PRP", "WDT", "WP", "WP$", "WRB"];

/// Tokens a relation may not start with
pub const BAD_FIRST_TOKENS: &[&str] = &["that", "which", "who"];

// ============================================================================
// Filters
// ============================================================================

/// Relation contains at least one verb
pub fn has_verb() -> impl Mapper<ChunkedExtraction> {
    FilterMapper::new(HAS_VERB, |rel: &ChunkedExtraction| {
        rel.pos_tags().iter().any(|tag| tag.starts_with("VB"))
    })
}

/// First POS tag is not a conjunction, pronoun or wh-word
pub fn first_pos_allowed() -> impl Mapper<ChunkedExtraction> {
    FilterMapper::new(FIRST_POS, |rel: &ChunkedExtraction| {
        rel.pos_tags()
            .first()
            .is_some_and(|tag| !BAD_FIRST_POS.contains(&tag.as_str()))
    })
}

/// First token is not a relative pronoun
pub fn first_token_allowed() -> impl Mapper<ChunkedExtraction> {
    FilterMapper::new(FIRST_TOKEN, |rel: &ChunkedExtraction| {
        rel.sentence()
            .normalized(rel.start())
            .is_some_and(|token| !BAD_FIRST_TOKENS.contains(&token))
    })
}

/// Normalized relation occurs at least `min_frequency` times in `dictionary`
pub fn lexical_constraint(
    dictionary: RelationDictionary,
    min_frequency: usize,
) -> impl Mapper<ChunkedExtraction> {
    FilterMapper::new(LEXICAL_CONSTRAINT, move |rel: &ChunkedExtraction| {
        dictionary.count(&normalize(rel)) >= min_frequency
    })
}

/// Assemble the relation stages in application order
pub fn relation_mappers(
    dictionary: Option<(RelationDictionary, usize)>,
    merge_overlapping: bool,
) -> MapperList<ChunkedExtraction> {
    let mut mappers = MapperList::named("relation")
        .with(first_pos_allowed())
        .with(first_token_allowed())
        .with(has_verb());
    if let Some((dictionary, min_frequency)) = dictionary {
        mappers.push(lexical_constraint(dictionary, min_frequency));
    }
    if merge_overlapping {
        mappers.push(MergeOverlappingMapper);
    }
    mappers
}

// ============================================================================
// Merging
// ============================================================================

/// Replaces each group of mutually overlapping extractions by the smallest
/// extraction covering the group. Output is sorted by start and pairwise
/// disjoint, so applying the mapper twice changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOverlappingMapper;

impl MergeOverlappingMapper {
    pub fn merge(mut items: Vec<ChunkedExtraction>) -> Vec<ChunkedExtraction> {
        items.sort_by_key(ChunkedExtraction::interval);

        let mut merged: Vec<ChunkedExtraction> = Vec::with_capacity(items.len());
        for item in items {
            if let Some(last) = merged.last_mut() {
                if last.same_sentence(&item) && last.interval().overlaps_with(&item.interval()) {
                    *last = last.join(&item);
                    continue;
                }
            }
            merged.push(item);
        }
        merged
    }
}

impl Mapper<ChunkedExtraction> for MergeOverlappingMapper {
    fn name(&self) -> &str {
        MERGE_OVERLAPPING
    }

    fn map<'a>(&'a self, items: ItemStream<'a, ChunkedExtraction>) -> ItemStream<'a, ChunkedExtraction> {
        Box::new(Self::merge(items.collect()).into_iter())
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// POS tags dropped from normalized relations
const DROPPED_POS: &[&str] = &["RB", "RBR", "RBS", "MD", "DT", "PDT", "-LRB-", "-RRB-"];

fn is_punctuation(tag: &str) -> bool {
    !tag.chars().any(|c| c.is_ascii_alphanumeric())
}

/// Lowercased relation text without adverbs, modals, determiners or
/// punctuation. Falls back to the full lowercased text when nothing is left.
pub fn normalize(relation: &ChunkedExtraction) -> String {
    let sentence = relation.sentence();
    let kept: Vec<&str> = relation
        .interval()
        .iter()
        .filter(|&i| {
            sentence
                .pos(i)
                .is_some_and(|tag| !DROPPED_POS.contains(&tag) && !is_punctuation(tag))
        })
        .filter_map(|i| sentence.normalized(i))
        .collect();

    if kept.is_empty() {
        relation.text().to_lowercase()
    } else {
        kept.join(" ")
    }
}

// ============================================================================
// Relation dictionary
// ============================================================================

/// Corpus counts of normalized relation phrases
#[derive(Debug, Clone, Default)]
pub struct RelationDictionary {
    counts: HashMap<String, usize>,
}

impl RelationDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `phrase<TAB>count` lines; blank lines are skipped
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut dictionary = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let malformed = |message: &str| OreError::MalformedRecord {
                line: index + 1,
                message: message.to_string(),
            };
            let (phrase, count) = line
                .rsplit_once('\t')
                .ok_or_else(|| malformed("expected `phrase<TAB>count`"))?;
            let count: usize = count
                .trim()
                .parse()
                .map_err(|_| malformed("count is not a non-negative integer"))?;
            dictionary.insert(phrase, count);
        }
        tracing::debug!(phrases = dictionary.len(), "loaded relation dictionary");
        Ok(dictionary)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Add `count` occurrences of `phrase`
    pub fn insert(&mut self, phrase: &str, count: usize) {
        *self.counts.entry(canonical(phrase)).or_default() += count;
    }

    pub fn count(&self, phrase: &str) -> usize {
        self.counts.get(&canonical(phrase)).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

fn canonical(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================
