//! Argument extraction
//!
//! Arguments are noun-phrase chunks found relative to a relation: arg1 to
//! its left, arg2 to its right. The standard stages keep the noun phrase
//! that touches the relation and reject wh-words, coordinated list members
//! and (optionally) personal pronouns.

use std::fmt;

use ore_core::Result;

use crate::extraction::{ArgumentExtraction, ChunkedExtraction};
use crate::pipeline::{Extractor, FilterMapper, ItemStream, Mapper, MapperList};

/// Where an argument lies relative to its relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// arg1, ending at or before the relation start
    Left,
    /// arg2, starting at or after the relation end
    Right,
}

impl Side {
    /// Prefix of this side's stage names
    pub fn stage_prefix(&self) -> &'static str {
        match self {
            Self::Left => "arg1",
            Self::Right => "arg2",
        }
    }

    fn stage(&self, name: &str) -> String {
        format!("{}.{name}", self.stage_prefix())
    }

    /// Whether `arg` lies entirely on this side of `relation`
    pub fn holds(&self, arg: &ChunkedExtraction, relation: &ChunkedExtraction) -> bool {
        match self {
            Self::Left => arg.end() <= relation.start(),
            Self::Right => arg.start() >= relation.end(),
        }
    }

    /// Whether `arg` touches `relation` on this side
    pub fn is_adjacent(&self, arg: &ChunkedExtraction, relation: &ChunkedExtraction) -> bool {
        match self {
            Self::Left => arg.end() == relation.start(),
            Self::Right => arg.start() == relation.end(),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage_prefix())
    }
}

// ============================================================================
// Noun-phrase argument extractor
// ============================================================================

/// Noun-phrase chunks on one side of a relation
pub struct NounPhraseArgumentExtractor {
    side: Side,
    mappers: MapperList<ArgumentExtraction>,
}

impl NounPhraseArgumentExtractor {
    /// Extractor with no refinement stages
    pub fn new(side: Side) -> Self {
        Self {
            side,
            mappers: MapperList::named(side.stage_prefix()),
        }
    }

    /// Extractor with the standard stages for `side`
    pub fn standard(side: Side, allow_pronouns: bool) -> Self {
        Self::new(side).with_mappers(standard_mappers(side, allow_pronouns))
    }

    pub fn with_mappers(mut self, mappers: MapperList<ArgumentExtraction>) -> Self {
        self.mappers = mappers;
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }
}

impl Extractor<ChunkedExtraction, ArgumentExtraction> for NounPhraseArgumentExtractor {
    fn candidates(&self, relation: &ChunkedExtraction) -> Result<Vec<ArgumentExtraction>> {
        let mut found = Vec::new();
        for np in relation.sentence().noun_phrases() {
            let chunk = relation.with_interval(np)?;
            if self.side.holds(&chunk, relation) {
                found.push(ArgumentExtraction::new(chunk, relation.clone())?);
            }
        }
        Ok(found)
    }

    fn mappers(&self) -> &MapperList<ArgumentExtraction> {
        &self.mappers
    }

    fn mappers_mut(&mut self) -> &mut MapperList<ArgumentExtraction> {
        &mut self.mappers
    }
}

// ============================================================================
// Argument stages
// ============================================================================

/// Relative pronouns and wh-words that cannot stand as arguments
pub const WH_WORDS: &[&str] = &[
    "who", "whom", "whose", "which", "that", "what", "where", "when", "why", "how",
];

/// Argument touches the relation
pub fn adjacent(side: Side) -> impl Mapper<ArgumentExtraction> {
    FilterMapper::new(side.stage("adjacent"), move |arg: &ArgumentExtraction| {
        side.is_adjacent(arg, arg.relation())
    })
}

/// Argument does not start with a wh-word or relative pronoun
pub fn no_wh_word(side: Side) -> impl Mapper<ArgumentExtraction> {
    FilterMapper::new(side.stage("no-wh-word"), |arg: &ArgumentExtraction| {
        let sentence = arg.sentence();
        let wh_token = sentence
            .normalized(arg.start())
            .is_some_and(|t| WH_WORDS.contains(&t));
        let wh_tag = sentence.pos(arg.start()).is_some_and(|t| t.starts_with('W'));
        !(wh_token || wh_tag)
    })
}

/// Argument is not a lone personal pronoun
pub fn no_pronoun(side: Side) -> impl Mapper<ArgumentExtraction> {
    FilterMapper::new(side.stage("no-pronoun"), |arg: &ArgumentExtraction| {
        !(arg.len() == 1 && arg.pos_tags().first().is_some_and(|t| t == "PRP"))
    })
}

/// Rejects arg1 when it is a later member of a coordinated list, i.e. it
/// directly follows a comma or conjunction that itself follows a noun phrase
pub fn conjunction_comma_left() -> impl Mapper<ArgumentExtraction> {
    FilterMapper::new(Side::Left.stage("conjunction-comma"), |arg: &ArgumentExtraction| {
        let start = arg.start();
        if start < 2 {
            return true;
        }
        let sentence = arg.sentence();
        let joiner = sentence
            .pos(start - 1)
            .is_some_and(|t| t == "," || t == "CC");
        let after_np = sentence
            .chunk(start - 2)
            .is_some_and(|t| t.ends_with("-NP"));
        !(joiner && after_np)
    })
}

/// Keeps only the argument closest to its relation (the first on ties)
pub struct ClosestArgumentMapper {
    name: String,
}

impl ClosestArgumentMapper {
    pub fn new(side: Side) -> Self {
        Self {
            name: side.stage("closest"),
        }
    }
}

impl Mapper<ArgumentExtraction> for ClosestArgumentMapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn map<'a>(
        &'a self,
        items: ItemStream<'a, ArgumentExtraction>,
    ) -> ItemStream<'a, ArgumentExtraction> {
        let mut best: Option<(usize, ArgumentExtraction)> = None;
        for arg in items {
            let distance = arg.interval().distance_to(&arg.relation().interval());
            if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                best = Some((distance, arg));
            }
        }
        Box::new(best.map(|(_, arg)| arg).into_iter())
    }
}

/// Standard stages for `side`, in application order
pub fn standard_mappers(side: Side, allow_pronouns: bool) -> MapperList<ArgumentExtraction> {
    let mut mappers = MapperList::named(side.stage_prefix());
    if side == Side::Left {
        mappers.push(conjunction_comma_left());
    }
    mappers.push(no_wh_word(side));
    if !allow_pronouns {
        mappers.push(no_pronoun(side));
    }
    mappers.push(adjacent(side));
    mappers.push(ClosestArgumentMapper::new(side));
    mappers
}

// ============================================================================
// Tests
// ============================================================================
