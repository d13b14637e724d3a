//! Relation-first binary extraction
//!
//! For each relation candidate in a sentence, arguments are extracted on
//! both sides and paired by cross product. When one side has no argument
//! and unary relations are allowed, a zero-length placeholder stands in:
//! after the relation for a missing arg2, at its start for a missing arg1.

use ore_core::{Result, SentenceRef};

use crate::extraction::{ArgumentExtraction, BinaryExtraction, ChunkedExtraction};
use crate::pipeline::{Extractor, MapperList};

type RelationExtractor = Box<dyn Extractor<SentenceRef, ChunkedExtraction>>;
type ArgumentExtractor = Box<dyn Extractor<ChunkedExtraction, ArgumentExtraction>>;

pub struct RelationFirstExtractor {
    relations: RelationExtractor,
    arg1: ArgumentExtractor,
    arg2: ArgumentExtractor,
    allow_unary: bool,
    mappers: MapperList<BinaryExtraction>,
}

impl RelationFirstExtractor {
    pub fn new(
        relations: impl Extractor<SentenceRef, ChunkedExtraction> + 'static,
        arg1: impl Extractor<ChunkedExtraction, ArgumentExtraction> + 'static,
        arg2: impl Extractor<ChunkedExtraction, ArgumentExtraction> + 'static,
    ) -> Self {
        Self {
            relations: Box::new(relations),
            arg1: Box::new(arg1),
            arg2: Box::new(arg2),
            allow_unary: false,
            mappers: MapperList::named("extraction"),
        }
    }

    /// Emit single-argument extractions with a placeholder for the other
    pub fn with_unary(mut self, allow_unary: bool) -> Self {
        self.allow_unary = allow_unary;
        self
    }

    pub fn allows_unary(&self) -> bool {
        self.allow_unary
    }

    pub fn relation_extractor(&self) -> &dyn Extractor<SentenceRef, ChunkedExtraction> {
        self.relations.as_ref()
    }

    pub fn relation_extractor_mut(&mut self) -> &mut dyn Extractor<SentenceRef, ChunkedExtraction> {
        self.relations.as_mut()
    }

    pub fn arg1_extractor_mut(&mut self) -> &mut dyn Extractor<ChunkedExtraction, ArgumentExtraction> {
        self.arg1.as_mut()
    }

    pub fn arg2_extractor_mut(&mut self) -> &mut dyn Extractor<ChunkedExtraction, ArgumentExtraction> {
        self.arg2.as_mut()
    }

    /// Enable or disable the stage called `name` wherever it appears.
    /// Returns whether any stage had that name.
    pub fn set_stage_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = self.relations.mappers_mut().set_enabled(name, enabled);
        found |= self.arg1.mappers_mut().set_enabled(name, enabled);
        found |= self.arg2.mappers_mut().set_enabled(name, enabled);
        found |= self.mappers.set_enabled(name, enabled);
        found
    }

    /// Names of every stage, relation stages first
    pub fn stage_names(&self) -> Vec<String> {
        self.relations
            .mappers()
            .names()
            .chain(self.arg1.mappers().names())
            .chain(self.arg2.mappers().names())
            .chain(self.mappers.names())
            .map(String::from)
            .collect()
    }

    /// Extractions for one relation
    fn pair(&self, relation: &ChunkedExtraction) -> Result<Vec<BinaryExtraction>> {
        let arg1s: Vec<ArgumentExtraction> = self.arg1.extract(relation)?.collect();
        let arg2s: Vec<ArgumentExtraction> = self.arg2.extract(relation)?.collect();

        let mut out = Vec::with_capacity(arg1s.len() * arg2s.len().max(1));
        match (arg1s.is_empty(), arg2s.is_empty()) {
            (false, false) => {
                for arg1 in &arg1s {
                    for arg2 in &arg2s {
                        out.push(BinaryExtraction::new(
                            arg1.clone(),
                            relation.clone(),
                            arg2.clone(),
                        )?);
                    }
                }
            }
            (false, true) if self.allow_unary => {
                let placeholder = ArgumentExtraction::placeholder(relation, relation.end())?;
                for arg1 in arg1s {
                    out.push(BinaryExtraction::new(
                        arg1,
                        relation.clone(),
                        placeholder.clone(),
                    )?);
                }
            }
            (true, false) if self.allow_unary => {
                let placeholder = ArgumentExtraction::placeholder(relation, relation.start())?;
                for arg2 in arg2s {
                    out.push(BinaryExtraction::new(
                        placeholder.clone(),
                        relation.clone(),
                        arg2,
                    )?);
                }
            }
            _ => {}
        }
        Ok(out)
    }
}

impl Extractor<SentenceRef, BinaryExtraction> for RelationFirstExtractor {
    fn candidates(&self, sentence: &SentenceRef) -> Result<Vec<BinaryExtraction>> {
        let mut extractions = Vec::new();
        let mut relations = 0usize;
        for relation in self.relations.extract(sentence)? {
            relations += 1;
            extractions.extend(self.pair(&relation)?);
        }
        tracing::debug!(
            relations,
            extractions = extractions.len(),
            "relation-first extraction"
        );
        Ok(extractions)
    }

    fn mappers(&self) -> &MapperList<BinaryExtraction> {
        &self.mappers
    }

    fn mappers_mut(&mut self) -> &mut MapperList<BinaryExtraction> {
        &mut self.mappers
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{NounPhraseArgumentExtractor, Side};
    use crate::pattern_extractor::PatternExtractor;
    use ore_core::{AnnotatedSentence, Interval};

    fn sentence() -> SentenceRef {
        AnnotatedSentence::from_lines(
            "Mike and Bob visited Rome and Paris",
            "NNP CC NNP VBD NNP CC NNP",
            "B-NP O B-NP O B-NP O B-NP",
        )
        .unwrap()
        .into_shared()
    }

    fn extractor(allow_unary: bool) -> RelationFirstExtractor {
        RelationFirstExtractor::new(
            PatternExtractor::new("VBD_pos").unwrap(),
            NounPhraseArgumentExtractor::new(Side::Left),
            NounPhraseArgumentExtractor::new(Side::Right),
        )
        .with_unary(allow_unary)
    }

    #[test]
    fn test_cross_product() {
        let out: Vec<BinaryExtraction> = extractor(false).extract(&sentence()).unwrap().collect();
        assert_eq!(out.len(), 4);
        let rendered: Vec<String> = out.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "(Mike; visited; Rome)",
                "(Mike; visited; Paris)",
                "(Bob; visited; Rome)",
                "(Bob; visited; Paris)",
            ]
        );
    }

    #[test]
    fn test_missing_arg2() {
        let s = AnnotatedSentence::from_lines("Mike and Bob left", "NNP CC NNP VBD", "B-NP O B-NP O")
            .unwrap()
            .into_shared();

        assert_eq!(extractor(false).extract(&s).unwrap().count(), 0);

        let out: Vec<BinaryExtraction> = extractor(true).extract(&s).unwrap().collect();
        assert_eq!(out.len(), 2);
        for e in &out {
            assert!(e.is_unary());
            assert_eq!(e.arg2().interval(), Interval::new(4, 0));
        }
    }

    #[test]
    fn test_missing_arg1() {
        let s = AnnotatedSentence::from_lines("visited Rome and Paris", "VBD NNP CC NNP", "O B-NP O B-NP")
            .unwrap()
            .into_shared();
        let out: Vec<BinaryExtraction> = extractor(true).extract(&s).unwrap().collect();
        assert_eq!(out.len(), 2);
        for e in &out {
            assert_eq!(e.arg1().interval(), Interval::new(0, 0));
        }
    }

    #[test]
    fn test_no_arguments() {
        let s = AnnotatedSentence::from_lines("left", "VBD", "O")
            .unwrap()
            .into_shared();
        assert_eq!(extractor(true).extract(&s).unwrap().count(), 0);
    }

    #[test]
    fn test_stage_toggling() {
        let mut ex = RelationFirstExtractor::new(
            PatternExtractor::new("VBD_pos").unwrap(),
            NounPhraseArgumentExtractor::standard(Side::Left, true),
            NounPhraseArgumentExtractor::standard(Side::Right, true),
        );
        assert!(ex.stage_names().contains(&"arg1.conjunction-comma".to_string()));

        // "Bob" follows "Mike and", so it is read as a list member.
        assert_eq!(ex.extract(&sentence()).unwrap().count(), 0);

        assert!(ex.set_stage_enabled("arg1.conjunction-comma", false));
        assert!(!ex.set_stage_enabled("no.such-stage", false));
        let out: Vec<BinaryExtraction> = ex.extract(&sentence()).unwrap().collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to_string(), "(Bob; visited; Rome)");
    }
}
