//! Annotated sentences
//!
//! An [`AnnotatedSentence`] is a [`LayeredSequence`] with the canonical
//! layers produced by an external tokenizer, POS tagger and chunker.

use std::sync::Arc;

use crate::{Interval, LayeredSequence, Result};

/// Surface token layer
pub const TOKEN_LAYER: &str = "tok";
/// Lowercased token layer
pub const NORMALIZED_LAYER: &str = "norm";
/// Part-of-speech layer
pub const POS_LAYER: &str = "pos";
/// BIO chunk layer
pub const CHUNK_LAYER: &str = "chunk";

/// Chunk type of noun phrases
pub const NOUN_PHRASE: &str = "NP";

/// Shared handle to an immutable sentence
pub type SentenceRef = Arc<AnnotatedSentence>;

/// Tokenized, POS-tagged and chunked sentence
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSentence {
    sequence: LayeredSequence,
}

impl AnnotatedSentence {
    /// Build a sentence from parallel token, POS and chunk tag lists
    pub fn new<S: AsRef<str>>(tokens: &[S], pos_tags: &[S], chunk_tags: &[S]) -> Result<Self> {
        let mut sequence = LayeredSequence::new(tokens.len());
        sequence.add_layer(TOKEN_LAYER, tokens.iter().map(|t| t.as_ref().to_string()))?;
        sequence.add_layer(
            NORMALIZED_LAYER,
            tokens.iter().map(|t| t.as_ref().to_lowercase()),
        )?;
        sequence.add_layer(POS_LAYER, pos_tags.iter().map(|t| t.as_ref().to_string()))?;
        sequence.add_span_layer(
            CHUNK_LAYER,
            chunk_tags.iter().map(|t| t.as_ref().to_string()),
        )?;
        Ok(Self { sequence })
    }

    /// Build a sentence from three space-joined lines
    pub fn from_lines(tokens: &str, pos_tags: &str, chunk_tags: &str) -> Result<Self> {
        let tokens: Vec<&str> = tokens.split(' ').filter(|t| !t.is_empty()).collect();
        let pos_tags: Vec<&str> = pos_tags.split(' ').filter(|t| !t.is_empty()).collect();
        let chunk_tags: Vec<&str> = chunk_tags.split(' ').filter(|t| !t.is_empty()).collect();
        Self::new(&tokens, &pos_tags, &chunk_tags)
    }

    /// Wrap an existing sequence that already carries any extra layers.
    /// The canonical layers are validated on the way in.
    pub fn from_sequence(sequence: LayeredSequence) -> Result<Self> {
        for layer in [TOKEN_LAYER, POS_LAYER, CHUNK_LAYER] {
            if !sequence.has_layer(layer) {
                return Err(crate::OreError::UndeclaredLayer {
                    layer: layer.to_string(),
                });
            }
        }
        Ok(Self { sequence })
    }

    pub fn into_shared(self) -> SentenceRef {
        Arc::new(self)
    }

    pub fn sequence(&self) -> &LayeredSequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        self.sequence.layer(TOKEN_LAYER).unwrap_or(&[])
    }

    pub fn pos_tags(&self) -> &[String] {
        self.sequence.layer(POS_LAYER).unwrap_or(&[])
    }

    pub fn chunk_tags(&self) -> &[String] {
        self.sequence.layer(CHUNK_LAYER).unwrap_or(&[])
    }

    pub fn token(&self, i: usize) -> Option<&str> {
        self.sequence.tag(TOKEN_LAYER, i)
    }

    /// Lowercased token at `i`
    pub fn normalized(&self, i: usize) -> Option<&str> {
        self.sequence
            .tag(NORMALIZED_LAYER, i)
            .or_else(|| self.sequence.tag(TOKEN_LAYER, i))
    }

    pub fn pos(&self, i: usize) -> Option<&str> {
        self.sequence.tag(POS_LAYER, i)
    }

    pub fn chunk(&self, i: usize) -> Option<&str> {
        self.sequence.tag(CHUNK_LAYER, i)
    }

    pub fn tokens_in(&self, interval: Interval) -> &[String] {
        self.sequence
            .tags_in(TOKEN_LAYER, interval)
            .unwrap_or(&[])
    }

    pub fn pos_tags_in(&self, interval: Interval) -> &[String] {
        self.sequence.tags_in(POS_LAYER, interval).unwrap_or(&[])
    }

    pub fn chunk_tags_in(&self, interval: Interval) -> &[String] {
        self.sequence
            .tags_in(CHUNK_LAYER, interval)
            .unwrap_or(&[])
    }

    /// Space-joined tokens covered by `interval`
    pub fn text_of(&self, interval: Interval) -> String {
        self.tokens_in(interval).join(" ")
    }

    /// Noun-phrase chunks in start order
    pub fn noun_phrases(&self) -> Vec<Interval> {
        self.sequence.spans_of_type(CHUNK_LAYER, NOUN_PHRASE)
    }

    /// Whole sentence as space-joined tokens
    pub fn text(&self) -> String {
        self.tokens().join(" ")
    }
}

impl AsRef<LayeredSequence> for AnnotatedSentence {
    fn as_ref(&self) -> &LayeredSequence {
        &self.sequence
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mayor_sentence() -> AnnotatedSentence {
        AnnotatedSentence::from_lines(
            "Mike is the mayor of Seattle .",
            "NNP VBZ DT NN IN NNP .",
            "B-NP O B-NP I-NP O B-NP O",
        )
        .unwrap()
    }

    #[test]
    fn test_canonical_layers() {
        let sentence = mayor_sentence();
        assert_eq!(sentence.len(), 7);
        assert_eq!(sentence.token(0), Some("Mike"));
        assert_eq!(sentence.normalized(0), Some("mike"));
        assert_eq!(sentence.pos(1), Some("VBZ"));
        assert_eq!(sentence.chunk(3), Some("I-NP"));
        assert!(sentence.sequence().is_span_layer(CHUNK_LAYER));
    }

    #[test]
    fn test_noun_phrases() {
        let sentence = mayor_sentence();
        assert_eq!(
            sentence.noun_phrases(),
            vec![Interval::new(0, 1), Interval::new(2, 2), Interval::new(5, 1)]
        );
        assert_eq!(sentence.text_of(Interval::new(2, 2)), "the mayor");
    }

    #[test]
    fn test_mismatched_layers_rejected() {
        let result = AnnotatedSentence::from_lines("a b", "DT", "O O");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_sequence_requires_canonical_layers() {
        let mut seq = LayeredSequence::new(1);
        seq.add_layer(TOKEN_LAYER, ["x"]).unwrap();
        assert!(AnnotatedSentence::from_sequence(seq).is_err());
    }
}
