//! Assembles the standard relation-first extractor from configuration

use ore_core::{ExtractorConfig, OreError, Result};

use crate::argument::{NounPhraseArgumentExtractor, Side};
use crate::confidence::{ConfidenceFunction, ScoringMapper};
use crate::pipeline::Extractor;
use crate::relation::{relation_candidates, relation_mappers, RelationDictionary};
use crate::relation_first::RelationFirstExtractor;

/// Builder for the standard pipeline
pub struct ExtractorBuilder {
    config: ExtractorConfig,
    dictionary: Option<RelationDictionary>,
    confidence: Option<Box<dyn ConfidenceFunction>>,
}

impl ExtractorBuilder {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            dictionary: None,
            confidence: None,
        }
    }

    /// Build straight from configuration, loading the relation dictionary
    /// from disk when the lexical constraint is on
    pub fn from_config(config: &ExtractorConfig) -> Result<RelationFirstExtractor> {
        Self::new(config.clone()).build()
    }

    /// Use an in-memory dictionary instead of `relation_dictionary`
    pub fn with_dictionary(mut self, dictionary: RelationDictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Score extractions and drop those below `confidence_threshold`
    pub fn with_confidence(mut self, function: impl ConfidenceFunction + 'static) -> Self {
        self.confidence = Some(Box::new(function));
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn build(self) -> Result<RelationFirstExtractor> {
        let config = self.config;

        let dictionary = if config.lexical_constraint {
            let dictionary = match (self.dictionary, &config.relation_dictionary) {
                (Some(dictionary), _) => dictionary,
                (None, Some(path)) => RelationDictionary::from_path(path)?,
                (None, None) => {
                    return Err(OreError::Config(
                        "lexical_constraint requires relation_dictionary".to_string(),
                    ))
                }
            };
            Some((dictionary, config.min_relation_frequency))
        } else {
            None
        };

        let relations = relation_candidates(config.use_long_relations)?
            .with_mappers(relation_mappers(dictionary, config.merge_overlapping));

        let mut extractor = RelationFirstExtractor::new(
            relations,
            NounPhraseArgumentExtractor::standard(Side::Left, config.allow_pronoun_arguments),
            NounPhraseArgumentExtractor::standard(Side::Right, config.allow_pronoun_arguments),
        )
        .with_unary(config.allow_unary);

        if let Some(function) = self.confidence {
            extractor
                .mappers_mut()
                .push(ScoringMapper::boxed(function, config.confidence_threshold));
        }

        for stage in &config.disabled_stages {
            if !extractor.set_stage_enabled(stage, false) {
                tracing::warn!(stage = %stage, "unknown stage in disabled_stages");
            }
        }

        tracing::debug!(
            stages = ?extractor.stage_names(),
            allow_unary = config.allow_unary,
            "built relation-first extractor"
        );
        Ok(extractor)
    }
}

// ============================================================================
// Tests
// ============================================================================
