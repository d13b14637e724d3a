//! ORE Core - Sequence, span and configuration types
//!
//! This crate defines the substrate shared by the pattern engine and the
//! extraction pipeline:
//! - Half-open token intervals
//! - Layered sequences (parallel, fixed-length tag layers)
//! - BIO span codec (encode, decode, boundary-preserving slicing)
//! - Annotated sentences (token / POS / chunk layers)
//! - Common error types
//! - Configuration management

pub mod config;
pub mod interval;
pub mod sentence;
pub mod sequence;
pub mod span;

pub use config::{
    AppConfig, ConfigError, ExtractorConfig, LoggingConfig, OutputConfig, OutputFormat,
};
pub use interval::Interval;
pub use sentence::{AnnotatedSentence, SentenceRef};
pub use sequence::LayeredSequence;
pub use span::{BioTag, SpanLayer, TypedSpan};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for ORE operations
#[derive(Error, Debug)]
pub enum OreError {
    #[error("Pattern syntax error in `{pattern}` at {position}: {message}")]
    PatternSyntax {
        pattern: String,
        position: usize,
        message: String,
    },

    #[error("Pattern references undeclared layer: {layer}")]
    UndeclaredLayer { layer: String },

    #[error("Bounds error: {0}")]
    Bounds(String),

    #[error("Layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("Layer {layer} has {actual} tags, expected {expected}")]
    LengthMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed tag `{tag}` in span layer {layer}")]
    MalformedTag { layer: String, tag: String },

    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("Invalid extraction: {0}")]
    InvalidExtraction(String),

    #[error("Confidence scoring failed: {0}")]
    Confidence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for OreError {
    fn from(err: ConfigError) -> Self {
        OreError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OreError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OreError::UndeclaredLayer {
            layer: "pos".to_string(),
        };
        assert_eq!(err.to_string(), "Pattern references undeclared layer: pos");

        let err = OreError::LengthMismatch {
            layer: "chunk".to_string(),
            expected: 5,
            actual: 4,
        };
        assert!(err.to_string().contains("expected 5"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: OreError = ConfigError::MissingRequired("relation_dictionary".to_string()).into();
        assert!(matches!(err, OreError::Config(_)));
        assert!(err.to_string().contains("relation_dictionary"));
    }
}
