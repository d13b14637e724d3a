//! ORE Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with defaults suitable for extracting from tagged English text.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction pipeline configuration
    pub extractor: ExtractorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Output configuration
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self::read_file(path.into())?;
        config.validate()?;
        Ok(config)
    }

    /// Load an optional TOML file, then apply environment overrides.
    /// Validation runs once on the merged result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path.to_path_buf())?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        self.validate()?;
        Ok(self)
    }

    fn read_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Overwrite every setting whose variable `lookup` returns, leaving the
    /// rest untouched. Does not validate.
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ORE_ALLOW_UNARY") {
            self.extractor.allow_unary = parse_bool("ORE_ALLOW_UNARY", &value)?;
        }
        if let Some(value) = lookup("ORE_MERGE_OVERLAPPING") {
            self.extractor.merge_overlapping = parse_bool("ORE_MERGE_OVERLAPPING", &value)?;
        }
        if let Some(value) = lookup("ORE_LEXICAL_CONSTRAINT") {
            self.extractor.lexical_constraint = parse_bool("ORE_LEXICAL_CONSTRAINT", &value)?;
        }
        if let Some(path) = lookup("ORE_RELATION_DICTIONARY") {
            self.extractor.relation_dictionary = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("ORE_MIN_RELATION_FREQUENCY") {
            self.extractor.min_relation_frequency =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "ORE_MIN_RELATION_FREQUENCY".to_string(),
                    value,
                })?;
        }
        if let Some(value) = lookup("ORE_CONFIDENCE_THRESHOLD") {
            self.extractor.confidence_threshold =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "ORE_CONFIDENCE_THRESHOLD".to_string(),
                    value,
                })?;
        }
        if let Some(format) = lookup("ORE_OUTPUT_FORMAT") {
            self.output.format = format.parse()?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.extractor.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                key: "extractor.confidence_threshold".to_string(),
                value: threshold.to_string(),
            });
        }
        if self.extractor.lexical_constraint && self.extractor.relation_dictionary.is_none() {
            return Err(ConfigError::MissingRequired(
                "extractor.relation_dictionary (required by lexical_constraint)".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Extraction pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Emit extractions with a single real argument
    pub allow_unary: bool,

    /// Merge overlapping relation candidates into one
    pub merge_overlapping: bool,

    /// Use the long `V W* P` relation pattern in addition to `V P?`
    pub use_long_relations: bool,

    /// Accept personal pronouns as arguments
    pub allow_pronoun_arguments: bool,

    /// Require relations to appear in the relation dictionary
    pub lexical_constraint: bool,

    /// Tab-separated `phrase<TAB>count` dictionary of known relations
    pub relation_dictionary: Option<PathBuf>,

    /// Minimum dictionary count for a relation to pass the lexical constraint
    pub min_relation_frequency: usize,

    /// Drop extractions scored below this confidence
    pub confidence_threshold: f64,

    /// Names of mapper stages to disable
    pub disabled_stages: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            allow_unary: false,
            merge_overlapping: true,
            use_long_relations: true,
            allow_pronoun_arguments: true,
            lexical_constraint: false,
            relation_dictionary: None,
            min_relation_frequency: 20,
            confidence_threshold: 0.0,
            disabled_stages: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Output record format
    pub format: OutputFormat,

    /// Append the sentence tokens to each output record
    pub include_sentence: bool,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tsv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "ORE_OUTPUT_FORMAT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.extractor.allow_unary);
        assert!(config.extractor.merge_overlapping);
        assert_eq!(config.extractor.min_relation_frequency, 20);
        assert_eq!(config.output.format, OutputFormat::Tsv);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("tsv".parse::<OutputFormat>().unwrap(), OutputFormat::Tsv);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("K", "yes").unwrap());
        assert!(!parse_bool("K", "0").unwrap());
        assert!(parse_bool("K", "maybe").is_err());
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[extractor]\nallow_unary = true\ndisabled_stages = [\"relation.first-token\"]\n\n[output]\nformat = \"json\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert!(config.extractor.allow_unary);
        assert!(config.extractor.merge_overlapping);
        assert_eq!(config.extractor.disabled_stages, vec!["relation.first-token"]);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("/nonexistent/ore.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = AppConfig::default();
        config.extractor.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_completes_file_before_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[extractor]\nallow_unary = true\nrelation_dictionary = \"relations.tsv\""
        )
        .unwrap();

        let mut config = AppConfig::read_file(file.path().to_path_buf()).unwrap();
        config
            .apply_env(env(&[
                ("ORE_LEXICAL_CONSTRAINT", "true"),
                ("ORE_ALLOW_UNARY", "false"),
            ]))
            .unwrap();
        assert!(config.validate().is_ok());
        assert!(config.extractor.lexical_constraint);
        assert!(!config.extractor.allow_unary);
        assert_eq!(
            config.extractor.relation_dictionary,
            Some(PathBuf::from("relations.tsv"))
        );
    }

    #[test]
    fn test_env_unset_keeps_file_values() {
        let mut config = AppConfig::default();
        config.extractor.merge_overlapping = false;
        config.extractor.min_relation_frequency = 3;
        config.output.format = OutputFormat::Json;

        config.apply_env(env(&[("LOG_LEVEL", "debug")])).unwrap();
        assert!(!config.extractor.merge_overlapping);
        assert_eq!(config.extractor.min_relation_frequency, 3);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_invalid_value() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("ORE_MIN_RELATION_FREQUENCY", "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key, .. } if key == "ORE_MIN_RELATION_FREQUENCY"
        ));
    }

    #[test]
    fn test_read_file_defers_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[extractor]\nlexical_constraint = true").unwrap();

        assert!(AppConfig::read_file(file.path().to_path_buf()).is_ok());
        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_lexical_constraint_needs_dictionary() {
        let mut config = AppConfig::default();
        config.extractor.lexical_constraint = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
