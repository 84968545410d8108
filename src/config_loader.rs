use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::models::types::{CodewordId, SearchStrategy, SplitStrategy};
use crate::quantization::{validate_weights, QuantizationError};

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub quantizer: QuantizerConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct QuantizerConfig {
    pub dims: usize,
    pub codebook_size: usize,
    /// Per-dimension weights; empty means every dimension weighs 1.0.
    #[serde(default)]
    pub weights: Vec<f64>,
    #[serde(default)]
    pub first_id: CodewordId,
    #[serde(default)]
    pub split_strategy: SplitStrategy,
    #[serde(default)]
    pub search_strategy: SearchStrategy,
    #[serde(default)]
    pub refinement_passes: usize,
}

impl QuantizerConfig {
    /// Unit weights, ids from 0, default strategies and no refinement.
    pub fn new(dims: usize) -> Self {
        QuantizerConfig {
            dims,
            codebook_size: 1,
            weights: Vec::new(),
            first_id: 0,
            split_strategy: SplitStrategy::default(),
            search_strategy: SearchStrategy::default(),
            refinement_passes: 0,
        }
    }

    pub fn resolved_weights(&self) -> Vec<f64> {
        if self.weights.is_empty() {
            vec![1.0; self.dims]
        } else {
            self.weights.clone()
        }
    }

    pub fn validate(&self) -> Result<(), QuantizationError> {
        if self.dims == 0 {
            return Err(QuantizationError::InvalidDimensions(
                "dims must be at least 1".to_string(),
            ));
        }
        if self.codebook_size == 0 {
            return Err(QuantizationError::InvalidCodebookSize(0));
        }
        // Codeword ids and tree node handles are both u32.
        let last_id = self.first_id as u64 + self.codebook_size as u64 - 1;
        if last_id > CodewordId::MAX as u64 || self.codebook_size > (u32::MAX / 2) as usize {
            return Err(QuantizationError::InvalidCodebookSize(self.codebook_size));
        }
        validate_weights(&self.resolved_weights(), self.dims)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(QuantizationError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config file contents: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid quantizer config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<QuantizationError> for ConfigError {
    fn from(e: QuantizationError) -> Self {
        ConfigError::Invalid(e)
    }
}

pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(contents)?;
    config.quantizer.validate()?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let config_contents = fs::read_to_string(path)?;
    parse_config(&config_contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[quantizer]
dims = 3
codebook_size = 16
weights = [1.0, 0.5, 2.0]
first_id = 10
split_strategy = "mean_cut"
search_strategy = "upper_bound_pruning"
refinement_passes = 2
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        let q = config.quantizer;
        assert_eq!(q.dims, 3);
        assert_eq!(q.codebook_size, 16);
        assert_eq!(q.resolved_weights(), vec![1.0, 0.5, 2.0]);
        assert_eq!(q.first_id, 10);
        assert_eq!(q.split_strategy, SplitStrategy::MeanCut);
        assert_eq!(q.search_strategy, SearchStrategy::UpperBoundPruning);
        assert_eq!(q.refinement_passes, 2);
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("[quantizer]\ndims = 2\ncodebook_size = 4\n").unwrap();
        assert_eq!(
            config.quantizer,
            QuantizerConfig {
                codebook_size: 4,
                ..QuantizerConfig::new(2)
            }
        );
        assert_eq!(config.quantizer.resolved_weights(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            parse_config("[quantizer]\ndims = 0\ncodebook_size = 4\n"),
            Err(ConfigError::Invalid(QuantizationError::InvalidDimensions(_)))
        ));
        assert!(matches!(
            parse_config("[quantizer]\ndims = 2\ncodebook_size = 4\nweights = [1.0]\n"),
            Err(ConfigError::Invalid(QuantizationError::InvalidWeights(_)))
        ));
        assert!(matches!(
            parse_config("[quantizer]\ndims = 2\ncodebook_size = 2\nfirst_id = 4294967295\n"),
            Err(ConfigError::Invalid(QuantizationError::InvalidCodebookSize(2)))
        ));
        assert!(matches!(
            parse_config("[quantizer]\ndims = 2\ncodebook_size = 3000000000\n"),
            Err(ConfigError::Invalid(QuantizationError::InvalidCodebookSize(3_000_000_000)))
        ));
        assert!(matches!(
            parse_config("[quantizer]\ndims = 2\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
