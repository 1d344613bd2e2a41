use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::collection::{IndexType, MetricType};
use super::document::FieldNames;
use super::search::OutputFormat;
use crate::error::{ChunkError, ConfigError, ConfigurationError, ValidationError};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:19530";
pub const DEFAULT_DATABASE: &str = "default";
pub const MAX_CHUNK_SIZE: usize = 5000;

pub const ENV_ENDPOINT: &str = "ZRAG_ENDPOINT";
pub const ENV_API_KEY: &str = "ZRAG_API_KEY";
pub const ENV_DATABASE: &str = "ZRAG_DATABASE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub fields: FieldNames,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub collection: CollectionDefaults,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("zrag").join("config.toml"))
    }

    /// Load the user config file (if any), then apply `.env` and environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Override connection settings from the environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.is_empty()) {
            self.connection.endpoint = endpoint;
        }
        if let Some(api_key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.connection.api_key = Some(api_key);
        }
        if let Some(database) = lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            self.connection.database = database;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if !(0.0..=1.0).contains(&self.search.similarity_threshold) {
            return Err(ConfigError::ValidationError(
                "similarity_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            database: default_database(),
            timeout_secs: default_timeout(),
        }
    }
}

/// How text is split when building chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    Sentences,
    Paragraphs,
    Characters,
}

impl std::str::FromStr for SplitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sentences" => Ok(SplitStrategy::Sentences),
            "paragraphs" => Ok(SplitStrategy::Paragraphs),
            "characters" => Ok(SplitStrategy::Characters),
            _ => Err(format!("unknown split strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitStrategy::Sentences => write!(f, "sentences"),
            SplitStrategy::Paragraphs => write!(f, "paragraphs"),
            SplitStrategy::Characters => write!(f, "characters"),
        }
    }
}

/// What to do with a document whose every chunk falls below `min_chunk_size`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortDocumentPolicy {
    /// Emit no chunks for the document.
    #[default]
    Drop,
    /// Emit the whole trimmed text as a single chunk.
    Keep,
}

impl std::str::FromStr for ShortDocumentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(ShortDocumentPolicy::Drop),
            "keep" => Ok(ShortDocumentPolicy::Keep),
            _ => Err(format!("unknown short document policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters repeated between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks shorter than this (after trimming) are dropped
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// `None` snaps chunk ends to sentence or line boundaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_strategy: Option<SplitStrategy>,

    #[serde(default = "default_true")]
    pub clean_text: bool,

    #[serde(default)]
    pub strict_clean: bool,

    #[serde(default = "default_true")]
    pub remove_html: bool,

    #[serde(default)]
    pub short_document: ShortDocumentPolicy,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_min_chunk_size() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
            split_strategy: None,
            clean_text: true,
            strict_clean: false,
            remove_html: true,
            short_document: ShortDocumentPolicy::Drop,
        }
    }
}

impl ChunkingConfig {
    /// Reject sizes that would make splitting degenerate.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ValidationError::InvalidValue(format!(
                "chunk size must be between 1 and {}, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            ))
            .into());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigurationError::OverlapTooLarge {
                overlap: self.chunk_overlap,
                chunk_size: self.chunk_size,
            }
            .into());
        }
        if self.min_chunk_size >= self.chunk_size {
            return Err(ConfigurationError::MinChunkTooLarge {
                min_chunk_size: self.min_chunk_size,
                chunk_size: self.chunk_size,
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    #[serde(default = "default_query_limit")]
    pub query_limit: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_max_results() -> u32 {
    5
}

fn default_top_k() -> u32 {
    10
}

fn default_similarity_threshold() -> f32 {
    0.7
}

fn default_query_limit() -> u32 {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            query_limit: default_query_limit(),
            default_format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDefaults {
    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default)]
    pub metric_type: MetricType,

    #[serde(default)]
    pub index_type: IndexType,
}

fn default_dimension() -> u32 {
    1536
}

impl Default for CollectionDefaults {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            metric_type: MetricType::default(),
            index_type: IndexType::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.connection.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.connection.database, DEFAULT_DATABASE);
        assert!(config.connection.api_key.is_none());
        assert_eq!(config.collection.dimension, 1536);
    }

    #[test]
    fn test_chunking_config_default() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.min_chunk_size, 50);
        assert!(config.split_strategy.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_below_chunk_size() {
        let config = ChunkingConfig {
            chunk_size: 500,
            chunk_overlap: 500,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ChunkError::Configuration(ConfigurationError::OverlapTooLarge {
                overlap: 500,
                chunk_size: 500,
            }))
        );
    }

    #[test]
    fn test_min_chunk_must_be_below_chunk_size() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 10,
            min_chunk_size: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ChunkError::Configuration(
                ConfigurationError::MinChunkTooLarge { .. }
            ))
        ));
    }

    #[test]
    fn test_zero_chunk_size_is_validation_error() {
        let config = ChunkingConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            min_chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ChunkError::Validation(_))));
    }

    #[test]
    fn test_split_strategy_parse() {
        assert_eq!(
            "Sentences".parse::<SplitStrategy>().unwrap(),
            SplitStrategy::Sentences
        );
        assert_eq!(
            "characters".parse::<SplitStrategy>().unwrap(),
            SplitStrategy::Characters
        );
        assert!("words".parse::<SplitStrategy>().is_err());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[connection]
endpoint = "https://in03-example.zillizcloud.com"
database = "docs"

[chunking]
chunk_size = 800
chunk_overlap = 100
split_strategy = "paragraphs"
short_document = "keep"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.connection.endpoint,
            "https://in03-example.zillizcloud.com"
        );
        assert_eq!(config.connection.database, "docs");
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.min_chunk_size, 50);
        assert_eq!(
            config.chunking.split_strategy,
            Some(SplitStrategy::Paragraphs)
        );
        assert_eq!(config.chunking.short_document, ShortDocumentPolicy::Keep);
    }

    #[test]
    fn test_load_from_rejects_invalid_chunking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 100\nchunk_overlap = 150\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.connection.database = "kb".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.connection.database, "kb");
    }

    #[test]
    fn test_apply_env_overrides_connection() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "https://cluster.example.com"),
            (ENV_API_KEY, "secret"),
            (ENV_DATABASE, ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.connection.endpoint, "https://cluster.example.com");
        assert_eq!(config.connection.api_key.as_deref(), Some("secret"));
        assert_eq!(config.connection.database, DEFAULT_DATABASE);
    }
}
