//! Configuration management for the virtual TA
//!
//! Loads the TOML configuration, applies `VTA_SECTION__KEY` environment
//! overrides and validates the result before anything else starts.

use crate::error::{Result, TaError};
use crate::qa::Link;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Supported configuration schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "VTA_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub data: DataConfig,
    pub embedding: EmbeddingConfig,
    pub extractor: ExtractorConfig,
    pub retrieval: RetrievalConfig,
    pub timeouts: TimeoutsConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub overrides: Vec<OverrideRuleConfig>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Source documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Structured course content (paragraphs, lists, tables, links)
    pub course_file: PathBuf,
    /// Forum topics with their posts
    pub forum_file: PathBuf,
    /// Maximum characters of a citation label before it is cut with an ellipsis
    pub snippet_chars: usize,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
}

/// Answer extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// "cross-encoder" or "lexical"
    pub kind: String,
    /// Cross-encoder model name, ignored by the lexical extractor
    pub model: String,
    /// Spans scoring below this confidence yield an empty answer
    pub min_confidence: f32,
    /// Longest span returned as an answer
    pub max_span_chars: usize,
}

/// Retrieval and context assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Nearest documents fetched per question
    pub top_k: usize,
    /// Leading results concatenated into the answer context
    pub context_docs: usize,
    /// Citations returned with each answer
    pub max_links: usize,
    /// Separator placed between context documents
    pub context_separator: String,
    /// Embedding/extraction calls allowed to run at once
    pub max_concurrent_inference: usize,
}

/// Time budgets, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    pub build_secs: u64,
    pub embed_secs: u64,
    pub extract_secs: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

/// A fixed answer returned when every trigger appears in the lowercased question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRuleConfig {
    pub name: String,
    pub triggers: Vec<String>,
    pub answer: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TaError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load the file at `path`, or defaults (with env overrides) when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        tracing::warn!(
            "Config file {} not found, using defaults. Run 'virtual-ta config init' to create one.",
            path.display()
        );
        let mut config = Self::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| TaError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: VTA_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(std::env::vars());
    }

    /// Apply overrides from arbitrary `(name, value)` pairs; names without the prefix are ignored
    pub fn apply_overrides_from<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "DATA__COURSE_FILE" => {
                self.data.course_file = PathBuf::from(value);
            }
            "DATA__FORUM_FILE" => {
                self.data.forum_file = PathBuf::from(value);
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "EXTRACTOR__KIND" => {
                self.extractor.kind = value.to_string();
            }
            "EXTRACTOR__MODEL" => {
                self.extractor.model = value.to_string();
            }
            "RETRIEVAL__TOP_K" => {
                self.retrieval.top_k = parse_value(path, value)?;
            }
            "RETRIEVAL__CONTEXT_DOCS" => {
                self.retrieval.context_docs = parse_value(path, value)?;
            }
            "RETRIEVAL__MAX_LINKS" => {
                self.retrieval.max_links = parse_value(path, value)?;
            }
            "SERVER__HOST" => {
                self.server.host = value.to_string();
            }
            "SERVER__PORT" => {
                self.server.port = parse_value(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TaError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("virtual-ta").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| TaError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");

        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            data: DataConfig {
                course_file: data_dir.join("course_content_structured.json"),
                forum_file: data_dir.join("discourse_posts.json"),
                snippet_chars: 200,
            },
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                batch_size: 32,
            },
            extractor: ExtractorConfig {
                kind: "cross-encoder".to_string(),
                model: "bge-reranker-base".to_string(),
                min_confidence: 0.1,
                max_span_chars: 400,
            },
            retrieval: RetrievalConfig {
                top_k: 5,
                context_docs: 3,
                max_links: 2,
                context_separator: "\n\n---\n\n".to_string(),
                max_concurrent_inference: 2,
            },
            timeouts: TimeoutsConfig {
                build_secs: 900,
                embed_secs: 30,
                extract_secs: 60,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                request_timeout_secs: 120,
            },
            overrides: Vec::new(),
        }
    }
}
