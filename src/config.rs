//! Configuration management for Parley
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Parley
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote model providers
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Conversation memory (vector store) settings
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Reminder scheduler settings
    #[serde(default)]
    pub reminders: RemindersConfig,
    /// Attachment handling settings
    #[serde(default)]
    pub attachments: AttachmentsConfig,
    /// Local storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Google Gemini language model settings
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Hugging Face inference settings (embeddings and images)
    #[serde(default)]
    pub huggingface: HuggingFaceConfig,
}

/// Gemini language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; usually supplied through `PARLEY_GEMINI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for chat, file analysis and reminder parsing
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL (overridable for tests and local mocks)
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            api_base: default_gemini_api_base(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

/// Hugging Face inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// API token; usually supplied through `PARLEY_HF_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Inference API base URL
    #[serde(default = "default_hf_api_base")]
    pub api_base: String,

    /// Feature-extraction model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Text-to-image model
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

fn default_hf_api_base() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_image_model() -> String {
    "stabilityai/stable-diffusion-xl-base-1.0".to_string()
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_hf_api_base(),
            embedding_model: default_embedding_model(),
            image_model: default_image_model(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum number of stored exchanges (oldest evicted first)
    #[serde(default = "default_memory_capacity")]
    pub capacity: usize,

    /// Number of similar exchanges injected as context
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,

    /// Dimensionality produced by the embedding model
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
}

/// Upper bound on stored exchanges
pub const MAX_MEMORY_CAPACITY: usize = 100;

fn default_memory_capacity() -> usize {
    MAX_MEMORY_CAPACITY
}

fn default_context_limit() -> usize {
    3
}

fn default_embedding_dimension() -> usize {
    384
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_memory_capacity(),
            context_limit: default_context_limit(),
            embedding_dimension: default_embedding_dimension(),
        }
    }
}

/// Reminder scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Polling interval for due reminders (seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Ring the terminal bell when a reminder fires
    #[serde(default = "default_audible")]
    pub audible: bool,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_audible() -> bool {
    true
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            audible: default_audible(),
        }
    }
}

/// Attachment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentsConfig {
    /// Maximum size of a single attachment (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
}

fn default_max_file_size() -> u64 {
    10_485_760 // 10 MB
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the embedded database directory.
    ///
    /// When unset the platform data directory is used.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ParleyError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ParleyError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(key) = std::env::var("PARLEY_GEMINI_API_KEY") {
            self.providers.gemini.api_key = Some(key);
        }

        if let Ok(model) = std::env::var("PARLEY_GEMINI_MODEL") {
            self.providers.gemini.model = model;
        }

        if let Ok(base) = std::env::var("PARLEY_GEMINI_API_BASE") {
            self.providers.gemini.api_base = base;
        }

        if let Ok(key) = std::env::var("PARLEY_HF_API_KEY") {
            self.providers.huggingface.api_key = Some(key);
        }

        if let Ok(base) = std::env::var("PARLEY_HF_API_BASE") {
            self.providers.huggingface.api_base = base;
        }

        if let Ok(model) = std::env::var("PARLEY_EMBEDDING_MODEL") {
            self.providers.huggingface.embedding_model = model;
        }

        if let Ok(dimension) = std::env::var("PARLEY_EMBEDDING_DIMENSION") {
            match dimension.parse() {
                Ok(value) => self.memory.embedding_dimension = value,
                Err(_) => tracing::warn!("Invalid PARLEY_EMBEDDING_DIMENSION: {}", dimension),
            }
        }

        if let Ok(model) = std::env::var("PARLEY_IMAGE_MODEL") {
            self.providers.huggingface.image_model = model;
        }

        if let Ok(capacity) = std::env::var("PARLEY_MEMORY_CAPACITY") {
            match capacity.parse() {
                Ok(value) => self.memory.capacity = value,
                Err(_) => tracing::warn!("Invalid PARLEY_MEMORY_CAPACITY: {}", capacity),
            }
        }

        if let Ok(limit) = std::env::var("PARLEY_CONTEXT_LIMIT") {
            match limit.parse() {
                Ok(value) => self.memory.context_limit = value,
                Err(_) => tracing::warn!("Invalid PARLEY_CONTEXT_LIMIT: {}", limit),
            }
        }

        if let Ok(interval) = std::env::var("PARLEY_REMINDER_INTERVAL_SECONDS") {
            match interval.parse() {
                Ok(value) => {
                    self.reminders.poll_interval_seconds = value;
                    tracing::debug!(
                        interval = value,
                        "Env override: PARLEY_REMINDER_INTERVAL_SECONDS"
                    );
                }
                Err(_) => {
                    tracing::warn!("Invalid PARLEY_REMINDER_INTERVAL_SECONDS: {}", interval)
                }
            }
        }

        if let Ok(path) = std::env::var("PARLEY_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(path) = &cli.storage_path {
            tracing::info!("Using storage override from CLI: {}", path.display());
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range or an API base is not a URL
    pub fn validate(&self) -> Result<()> {
        if self.providers.gemini.model.is_empty() {
            return Err(ParleyError::Config("gemini.model cannot be empty".to_string()).into());
        }

        for (name, base) in [
            ("gemini.api_base", &self.providers.gemini.api_base),
            ("huggingface.api_base", &self.providers.huggingface.api_base),
        ] {
            url::Url::parse(base).map_err(|e| {
                ParleyError::Config(format!("{} is not a valid URL ({}): {}", name, base, e))
            })?;
        }

        if self.memory.capacity == 0 || self.memory.capacity > MAX_MEMORY_CAPACITY {
            return Err(ParleyError::Config(format!(
                "memory.capacity must be between 1 and {}",
                MAX_MEMORY_CAPACITY
            ))
            .into());
        }

        if self.memory.context_limit == 0 {
            return Err(ParleyError::Config(
                "memory.context_limit must be greater than 0".to_string(),
            )
            .into());
        }

        if self.memory.embedding_dimension == 0 {
            return Err(ParleyError::Config(
                "memory.embedding_dimension must be greater than 0".to_string(),
            )
            .into());
        }

        if self.reminders.poll_interval_seconds == 0 {
            return Err(ParleyError::Config(
                "reminders.poll_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.attachments.max_file_size_bytes == 0 {
            return Err(ParleyError::Config(
                "attachments.max_file_size_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
