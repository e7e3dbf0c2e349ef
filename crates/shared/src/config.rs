//! Application configuration management.

use serde::Deserialize;

use crate::types::ChannelId;

pub use ::config::ConfigError;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Channel (remote storage backend) configuration.
    pub channel: ChannelConfig,
    /// Chunking and batching limits.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Base URL of the channel REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Bot token used to authenticate against the API.
    pub bot_token: String,
    /// Single fixed destination for all chunk traffic.
    pub channel_id: ChannelId,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How many times a rate-limited request is retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Chunking and batching limits applied to every stored object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Maximum bytes per chunk.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Maximum chunks (attachments) sent in a single message.
    #[serde(default = "default_max_attachments")]
    pub max_attachments_per_message: usize,
    /// Maximum total attachment bytes accepted in one message.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

fn default_max_chunk_size() -> usize {
    StorageConfig::DEFAULT_MAX_CHUNK_SIZE
}

fn default_max_attachments() -> usize {
    StorageConfig::DEFAULT_MAX_ATTACHMENTS
}

fn default_max_message_size() -> usize {
    StorageConfig::DEFAULT_MAX_MESSAGE_SIZE
}

impl StorageConfig {
    /// Default chunk size: 8 MiB.
    pub const DEFAULT_MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024;
    /// Default attachments per message.
    pub const DEFAULT_MAX_ATTACHMENTS: usize = 10;
    /// Default message size: room for a full batch of full chunks.
    pub const DEFAULT_MAX_MESSAGE_SIZE: usize =
        Self::DEFAULT_MAX_CHUNK_SIZE * Self::DEFAULT_MAX_ATTACHMENTS;

    /// Set maximum chunk size.
    #[must_use]
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Set maximum attachments per message.
    #[must_use]
    pub fn with_max_attachments_per_message(mut self, count: usize) -> Self {
        self.max_attachments_per_message = count;
        self
    }

    /// Set maximum message size.
    #[must_use]
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Number of chunks packed into one message.
    ///
    /// Bounded by both the attachment count and the message size limit, never below one.
    #[must_use]
    pub fn batch_width(&self) -> usize {
        let by_size = self
            .max_message_size
            .checked_div(self.max_chunk_size)
            .unwrap_or(1);
        self.max_attachments_per_message.min(by_size).max(1)
    }

    /// Check the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is zero or a chunk cannot fit in a message.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 {
            return Err(ConfigError::Message(
                "storage.max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.max_attachments_per_message == 0 {
            return Err(ConfigError::Message(
                "storage.max_attachments_per_message must be greater than zero".to_string(),
            ));
        }
        if self.max_chunk_size > self.max_message_size {
            return Err(ConfigError::Message(format!(
                "storage.max_chunk_size ({}) exceeds storage.max_message_size ({})",
                self.max_chunk_size, self.max_message_size
            )));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: Self::DEFAULT_MAX_CHUNK_SIZE,
            max_attachments_per_message: Self::DEFAULT_MAX_ATTACHMENTS,
            max_message_size: Self::DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Metadata catalog configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Path of the JSON catalog file.
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

fn default_catalog_path() -> String {
    "cordstore-catalog.json".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = ::config::Config::builder()
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                ::config::Environment::with_prefix("CORDSTORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.storage.validate()?;
        Ok(app)
    }
}
