use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".heritage-lens";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable selecting the root directory instead of the cwd.
pub const ROOT_ENV_VAR: &str = "HERITAGE_LENS_ROOT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the LanceDB database (relative to .heritage-lens/)
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Path to the keyword index directory (relative to .heritage-lens/)
    #[serde(default = "default_keyword_index_dir")]
    pub keyword_index_dir: String,

    /// Dimension of stored embeddings; must match the embedding provider
    #[serde(default = "default_vector_dimension")]
    pub vector_dimension: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            keyword_index_dir: default_keyword_index_dir(),
            vector_dimension: default_vector_dimension(),
        }
    }
}

fn default_db_path() -> String {
    "artifacts.lance".to_string()
}

fn default_keyword_index_dir() -> String {
    "keyword.index".to_string()
}

fn default_vector_dimension() -> usize {
    768
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX model via fastembed
    #[default]
    FastEmbed,
    /// Hosted OpenAI-compatible embeddings API
    OpenAI,
}

impl std::fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FastEmbed => write!(f, "fastembed"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub provider: EmbeddingBackend,

    /// Local embedding model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Batch size for embedding generation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Hosted model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// API key, or a `${VAR}` reference to an environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    /// Alternative API base URL for compatible endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,

    /// Requested output dimension for hosted models that support shortening
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_dimensions: Option<u32>,

    /// Retries performed by the hosted provider before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::default(),
            model: default_model(),
            batch_size: default_batch_size(),
            openai_model: default_openai_model(),
            openai_api_key: None,
            openai_base_url: None,
            openai_dimensions: None,
            max_retries: default_max_retries(),
        }
    }
}

fn default_model() -> String {
    "nomic-embed-text-v1.5".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_retries() -> usize {
    3
}

/// What to do when only one of the two retrieval paths fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialFailurePolicy {
    /// Any retrieval failure fails the whole search
    #[default]
    Fail,
    /// Continue with the results of the path that succeeded
    Degrade,
}

impl std::fmt::Display for PartialFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Degrade => write!(f, "degrade"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result count used when a request does not specify `k`
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Upper bound for `k`; larger requests are clamped
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Candidate pool requested from the approximate vector index
    #[serde(default = "default_oversample")]
    pub oversample: usize,

    /// Bonus per query keyword found in the title
    #[serde(default = "default_title_bonus")]
    pub title_bonus: f32,

    /// Timeout applied to the embedding call and to each retrieval call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub partial_failure: PartialFailurePolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            max_k: default_max_k(),
            oversample: default_oversample(),
            title_bonus: default_title_bonus(),
            timeout_secs: default_timeout_secs(),
            partial_failure: PartialFailurePolicy::default(),
        }
    }
}

fn default_k() -> usize {
    20
}

fn default_max_k() -> usize {
    100
}

fn default_oversample() -> usize {
    100
}

fn default_title_bonus() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    15
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_http_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8000
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to rotating files
    #[serde(default)]
    pub enabled: bool,

    /// Write logs to stderr
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// File log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory (relative paths are resolved against the root)
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Rotation: minutely, hourly, daily, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: true,
            level: default_log_level(),
            directory: default_log_directory(),
            file_prefix: default_file_prefix(),
            rotation: default_rotation(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(".heritage-lens/logs")
}

fn default_file_prefix() -> String {
    "heritage-lens.log".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Config {
    /// Load configuration from the .heritage-lens directory
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the .heritage-lens directory
    pub fn save(&self, root: &Path) -> Result<()> {
        let config_dir = root.join(CONFIG_DIR);
        let config_path = config_dir.join(CONFIG_FILE);

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Resolve the root directory: `HERITAGE_LENS_ROOT` if set, else the cwd
    pub fn resolve_root() -> PathBuf {
        std::env::var_os(ROOT_ENV_VAR)
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the path to the .heritage-lens directory
    pub fn data_dir(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR)
    }

    /// Get the path to the LanceDB database
    pub fn db_path(&self, root: &Path) -> PathBuf {
        Self::data_dir(root).join(&self.storage.db_path)
    }

    /// Get the path to the keyword index
    pub fn keyword_index_path(&self, root: &Path) -> PathBuf {
        Self::data_dir(root).join(&self.storage.keyword_index_dir)
    }

    /// Check if the data directory exists under the given root
    pub fn is_initialized(root: &Path) -> bool {
        Self::data_dir(root).exists()
    }
}
