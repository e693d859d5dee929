use serde::{Deserialize, Serialize};

/// Main configuration structure for Larder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Corpus database (PostgreSQL + pgvector)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding gateway
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Object detection collaborator
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Language-model completion backends
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Similarity search settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation history
    #[serde(default)]
    pub session: SessionConfig,

    /// HTTP chat API
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    #[serde(default = "default_database_host")]
    pub host: String,

    #[serde(default = "default_database_port")]
    pub port: u16,

    /// Database name
    #[serde(default = "default_database_name")]
    pub name: String,

    #[serde(default = "default_database_user")]
    pub user: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Table holding the recipes themselves
    #[serde(default = "default_records_table")]
    pub records_table: String,

    /// Table holding `(id, embedding)` rows
    #[serde(default = "default_embeddings_table")]
    pub embeddings_table: String,
}

fn default_database_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_database_port() -> u16 {
    5432
}

fn default_database_name() -> String {
    "recipes".to_string()
}

fn default_database_user() -> String {
    "postgres".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_records_table() -> String {
    "recipes".to_string()
}

fn default_embeddings_table() -> String {
    "recipes_embeddings".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_database_host(),
            port: default_database_port(),
            name: default_database_name(),
            user: default_database_user(),
            password: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            records_table: default_records_table(),
            embeddings_table: default_embeddings_table(),
        }
    }
}

/// Embedding gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Provider: openai (any OpenAI-compatible server) or fastembed
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected vector length; must match the embeddings table column
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_batch_size")]
    pub max_batch_size: usize,
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

fn default_embedding_base_url() -> String {
    "http://127.0.0.1:8080/v1".to_string()
}

fn default_embedding_model() -> String {
    "BAAI/bge-base-en-v1.5".to_string()
}

const fn default_embedding_dimension() -> usize {
    768
}

const fn default_embedding_timeout_secs() -> u64 {
    30
}

const fn default_embedding_batch_size() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key: None,
            timeout_secs: default_embedding_timeout_secs(),
            max_batch_size: default_embedding_batch_size(),
        }
    }
}

/// Object detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DetectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the detection inference server
    #[serde(default = "default_detection_url")]
    pub url: String,

    /// Where `class_counts.json` and the annotated image are written
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Detections below this confidence are ignored
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    #[serde(default = "default_detection_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_detection_url() -> String {
    "http://127.0.0.1:8500".to_string()
}

fn default_artifact_dir() -> String {
    ".larder/artifacts".to_string()
}

const fn default_min_confidence() -> f32 {
    0.25
}

const fn default_detection_timeout_secs() -> u64 {
    120
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_detection_url(),
            artifact_dir: default_artifact_dir(),
            min_confidence: default_min_confidence(),
            timeout_secs: default_detection_timeout_secs(),
        }
    }
}

/// Completion backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompletionConfig {
    /// Backend: remote, local or mock
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Ask the backend to stream its answer
    #[serde(default)]
    pub stream: bool,

    /// Whole-request timeout; large local models can be slow
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Outgoing request rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    #[serde(default)]
    pub remote: RemoteCompletionConfig,

    #[serde(default)]
    pub local: LocalCompletionConfig,
}

fn default_backend() -> String {
    "remote".to_string()
}

const fn default_completion_timeout_secs() -> u64 {
    1800
}

fn default_system_prompt() -> String {
    "You are a helpful assistant".to_string()
}

const fn default_requests_per_second() -> f64 {
    5.0
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            stream: false,
            timeout_secs: default_completion_timeout_secs(),
            system_prompt: default_system_prompt(),
            requests_per_second: default_requests_per_second(),
            remote: RemoteCompletionConfig::default(),
            local: LocalCompletionConfig::default(),
        }
    }
}

/// Hosted OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoteCompletionConfig {
    /// Full URL of the chat completions endpoint
    #[serde(default = "default_remote_api_url")]
    pub api_url: String,

    /// Bearer token (SCW_SECRET_KEY is honored as well)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_remote_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default)]
    pub presence_penalty: f32,
}

fn default_remote_api_url() -> String {
    "https://api.scaleway.ai/v1/chat/completions".to_string()
}

fn default_remote_model() -> String {
    "llama-3.1-8b-instruct".to_string()
}

const fn default_max_tokens() -> u32 {
    512
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_top_p() -> f32 {
    0.7
}

impl Default for RemoteCompletionConfig {
    fn default() -> Self {
        Self {
            api_url: default_remote_api_url(),
            api_key: None,
            model: default_remote_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            presence_penalty: 0.0,
        }
    }
}

/// Locally reachable chat endpoint (e.g. an Ollama-style server)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LocalCompletionConfig {
    #[serde(default = "default_local_url")]
    pub url: String,

    #[serde(default = "default_local_model")]
    pub model: String,
}

fn default_local_url() -> String {
    "http://127.0.0.1:11434/api/chat".to_string()
}

fn default_local_model() -> String {
    "llama3.1".to_string()
}

impl Default for LocalCompletionConfig {
    fn default() -> Self {
        Self {
            url: default_local_url(),
            model: default_local_model(),
        }
    }
}

/// Similarity search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Number of recipes retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

const fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

/// Conversation history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Turns of history sent with each request
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    /// Turns kept per session before the oldest are dropped
    #[serde(default = "default_max_stored_turns")]
    pub max_stored_turns: usize,
}

const fn default_history_turns() -> usize {
    5
}

const fn default_max_stored_turns() -> usize {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            history_turns: default_history_turns(),
            max_stored_turns: default_max_stored_turns(),
        }
    }
}

/// HTTP chat API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Largest accepted request body. Images travel base64-encoded inside it.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

const fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_server_port() -> u16 {
    7860
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            enable_cors: true,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: true,
            rotation: default_rotation(),
        }
    }
}
