use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::adapters::completion::BackendRegistry;
use crate::adapters::postgres::connection::validate_identifier;
use crate::domain::models::config::Config;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "larder.yaml";

/// Legacy deployment variables and the config keys they feed.
const LEGACY_ENV: [(&str, &str); 6] = [
    ("SCW_DB_HOST", "database.host"),
    ("SCW_DB_PORT", "database.port"),
    ("SCW_DB_NAME", "database.name"),
    ("SCW_DB_USER", "database.user"),
    ("SCW_DB_PASSWORD", "database.password"),
    ("SCW_SECRET_KEY", "completion.remote.api_key"),
];

const EMBEDDING_PROVIDERS: [&str; 2] = ["openai", "fastembed"];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid top_k: {0}. Must be between 1 and 100")]
    InvalidTopK(usize),

    #[error("Invalid embedding dimension: must be at least 1")]
    InvalidDimension,

    #[error("Database host cannot be empty")]
    EmptyDatabaseHost,

    #[error("Database name cannot be empty")]
    EmptyDatabaseName,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Unknown completion backend: {0}. Must be one of: remote, local, mock")]
    UnknownBackend(String),

    #[error("Unknown embedding provider: {0}. Must be one of: openai, fastembed")]
    UnknownEmbeddingProvider(String),

    #[error("Invalid temperature: {0}. Must be between 0 and 2")]
    InvalidTemperature(f32),

    #[error("Invalid top_p: {0}. Must be between 0 and 1")]
    InvalidTopP(f32),

    #[error("Invalid requests_per_second: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid min_confidence: {0}. Must be between 0 and 1")]
    InvalidMinConfidence(f32),

    #[error("Invalid server.max_body_bytes: must be at least 1")]
    InvalidMaxBodyBytes,

    #[error("history_turns ({0}) cannot exceed max_stored_turns ({1})")]
    HistoryExceedsCapacity(usize, usize),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `path`, or `larder.yaml` in the working directory when present
    /// 3. Legacy `SCW_DB_*` / `SCW_SECRET_KEY` variables
    /// 4. `LARDER_*` environment variables, `__` separating nested keys
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config: Config = Self::figment(path)?
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            Some(path) => Yaml::file(path),
            None => Yaml::file(DEFAULT_CONFIG_FILE),
        };

        Ok(Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(file)
            .merge(legacy_env())
            .merge(Env::prefixed("LARDER_").split("__")))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let top_k = config.retrieval.top_k;
        if top_k == 0 || top_k > 100 {
            return Err(ConfigError::InvalidTopK(top_k));
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigError::InvalidDimension);
        }
        if !EMBEDDING_PROVIDERS.contains(&config.embedding.provider.as_str()) {
            return Err(ConfigError::UnknownEmbeddingProvider(
                config.embedding.provider.clone(),
            ));
        }

        let db = &config.database;
        if db.host.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseHost);
        }
        if db.name.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }
        if db.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(db.max_connections));
        }
        for table in [&db.records_table, &db.embeddings_table] {
            if validate_identifier(table).is_err() {
                return Err(ConfigError::InvalidTableName(table.clone()));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let completion = &config.completion;
        if !BackendRegistry::AVAILABLE.contains(&completion.backend.as_str()) {
            return Err(ConfigError::UnknownBackend(completion.backend.clone()));
        }
        if !(0.0..=2.0).contains(&completion.remote.temperature) {
            return Err(ConfigError::InvalidTemperature(completion.remote.temperature));
        }
        if !(0.0..=1.0).contains(&completion.remote.top_p) {
            return Err(ConfigError::InvalidTopP(completion.remote.top_p));
        }
        if completion.requests_per_second <= 0.0 || completion.requests_per_second.is_nan() {
            return Err(ConfigError::InvalidRateLimit(completion.requests_per_second));
        }

        if !(0.0..=1.0).contains(&config.detection.min_confidence) {
            return Err(ConfigError::InvalidMinConfidence(config.detection.min_confidence));
        }

        if config.server.max_body_bytes == 0 {
            return Err(ConfigError::InvalidMaxBodyBytes);
        }

        let session = &config.session;
        if session.history_turns > session.max_stored_turns {
            return Err(ConfigError::HistoryExceedsCapacity(
                session.history_turns,
                session.max_stored_turns,
            ));
        }

        Ok(())
    }
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key == *name)
            .map_or("legacy", |(_, target)| *target)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CLEARED: [(&str, Option<&str>); 6] = [
        ("SCW_DB_HOST", None),
        ("SCW_DB_PORT", None),
        ("SCW_DB_NAME", None),
        ("SCW_DB_USER", None),
        ("SCW_DB_PASSWORD", None),
        ("SCW_SECRET_KEY", None),
    ];

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.completion.backend, "remote");
        assert_eq!(config.completion.timeout_secs, 1800);
        assert_eq!(config.session.history_turns, 5);
        assert_eq!(config.database.records_table, "recipes");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_merges_over_defaults() {
        let file = yaml_file(
            r"
retrieval:
  top_k: 8
completion:
  backend: local
  local:
    model: mistral
logging:
  level: debug
",
        );
        let config = temp_env::with_vars(CLEARED, || ConfigLoader::load(Some(file.path()))).unwrap();

        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.completion.backend, "local");
        assert_eq!(config.completion.local.model, "mistral");
        // untouched keys keep their defaults
        assert_eq!(config.completion.local.url, "http://127.0.0.1:11434/api/chat");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn test_env_overrides_yaml() {
        let file = yaml_file("retrieval:\n  top_k: 8\n");
        let config = temp_env::with_vars(
            [
                ("LARDER_RETRIEVAL__TOP_K", Some("3")),
                ("LARDER_SESSION__ENABLED", Some("true")),
            ],
            || ConfigLoader::load(Some(file.path())),
        )
        .unwrap();

        assert_eq!(config.retrieval.top_k, 3);
        assert!(config.session.enabled);
    }

    #[test]
    fn test_legacy_variables() {
        let config = temp_env::with_vars(
            [
                ("SCW_DB_HOST", Some("db.internal")),
                ("SCW_DB_NAME", Some("cookbook")),
                ("SCW_SECRET_KEY", Some("scw-secret")),
            ],
            || ConfigLoader::load(None),
        )
        .unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.name, "cookbook");
        assert_eq!(config.completion.remote.api_key.as_deref(), Some("scw-secret"));
    }

    #[test]
    fn test_prefixed_env_beats_legacy() {
        let config = temp_env::with_vars(
            [
                ("SCW_DB_HOST", Some("legacy-host")),
                ("LARDER_DATABASE__HOST", Some("new-host")),
            ],
            || ConfigLoader::load(None),
        )
        .unwrap();
        assert_eq!(config.database.host, "new-host");
    }

    #[test]
    fn test_serialized_defaults_load_back() {
        let mut config = Config::default();
        config.retrieval.top_k = 9;
        config.session.enabled = true;
        let file = yaml_file(&serde_yaml::to_string(&config).unwrap());

        let loaded = temp_env::with_vars(CLEARED, || ConfigLoader::load(Some(file.path()))).unwrap();
        assert_eq!(loaded.retrieval.top_k, 9);
        assert!(loaded.session.enabled);
        assert_eq!(loaded.server.port, config.server.port);
    }

    #[test]
    fn test_example_file_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("larder.example.yaml");
        let config = temp_env::with_vars(CLEARED, || ConfigLoader::load(Some(&path))).unwrap();
        assert_eq!(config.completion.remote.model, "llama-3.1-8b-instruct");
        assert_eq!(config.database.embeddings_table, "recipes_embeddings");
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::load(Some(Path::new("/nonexistent/larder.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidTopK(0))));

        let mut config = Config::default();
        config.completion.backend = "cloud".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::UnknownBackend(_))
        ));

        let mut config = Config::default();
        config.database.embeddings_table = "emb; drop".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTableName(_))
        ));

        let mut config = Config::default();
        config.session.history_turns = 200;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::HistoryExceedsCapacity(200, 100))
        ));

        let mut config = Config::default();
        config.completion.remote.temperature = 3.5;
        assert!(ConfigLoader::validate(&config).is_err());

        let mut config = Config::default();
        config.detection.min_confidence = 1.5;
        assert!(ConfigLoader::validate(&config).is_err());

        let mut config = Config::default();
        config.server.max_body_bytes = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxBodyBytes)
        ));
    }
}
