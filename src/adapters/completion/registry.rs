//! Completion backend registry and factory.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::CompletionConfig;
use crate::domain::ports::CompletionBackend;

use super::local::{LocalBackendConfig, LocalCompletionBackend};
use super::mock::MockCompletionBackend;
use super::remote::{RemoteBackendConfig, RemoteCompletionBackend};

/// Builds the configured completion backend.
pub struct BackendRegistry {
    remote_config: RemoteBackendConfig,
    local_config: LocalBackendConfig,
}

impl BackendRegistry {
    pub const AVAILABLE: [&'static str; 3] = ["remote", "local", "mock"];

    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            remote_config: RemoteBackendConfig::from_config(config),
            local_config: LocalBackendConfig::from_config(config),
        }
    }

    pub fn with_remote_config(mut self, config: RemoteBackendConfig) -> Self {
        self.remote_config = config;
        self
    }

    pub fn with_local_config(mut self, config: LocalBackendConfig) -> Self {
        self.local_config = config;
        self
    }

    /// Create a backend by name.
    pub fn create(&self, backend: &str) -> DomainResult<Arc<dyn CompletionBackend>> {
        match backend {
            "remote" => Ok(Arc::new(RemoteCompletionBackend::new(self.remote_config.clone())?)),
            "local" => Ok(Arc::new(LocalCompletionBackend::new(self.local_config.clone())?)),
            "mock" => Ok(Arc::new(MockCompletionBackend::new())),
            other => Err(DomainError::ValidationFailed(format!(
                "unknown completion backend '{other}', expected one of {}",
                Self::AVAILABLE.join(", ")
            ))),
        }
    }

    pub fn available_types(&self) -> Vec<&'static str> {
        Self::AVAILABLE.to_vec()
    }
}
