//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Composition root wiring adapters into services

pub mod config;
pub mod logging;
pub mod setup;

pub use setup::AppContext;
