//! Domain layer for the Larder recipe assistant
//!
//! Core models, errors and the ports adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
