//! Object detection adapters.

pub mod artifacts;
pub mod http;
pub mod lazy;

pub use artifacts::ArtifactWriter;
pub use http::{HttpDetectorConfig, HttpObjectDetector};
pub use lazy::{DetectorLoader, LazyDetector};
