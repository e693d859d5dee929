//! Object detection port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Detection, ImageInput};

/// Detects food items in an uploaded image.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Detector name for logs.
    fn name(&self) -> &'static str;

    /// Run inference and return every detection in the order the model reports them.
    async fn detect(&self, image: &ImageInput) -> DomainResult<Vec<Detection>>;
}
