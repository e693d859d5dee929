//! Client for a detection inference server.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::artifacts::ArtifactWriter;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Detection, DetectionConfig, ImageInput};
use crate::domain::ports::ObjectDetector;

/// Settings for [`HttpObjectDetector`].
#[derive(Debug, Clone)]
pub struct HttpDetectorConfig {
    pub url: String,
    pub min_confidence: f32,
    pub timeout: Duration,
    pub artifact_dir: String,
}

impl From<&DetectionConfig> for HttpDetectorConfig {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            url: config.url.trim_end_matches('/').to_string(),
            min_confidence: config.min_confidence,
            timeout: Duration::from_secs(config.timeout_secs),
            artifact_dir: config.artifact_dir.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    image: String,
    confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<Detection>,
    #[serde(default)]
    annotated_image: Option<String>,
}

/// Detector backed by `POST {url}/detect`.
pub struct HttpObjectDetector {
    config: HttpDetectorConfig,
    client: reqwest::Client,
    artifacts: ArtifactWriter,
}

impl HttpObjectDetector {
    /// Build the client and wait for the server to report its model loaded.
    #[instrument(skip_all, fields(url = %config.url))]
    pub async fn connect(config: HttpDetectorConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::DetectionFailed(format!("Failed to create HTTP client: {e}")))?;

        let response = client
            .get(format!("{}/health", config.url))
            .send()
            .await
            .map_err(|e| DomainError::DetectionFailed(format!("detection server unreachable: {e}")))?;
        if !response.status().is_success() {
            return Err(DomainError::DetectionFailed(format!(
                "detection server health check returned {}",
                response.status()
            )));
        }

        info!("detection model ready");
        let artifacts = ArtifactWriter::new(&config.artifact_dir);
        Ok(Self {
            config,
            client,
            artifacts,
        })
    }
}

#[async_trait]
impl ObjectDetector for HttpObjectDetector {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip_all, fields(bytes = image.bytes.len()))]
    async fn detect(&self, image: &ImageInput) -> DomainResult<Vec<Detection>> {
        let request = DetectRequest {
            image: STANDARD.encode(&image.bytes),
            confidence: self.config.min_confidence,
            file_name: image.file_name.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/detect", self.config.url))
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::DetectionFailed(format!("detect request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DomainError::DetectionFailed(format!(
                "detection server returned {}",
                response.status()
            )));
        }

        let body: DetectResponse = response
            .json()
            .await
            .map_err(|e| DomainError::DetectionFailed(format!("invalid detect response: {e}")))?;

        let annotated = body
            .annotated_image
            .as_deref()
            .and_then(|encoded| match STANDARD.decode(encoded) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(error = %e, "annotated image is not valid base64");
                    None
                }
            });
        self.artifacts.write(&body.detections, annotated.as_deref()).await;

        Ok(body.detections)
    }
}
