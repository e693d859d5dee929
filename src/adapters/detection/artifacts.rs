//! Detection side artifacts for presentation layers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::models::Detection;

pub const CLASS_COUNTS_FILE: &str = "class_counts.json";
pub const ANNOTATED_IMAGE_FILE: &str = "result.jpg";

/// Writes `class_counts.json` and the annotated image. Failures are logged
/// and never surface to the caller.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn write(&self, detections: &[Detection], annotated_image: Option<&[u8]>) {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "cannot create artifact directory");
            return;
        }

        let counts = class_counts(detections);
        match serde_json::to_vec_pretty(&counts) {
            Ok(json) => self.write_file(CLASS_COUNTS_FILE, &json).await,
            Err(e) => warn!(error = %e, "cannot serialize class counts"),
        }

        if let Some(image) = annotated_image {
            self.write_file(ANNOTATED_IMAGE_FILE, image).await;
        }
    }

    async fn write_file(&self, name: &str, contents: &[u8]) {
        let path = self.dir.join(name);
        match tokio::fs::write(&path, contents).await {
            Ok(()) => debug!(path = %path.display(), "artifact written"),
            Err(e) => warn!(path = %path.display(), error = %e, "artifact write failed"),
        }
    }
}

/// Label → number of detections, keys sorted.
pub fn class_counts(detections: &[Detection]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for detection in detections {
        *counts.entry(detection.label.clone()).or_insert(0) += 1;
    }
    counts
}
