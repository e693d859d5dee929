//! User query and image inputs.

use serde::{Deserialize, Serialize};

/// A user's request: free text plus ingredient labels detected in a photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Free text as typed by the user. May be empty.
    pub raw_text: String,
    /// Detected object labels in detection order. May be empty.
    pub detected_labels: Vec<String>,
}

impl Query {
    pub fn new(raw_text: impl Into<String>, detected_labels: Vec<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            detected_labels,
        }
    }

    /// Trimmed free text.
    pub fn text(&self) -> &str {
        self.raw_text.trim()
    }

    /// True when there is neither text nor a single label to work with.
    pub fn is_empty(&self) -> bool {
        self.text().is_empty() && self.detected_labels.is_empty()
    }
}

/// One object found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Raw image uploaded alongside a query.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    /// Original file name, kept as the image reference in conversation turns.
    pub file_name: Option<String>,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, file_name: Option<String>) -> Self {
        Self { bytes, file_name }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("len", &self.bytes.len())
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Reduce detections to ordered, de-duplicated labels at or above `min_confidence`.
pub fn labels_from_detections(detections: &[Detection], min_confidence: f32) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for detection in detections {
        let label = detection.label.trim();
        if label.is_empty() || detection.confidence < min_confidence {
            continue;
        }
        if !labels.iter().any(|existing| existing == label) {
            labels.push(label.to_string());
        }
    }
    labels
}
