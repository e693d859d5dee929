//! Recipe corpus records returned by similarity search.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A recipe as stored in the corpus.
///
/// Everything beyond `id`, `name` and `description` (preparation time,
/// nutrition, tags, ...) is carried opaquely in `attributes`. Consumers that
/// render attributes do so in key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl CorpusRecord {
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Records ordered by ascending distance, best match first.
pub type RetrievedSet = Vec<CorpusRecord>;

/// A corpus record waiting for an embedding row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub id: i64,
    pub text: String,
}
