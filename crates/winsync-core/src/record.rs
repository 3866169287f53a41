//! The per-window record and the stored list format.

use serde::{Deserialize, Serialize};
use winsync_common::{Metadata, Shape, StoreError, WindowId};

/// One live window as stored in the shared list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub shape: Shape,
    #[serde(default)]
    pub metadata: Metadata,
    /// Wall-clock milliseconds of the owner's last write of this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen_at: Option<u64>,
}

impl WindowRecord {
    pub fn new(id: WindowId, shape: Shape, metadata: Metadata, seen_at: u64) -> Self {
        Self {
            id,
            shape,
            metadata,
            seen_at: Some(seen_at),
        }
    }

    /// Equal in everything consumers care about; `seen_at` is ignored so
    /// heartbeats alone never count as a change.
    pub fn same_content(&self, other: &WindowRecord) -> bool {
        self.id == other.id && self.shape == other.shape && self.metadata == other.metadata
    }
}

/// Parse the stored list.
///
/// A missing value, an empty value, and JSON `null` all mean "no windows".
pub fn decode_list(raw: Option<&str>) -> Result<Vec<WindowRecord>, serde_json::Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => Ok(serde_json::from_str::<Option<Vec<WindowRecord>>>(text)?.unwrap_or_default()),
    }
}

pub fn encode_list(records: &[WindowRecord]) -> Result<String, StoreError> {
    serde_json::to_string(records).map_err(|e| StoreError::Serialize(e.to_string()))
}
