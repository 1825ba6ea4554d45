use contextor::{IndexAction, IndexReport, IndexState, IndexWarning};
use serde::{Deserialize, Serialize};

/// Request payload for /index.
#[derive(Debug, Default, Deserialize)]
pub struct IndexRequest {
    /// Drop the collection and rebuild it from the current documents.
    #[serde(default)]
    pub rebuild: bool,
}

/// Response payload for /index.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub collection: String,
    pub state_before: IndexState,
    pub action: IndexAction,
    pub passages: u64,
    /// Soft problems found on a reused index (partial index, drift).
    pub warnings: Vec<IndexWarningItem>,
    pub epoch: u64,
}

#[derive(Debug, Serialize)]
pub struct IndexWarningItem {
    #[serde(flatten)]
    pub warning: IndexWarning,
    pub message: String,
}

impl From<IndexReport> for IndexResponse {
    fn from(r: IndexReport) -> Self {
        Self {
            collection: r.handle.collection,
            state_before: r.state_before,
            action: r.action,
            passages: r.passages,
            warnings: r
                .warnings
                .into_iter()
                .map(|w| IndexWarningItem {
                    message: w.to_string(),
                    warning: w,
                })
                .collect(),
            epoch: r.handle.epoch,
        }
    }
}
