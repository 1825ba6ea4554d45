use serde::Serialize;

/// Response payload for GET /status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub collection: String,
    /// A live collection handle is held.
    pub ready: bool,
    /// Passages in the collection when the handle was issued.
    pub passages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u64>,
}
