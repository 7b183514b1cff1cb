use serde::{Deserialize, Serialize};

/// Query string carrying an entity identifier (`?id=...`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Response body for a successful delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: String,
}

impl DeleteResponse {
    pub fn new(message: &str, id: &str) -> Self {
        Self {
            message: message.to_string(),
            id: id.to_string(),
        }
    }
}
