use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, Fields};

/// A client API key, as stored in the control plane and returned by the
/// admin API. `key` is the secret the client presents; `project_id`
/// restricts the key to one project when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn from_document(doc: Document) -> serde_json::Result<Self> {
        serde_json::from_value(doc.into_json())
    }

    /// The stored representation: every field except the document id.
    pub fn fields(&self) -> Fields {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("id");
                map
            }
            _ => Fields::new(),
        }
    }
}
