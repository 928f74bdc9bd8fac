use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, Fields};

/// A registered backing project. `credentials` is the raw JSON blob the
/// operator uploaded; it is parsed at connection time, never exposed by
/// the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub credentials: String,
    pub created_at: DateTime<Utc>,
}

/// Listing shape for the admin API: identity only, no credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
}

impl ProjectRecord {
    pub fn from_document(doc: Document) -> serde_json::Result<Self> {
        serde_json::from_value(doc.into_json())
    }

    pub fn fields(&self) -> Fields {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("id");
                map
            }
            _ => Fields::new(),
        }
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}
