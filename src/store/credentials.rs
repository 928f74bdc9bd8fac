use thiserror::Error;

/// Service-level credential material for one backing project, as stored in
/// the project registry. The relay treats the stored form as an opaque
/// string and only ever parses it to build a client session.
#[derive(Debug, Clone)]
pub struct ServiceCredentials {
    /// The backing project's own identifier. Must be present; registry
    /// records are keyed by it.
    pub project_id: String,
    /// Base URL of the document service. Validated at connect time, not at
    /// registration time.
    pub endpoint: String,
    /// Service bearer secret presented to the document service.
    pub secret: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("credentials are not valid JSON")]
    Malformed,
    #[error("credentials have no embedded project identifier")]
    MissingProjectId,
}

impl ServiceCredentials {
    /// Parse a credential blob. Unparseable JSON and a missing embedded
    /// project id are distinct failures; admin clients see different 400s
    /// for them.
    pub fn parse(raw: &str) -> Result<Self, CredentialsError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|_| CredentialsError::Malformed)?;

        let project_id = value
            .get("project_id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or(CredentialsError::MissingProjectId)?
            .to_string();
        // Only the project id gates registration. Everything else is
        // checked when a session is actually opened.
        let field = |name: &str| {
            value
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        Ok(Self {
            project_id,
            endpoint: field("endpoint"),
            secret: field("secret"),
        })
    }
}
