use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Shared secret for the admin plane. When unset, every admin request
    /// is rejected; there is no open mode.
    pub admin_secret: Option<String>,
    /// Serialized service credentials for the management project, which
    /// holds the `_relay_api_keys` and `_relay_projects` collections.
    pub management_credentials: Option<String>,
    /// Project used by keys that carry no scope of their own.
    pub default_project: Option<String>,
    /// Optional cap on getCollection results. Unset means unbounded.
    pub collection_limit: Option<u32>,
    /// Origin allowed to call the API from a browser dashboard.
    pub dashboard_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8787,
            admin_secret: None,
            management_credentials: None,
            default_project: None,
            collection_limit: None,
            dashboard_origin: None,
        }
    }
}

impl Config {
    /// Management credentials, or an error telling the operator what to set.
    pub fn management_credentials(&self) -> anyhow::Result<&str> {
        self.management_credentials.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "DOCRELAY_MANAGEMENT_CREDENTIALS is not set. Provide the service \
                 credentials JSON for the management project."
            )
        })
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    Ok(Config {
        port: std::env::var("DOCRELAY_PORT")
            .unwrap_or_else(|_| "8787".into())
            .parse()
            .unwrap_or(8787),
        admin_secret: std::env::var("DOCRELAY_ADMIN_SECRET").ok(),
        management_credentials: std::env::var("DOCRELAY_MANAGEMENT_CREDENTIALS").ok(),
        default_project: std::env::var("DOCRELAY_DEFAULT_PROJECT").ok(),
        collection_limit: std::env::var("DOCRELAY_COLLECTION_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok()),
        dashboard_origin: std::env::var("DOCRELAY_DASHBOARD_ORIGIN").ok(),
    })
}
