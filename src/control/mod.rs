//! Control plane: API keys and project registrations, persisted as
//! reserved collections inside the management project's document store.

pub mod keys;
pub mod projects;

pub use keys::KeyStore;
pub use projects::ProjectRegistry;

/// Reserved collection holding client API key records.
pub const KEYS_COLLECTION: &str = "_relay_api_keys";
/// Reserved collection holding project registrations.
pub const PROJECTS_COLLECTION: &str = "_relay_projects";
