//! Developer aggregate settings.

use serde::{Deserialize, Serialize};

/// Singleton settings for the `DEVELOPER` identity.
///
/// `active == false` forces the developer weight to zero regardless of the
/// other fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperSettings {
    pub active: bool,
    pub base_weight: u64,
    pub declared_proxy_count: u64,
    #[serde(default)]
    pub comment: String,
}
