//! Configuration for the microanalytic-score client.

use serde::Deserialize;

/// Root path of the service, relative to the session base URL
pub const DEFAULT_SERVICE_ROOT: &str = "/microanalyticScore";

/// Page size used when listing collections
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Configuration for the microanalytic-score client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MicroAnalyticScoreConfig {
    /// Service root path.
    /// Default: `/microanalyticScore`
    pub service_root: String,

    /// Items requested per page when listing modules or steps.
    /// Default: 100
    pub page_limit: u32,
}

impl Default for MicroAnalyticScoreConfig {
    fn default() -> Self {
        Self {
            service_root: DEFAULT_SERVICE_ROOT.to_owned(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}
