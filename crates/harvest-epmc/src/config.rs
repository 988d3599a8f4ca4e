//! Europe PMC search configuration

use std::time::Duration;

/// Default search filter: papers acknowledging BHF funding
pub const DEFAULT_FILTER: &str = r#"GRANT_AGENCY:"BRITISH HEART FOUNDATION""#;

/// Runtime configuration for a Europe PMC harvest
#[derive(Debug, Clone)]
pub struct Config {
    /// REST search endpoint
    pub base_url: String,
    /// How far back from today the publication window starts
    pub lookback_days: u32,
    /// Extra query clause ANDed with the date window; empty for none
    pub filter: String,
    /// `core` returns abstracts, affiliations and grants
    pub result_type: String,
    pub page_size: u32,
    pub sort: String,
    /// Contact address sent with each request
    pub email: Option<String>,
    /// Pause between successive page requests
    pub page_delay: Duration,
    /// Maximum pages to fetch (for testing)
    pub max_pages: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://www.ebi.ac.uk/europepmc/webservices/rest/search".to_string(),
            lookback_days: 5 * 365,
            filter: DEFAULT_FILTER.to_string(),
            result_type: "core".to_string(),
            page_size: 100,
            sort: "P_PDATE_D desc".to_string(),
            email: None,
            page_delay: Duration::from_secs(1),
            max_pages: None,
        }
    }
}
