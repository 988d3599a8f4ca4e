//! Europe PMC REST search client

use chrono::{Days, NaiveDate};
use harvest_core::{FetchError, get_text};

use crate::config::Config;
use crate::paginate::PageSource;

/// Publication date window plus an optional extra clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub filter: String,
}

impl SearchQuery {
    /// Window ending `today` and starting `lookback_days` earlier
    pub fn lookback(today: NaiveDate, lookback_days: u32, filter: &str) -> Self {
        let from = today
            .checked_sub_days(Days::new(lookback_days.into()))
            .unwrap_or(NaiveDate::MIN);
        Self {
            from,
            to: today,
            filter: filter.to_string(),
        }
    }

    /// Query string in Europe PMC syntax
    pub fn to_query(&self) -> String {
        let window = format!(
            "FIRST_PDATE:[{} TO {}]",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d")
        );
        let filter = self.filter.trim();
        if filter.is_empty() {
            window
        } else {
            format!("{window} AND {filter}")
        }
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// [`PageSource`] backed by the live search endpoint
pub struct EuropePmcClient {
    base_url: String,
    /// Fixed request parameters; the cursor is appended per request
    params: Vec<(&'static str, String)>,
    query: SearchQuery,
}

impl EuropePmcClient {
    pub fn new(config: &Config, query: SearchQuery) -> Self {
        let mut params = vec![
            ("query", query.to_query()),
            ("resultType", config.result_type.clone()),
            ("pageSize", config.page_size.to_string()),
            ("format", "xml".to_string()),
            ("sort", config.sort.clone()),
        ];
        if let Some(email) = config.email.as_deref().filter(|e| !e.is_empty()) {
            params.push(("email", email.to_string()));
        }
        Self {
            base_url: config.base_url.clone(),
            params,
            query,
        }
    }

    /// Request parameters for one page
    pub fn params_for(&self, cursor: &str) -> Vec<(&'static str, String)> {
        let mut params = self.params.clone();
        params.push(("cursorMark", cursor.to_string()));
        params
    }
}

impl PageSource for EuropePmcClient {
    fn fetch(&mut self, cursor: &str) -> Result<String, FetchError> {
        log::debug!("GET {} cursorMark={cursor}", self.base_url);
        get_text(&self.base_url, &self.params_for(cursor))
    }

    fn describe(&self) -> String {
        format!("search {}", self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn lookback_window() {
        let q = SearchQuery::lookback(date("2025-03-01"), 1825, "");
        assert_eq!(q.from, date("2020-03-02"));
        assert_eq!(q.to, date("2025-03-01"));
        assert_eq!(q.to_query(), "FIRST_PDATE:[2020-03-02 TO 2025-03-01]");
    }

    #[test]
    fn filter_is_anded() {
        let q = SearchQuery::lookback(date("2025-01-10"), 9, crate::config::DEFAULT_FILTER);
        assert_eq!(
            q.to_query(),
            r#"FIRST_PDATE:[2025-01-01 TO 2025-01-10] AND GRANT_AGENCY:"BRITISH HEART FOUNDATION""#
        );
        assert_eq!(q.to_string(), "2025-01-01 to 2025-01-10");
    }

    #[test]
    fn request_parameters() {
        let config = Config {
            email: Some("me@example.org".to_string()),
            ..Default::default()
        };
        let client = EuropePmcClient::new(
            &config,
            SearchQuery::lookback(date("2025-01-10"), 9, ""),
        );
        let params = client.params_for("AoE=");
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("resultType"), Some("core"));
        assert_eq!(get("pageSize"), Some("100"));
        assert_eq!(get("format"), Some("xml"));
        assert_eq!(get("sort"), Some("P_PDATE_D desc"));
        assert_eq!(get("email"), Some("me@example.org"));
        assert_eq!(get("cursorMark"), Some("AoE="));
        assert!(client.describe().contains("2025-01-01"));
    }

    #[test]
    fn blank_email_is_omitted() {
        let config = Config {
            email: Some(String::new()),
            ..Default::default()
        };
        let client = EuropePmcClient::new(
            &config,
            SearchQuery::lookback(date("2025-01-10"), 1, ""),
        );
        assert!(!client.params_for("*").iter().any(|(k, _)| *k == "email"));
    }
}
