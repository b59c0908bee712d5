//! Suggestion sources.
//!
//! Blocking reqwest client (no Tokio runtime required). The endpoint returns
//! the full record list; filtering by query happens client-side.

use std::path::Path;
use std::time::Duration;

use log::debug;
use tagcalc_engine::Suggestion;
use thiserror::Error;

use crate::record::{filter_records, parse_records, ApiRecord};

const USER_AGENT: &str = concat!("tagcalc/", env!("CARGO_PKG_VERSION"));

/// Error type for suggestion fetches.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SuggestError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("I/O error: {0}")]
    Io(String),
}

/// Anything that can answer an autocomplete query.
pub trait SuggestionSource {
    fn fetch(&self, query: &str) -> Result<Vec<Suggestion>, SuggestError>;
}

/// Autocomplete endpoint over HTTP.
#[derive(Clone)]
pub struct HttpSuggestionSource {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpSuggestionSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SuggestError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SuggestError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn get_records(&self) -> Result<Vec<ApiRecord>, SuggestError> {
        let response = self.http.get(&self.endpoint)
            .send()
            .map_err(|e| SuggestError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SuggestError::Http(status, body));
        }

        response.json::<Vec<ApiRecord>>().map_err(|e| {
            if e.is_decode() {
                SuggestError::Parse(e.to_string())
            } else {
                SuggestError::Network(e.to_string())
            }
        })
    }
}

impl SuggestionSource for HttpSuggestionSource {
    fn fetch(&self, query: &str) -> Result<Vec<Suggestion>, SuggestError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.get_records()?;
        let total = records.len();
        let found = filter_records(records, query);
        debug!("GET {} -> {} records, {} match {:?}", self.endpoint, total, found.len(), query);
        Ok(found)
    }
}

/// Fixed record list, e.g. loaded from a JSON file for offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<ApiRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<ApiRecord>) -> Self {
        Self { records }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SuggestError> {
        let body = std::fs::read_to_string(path)
            .map_err(|e| SuggestError::Io(format!("{}: {}", path.display(), e)))?;
        let records = parse_records(&body).map_err(|e| SuggestError::Parse(e.to_string()))?;
        Ok(Self::new(records))
    }
}

impl SuggestionSource for StaticSource {
    fn fetch(&self, query: &str) -> Result<Vec<Suggestion>, SuggestError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(filter_records(self.records.clone(), query))
    }
}
