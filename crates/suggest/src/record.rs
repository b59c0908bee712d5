//! Raw autocomplete records and query filtering.

use serde::{Deserialize, Serialize};
use tagcalc_engine::{Suggestion, SuggestionCategory};

/// JSON scalar that may arrive as either a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    pub fn as_string(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            Scalar::Number(n) => n.to_string(),
        }
    }
}

/// One entry of the autocomplete endpoint's response array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRecord {
    pub id: Scalar,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
}

impl ApiRecord {
    /// Case-insensitive substring match on `name` or `inputs`.
    /// `query_lower` must already be lowercase.
    fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self
                .inputs
                .as_deref()
                .is_some_and(|inputs| inputs.to_lowercase().contains(query_lower))
    }

    pub fn into_suggestion(self) -> Suggestion {
        Suggestion {
            id: self.id.as_string(),
            name: self.name,
            value: self.value.as_ref().map(Scalar::as_string),
            category: SuggestionCategory::Variable,
            inputs: self.inputs,
        }
    }
}

/// Keep records matching `query`, tagged as variables, in response order.
pub fn filter_records(records: Vec<ApiRecord>, query: &str) -> Vec<Suggestion> {
    let query_lower = query.to_lowercase();
    records
        .into_iter()
        .filter(|r| r.matches(&query_lower))
        .map(ApiRecord::into_suggestion)
        .collect()
}

/// Parse a response body into records.
pub fn parse_records(body: &str) -> Result<Vec<ApiRecord>, serde_json::Error> {
    serde_json::from_str(body)
}
