//! Autocomplete suggestions for the formula editor.
//!
//! Fetches the record list from an HTTP endpoint, filters it by query, and
//! makes sure only the answer to the most recent query reaches the editor.
//!
//! No UI concepts. No retries: a failed fetch is reported and the next
//! keystroke issues a fresh request.

mod client;
mod fetcher;
mod record;

pub use client::{HttpSuggestionSource, StaticSource, SuggestError, SuggestionSource};
pub use fetcher::{LatestRequest, QueryCache, RequestTicket, SuggestionFetcher};
pub use record::{filter_records, parse_records, ApiRecord, Scalar};
