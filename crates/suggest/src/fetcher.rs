//! Background fetching with latest-response-wins semantics.
//!
//! Every query gets a ticket from [`LatestRequest`]. Fetches run on worker
//! threads and report back over a channel; a response is only surfaced if its
//! ticket is still the latest one issued. Older responses are dropped, so a
//! slow reply for "re" can never overwrite the list for "rev".

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tagcalc_engine::Suggestion;

use crate::client::{SuggestError, SuggestionSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub seq: u64,
    pub query: String,
}

/// Tracks which in-flight request is authoritative.
#[derive(Debug, Default)]
pub struct LatestRequest {
    issued: u64,
    pending: Option<RequestTicket>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding any pending one.
    pub fn issue(&mut self, query: &str) -> RequestTicket {
        self.issued += 1;
        let ticket = RequestTicket { seq: self.issued, query: query.to_string() };
        self.pending = Some(ticket.clone());
        ticket
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.pending.as_ref() == Some(ticket)
    }

    /// Resolve `ticket`. Returns true if it was the pending request.
    pub fn accept(&mut self, ticket: &RequestTicket) -> bool {
        if self.is_current(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Drop the pending request; whatever it returns will be discarded.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<&RequestTicket> {
        self.pending.as_ref()
    }
}

/// Per-query cache of successful responses.
#[derive(Debug)]
pub struct QueryCache {
    stale_after: Duration,
    entries: HashMap<String, (Instant, Vec<Suggestion>)>,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self { stale_after, entries: HashMap::new() }
    }

    pub fn get(&self, query: &str) -> Option<&[Suggestion]> {
        self.entries
            .get(query)
            .filter(|(at, _)| at.elapsed() < self.stale_after)
            .map(|(_, list)| list.as_slice())
    }

    pub fn insert(&mut self, query: &str, suggestions: Vec<Suggestion>) {
        self.entries.insert(query.to_string(), (Instant::now(), suggestions));
    }

    /// Remove entries past their stale time.
    pub fn prune(&mut self) {
        let stale_after = self.stale_after;
        self.entries.retain(|_, (at, _)| at.elapsed() < stale_after);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type Response = (RequestTicket, Result<Vec<Suggestion>, SuggestError>);

/// Issues fetches on worker threads and hands back only the latest answer.
pub struct SuggestionFetcher<S> {
    source: Arc<S>,
    tracker: LatestRequest,
    cache: QueryCache,
    tx: Sender<Response>,
    rx: Receiver<Response>,
}

impl<S: SuggestionSource + Send + Sync + 'static> SuggestionFetcher<S> {
    pub fn new(source: S, stale_after: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source: Arc::new(source),
            tracker: LatestRequest::new(),
            cache: QueryCache::new(stale_after),
            tx,
            rx,
        }
    }

    /// Ask for suggestions for `query`. Returns the answer immediately when
    /// the query is empty or cached; otherwise starts a fetch and returns
    /// `None`, with the result arriving through [`poll`](Self::poll) or
    /// [`wait`](Self::wait).
    pub fn request(&mut self, query: &str) -> Option<Vec<Suggestion>> {
        if query.is_empty() {
            self.tracker.cancel();
            return Some(Vec::new());
        }
        self.cache.prune();
        if let Some(cached) = self.cache.get(query) {
            debug!("suggestions for {:?} served from cache", query);
            self.tracker.cancel();
            return Some(cached.to_vec());
        }

        let ticket = self.tracker.issue(query);
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = source.fetch(&ticket.query);
            // Receiver gone means the fetcher was dropped; nothing to do
            let _ = tx.send((ticket, result));
        });
        None
    }

    pub fn cancel(&mut self) {
        self.tracker.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.tracker.pending().is_some()
    }

    /// Drain arrived responses without blocking, returning the latest
    /// request's result if it has come in.
    pub fn poll(&mut self) -> Option<Result<Vec<Suggestion>, SuggestError>> {
        let mut accepted = None;
        while let Ok(response) = self.rx.try_recv() {
            if let Some(result) = self.settle(response) {
                accepted = Some(result);
            }
        }
        accepted
    }

    /// Block until the pending request resolves or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<Vec<Suggestion>, SuggestError>> {
        let deadline = Instant::now() + timeout;
        while self.is_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(response) => {
                    if let Some(result) = self.settle(response) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    fn settle(&mut self, (ticket, result): Response) -> Option<Result<Vec<Suggestion>, SuggestError>> {
        if let Ok(list) = &result {
            self.cache.insert(&ticket.query, list.clone());
        }
        if self.tracker.accept(&ticket) {
            Some(result)
        } else {
            warn!("discarding stale suggestions for {:?} (request #{})", ticket.query, ticket.seq);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with the query echoed back; "slow" queries sleep first.
    struct EchoSource {
        calls: AtomicUsize,
    }

    impl EchoSource {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0) }
        }
    }

    impl SuggestionSource for EchoSource {
        fn fetch(&self, query: &str) -> Result<Vec<Suggestion>, SuggestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.starts_with("slow") {
                thread::sleep(Duration::from_millis(300));
            }
            if query == "fail" {
                return Err(SuggestError::Http(500, "boom".into()));
            }
            Ok(vec![Suggestion::variable("1", query)])
        }
    }

    #[test]
    fn test_tracker_only_accepts_latest() {
        let mut tracker = LatestRequest::new();
        let first = tracker.issue("r");
        let second = tracker.issue("re");
        assert!(!tracker.accept(&first));
        assert!(tracker.accept(&second));
        // Already resolved
        assert!(!tracker.accept(&second));
    }

    #[test]
    fn test_tracker_same_query_new_ticket() {
        let mut tracker = LatestRequest::new();
        let first = tracker.issue("re");
        let second = tracker.issue("re");
        assert_ne!(first, second);
        assert!(!tracker.is_current(&first));
    }

    #[test]
    fn test_tracker_cancel() {
        let mut tracker = LatestRequest::new();
        let ticket = tracker.issue("x");
        tracker.cancel();
        assert!(!tracker.accept(&ticket));
    }

    #[test]
    fn test_cache_expiry() {
        let mut fresh = QueryCache::new(Duration::from_secs(60));
        fresh.insert("a", vec![Suggestion::variable("1", "a")]);
        assert_eq!(fresh.get("a").unwrap().len(), 1);
        assert!(fresh.get("b").is_none());

        let mut stale = QueryCache::new(Duration::ZERO);
        stale.insert("a", vec![]);
        assert!(stale.get("a").is_none());
        stale.prune();
        assert!(stale.is_empty());
    }

    #[test]
    fn test_request_drops_expired_entries() {
        let mut fetcher = SuggestionFetcher::new(EchoSource::new(), Duration::ZERO);
        fetcher.request("a");
        fetcher.wait(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(fetcher.cache.len(), 1);

        fetcher.request("b");
        assert!(fetcher.cache.is_empty());
    }

    #[test]
    fn test_empty_query_answers_immediately() {
        let mut fetcher = SuggestionFetcher::new(EchoSource::new(), Duration::from_secs(60));
        assert_eq!(fetcher.request(""), Some(vec![]));
        assert!(!fetcher.is_pending());
    }

    #[test]
    fn test_request_then_wait() {
        let mut fetcher = SuggestionFetcher::new(EchoSource::new(), Duration::from_secs(60));
        assert!(fetcher.request("rev").is_none());
        let list = fetcher.wait(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(list[0].name, "rev");
    }

    #[test]
    fn test_second_request_served_from_cache() {
        let mut fetcher = SuggestionFetcher::new(EchoSource::new(), Duration::from_secs(60));
        fetcher.request("rev");
        fetcher.wait(Duration::from_secs(5)).unwrap().unwrap();

        let cached = fetcher.request("rev").unwrap();
        assert_eq!(cached[0].name, "rev");
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut fetcher = SuggestionFetcher::new(EchoSource::new(), Duration::from_secs(60));
        fetcher.request("slow-r");
        fetcher.request("re");

        let list = fetcher.wait(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(list[0].name, "re");

        // The slow reply arrives later and must not surface
        thread::sleep(Duration::from_millis(500));
        assert!(fetcher.poll().is_none());
    }

    #[test]
    fn test_errors_are_reported_not_cached() {
        let mut fetcher = SuggestionFetcher::new(EchoSource::new(), Duration::from_secs(60));
        fetcher.request("fail");
        let err = fetcher.wait(Duration::from_secs(5)).unwrap().unwrap_err();
        assert_eq!(err, SuggestError::Http(500, "boom".into()));
        assert!(fetcher.request("fail").is_none());
    }

    #[test]
    fn test_wait_times_out() {
        let mut fetcher = SuggestionFetcher::new(EchoSource::new(), Duration::from_secs(60));
        fetcher.request("slow-x");
        assert!(fetcher.wait(Duration::from_millis(10)).is_none());
        assert!(fetcher.is_pending());
    }
}
