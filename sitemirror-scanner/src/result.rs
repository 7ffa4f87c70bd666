use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of processing one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub depth: usize,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_length: u64,
    pub response_time: Duration,
    pub path: Option<PathBuf>,
    pub links_registered: usize,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl PageResult {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            depth,
            status_code: 0,
            content_type: None,
            content_length: 0,
            response_time: Duration::from_secs(0),
            path: None,
            links_registered: 0,
            error: None,
            error_kind: None,
        }
    }

    pub fn with_error(url: String, depth: usize, kind: ErrorKind, error: String) -> Self {
        let mut result = Self::new(url, depth);
        result.record_error(kind, error);
        result
    }

    pub fn record_error(&mut self, kind: ErrorKind, error: String) {
        self.error_kind = Some(kind);
        self.error = Some(error);
    }

    /// The page body was retrieved with a 2xx status.
    pub fn is_fetched(&self) -> bool {
        (200..300).contains(&self.status_code)
            && !matches!(self.error_kind, Some(ErrorKind::Fetch | ErrorKind::Cancelled))
    }

    pub fn is_persisted(&self) -> bool {
        self.path.is_some()
    }
}

/// Everything a finished (or cancelled) crawl produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlOutcome {
    /// In completion order; with one worker this is the fetch order.
    pub pages: Vec<PageResult>,
    /// Size of the frontier when the crawl stopped.
    pub discovered: usize,
    pub cancelled: bool,
}

impl CrawlOutcome {
    pub fn fetched_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_fetched()).count()
    }

    pub fn persisted_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_persisted()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.pages.iter().filter(|p| p.error_kind.is_some()).count()
    }

    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &PageResult> + '_ {
        self.pages
            .iter()
            .filter(move |p| p.error_kind == Some(kind))
    }
}
