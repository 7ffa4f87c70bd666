use crate::error::{ConfigError, ErrorKind, FetchError, Result, ScanError};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::frontier::Frontier;
use crate::job::CrawlJob;
use crate::normalize::{SiteUrl, is_same_site_with, resolve_href};
use crate::parse::{HtmlLinkExtractor, LinkExtractor};
use crate::persist::Persister;
use crate::result::{CrawlOutcome, PageResult};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(PageResult) + Send + Sync>;

/// Mirrors the site described by a [`CrawlJob`] with a pool of async workers.
///
/// The frontier is the work queue: workers claim its oldest unvisited entry,
/// fetch it, persist it and register its same-site links one level deeper.
/// The crawl ends once no entry is left and no worker is busy, or when the
/// cancellation token fires.
pub struct Crawler<F = HttpFetcher, E = HtmlLinkExtractor> {
    job: CrawlJob,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    cancel: CancellationToken,
}

impl Crawler {
    pub fn new(job: CrawlJob) -> std::result::Result<Self, ConfigError> {
        let fetcher = HttpFetcher::new(job.timeout())?;
        Ok(Self::with_parts(job, fetcher, HtmlLinkExtractor))
    }
}

impl<F: Fetcher, E: LinkExtractor> Crawler<F, E> {
    pub fn with_parts(job: CrawlJob, fetcher: F, extractor: E) -> Self {
        Self {
            job,
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            progress_callback: None,
            result_callback: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that aborts this crawl when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    pub async fn crawl(&self) -> Result<CrawlOutcome> {
        self.job.prepare_destination().await?;

        let workers = self.job.workers();
        info!(
            "Starting crawl of {} with {} workers (max depth: {})",
            self.job.seed(),
            workers,
            self.job
                .max_depth()
                .map_or_else(|| "unbounded".to_string(), |d| d.to_string())
        );

        let mut frontier = Frontier::new();
        frontier.register(self.job.seed().clone(), 0);

        let shared = Arc::new(Shared {
            job: self.job.clone(),
            fetcher: self.fetcher.clone(),
            extractor: self.extractor.clone(),
            persister: Persister::new(self.job.dest(), self.job.seed()),
            state: Mutex::new(CrawlState {
                frontier,
                in_flight: 0,
            }),
            work_available: Notify::new(),
            results: Mutex::new(Vec::new()),
            progress_callback: self.progress_callback.clone(),
            result_callback: self.result_callback.clone(),
            cancel: self.cancel.clone(),
        });

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| tokio::spawn(run_worker(worker_id, shared.clone())))
            .collect();

        for joined in futures::future::join_all(handles).await {
            joined.map_err(ScanError::JoinError)?;
        }

        let pages = std::mem::take(&mut *shared.results.lock().await);
        let discovered = shared.state.lock().await.frontier.len();
        let cancelled = self.cancel.is_cancelled();

        info!(
            "Crawl {}. Processed {} pages, discovered {} URLs",
            if cancelled { "cancelled" } else { "complete" },
            pages.len(),
            discovered
        );

        Ok(CrawlOutcome {
            pages,
            discovered,
            cancelled,
        })
    }
}

struct CrawlState {
    frontier: Frontier,
    // Claimed pages whose links are not registered yet.
    in_flight: usize,
}

struct Shared<F, E> {
    job: CrawlJob,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    persister: Persister,
    state: Mutex<CrawlState>,
    work_available: Notify,
    results: Mutex<Vec<PageResult>>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    cancel: CancellationToken,
}

async fn run_worker<F: Fetcher, E: LinkExtractor>(worker_id: usize, shared: Arc<Shared<F, E>>) {
    debug!("Worker {} started", worker_id);

    loop {
        if shared.cancel.is_cancelled() {
            break;
        }

        let (task, idle) = {
            let mut state = shared.state.lock().await;
            match state.frontier.claim() {
                Some(task) => {
                    state.in_flight += 1;
                    (Some(task), None)
                }
                None if state.in_flight == 0 => (None, None),
                // Registered before the lock is released, so no wakeup is lost.
                None => (None, Some(shared.work_available.notified())),
            }
        };

        let (url, depth) = match (task, idle) {
            (Some(task), _) => task,
            (None, Some(notified)) => {
                tokio::select! {
                    () = notified => {}
                    () = shared.cancel.cancelled() => break,
                }
                continue;
            }
            (None, None) => {
                // Quiescent: wake the other idle workers so they exit too.
                shared.work_available.notify_waiters();
                break;
            }
        };

        if let Some(ref callback) = shared.progress_callback {
            callback(worker_id, url.to_string());
        }

        let result = shared.process(&url, depth).await;

        shared.state.lock().await.in_flight -= 1;
        shared.work_available.notify_waiters();

        if let Some(ref callback) = shared.result_callback {
            callback(result.clone());
        }
        shared.results.lock().await.push(result);
    }

    debug!("Worker {} finished", worker_id);
}

impl<F: Fetcher, E: LinkExtractor> Shared<F, E> {
    async fn process(&self, url: &SiteUrl, depth: usize) -> PageResult {
        let fetched = tokio::select! {
            fetched = self.fetcher.fetch(url.as_str()) => fetched,
            () = self.cancel.cancelled() => Err(FetchError::Cancelled),
        };

        let page = match fetched {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                let error = FetchError::Status {
                    url: url.to_string(),
                    status: page.status,
                };
                warn!("{}", error);
                let mut result =
                    PageResult::with_error(url.to_string(), depth, error.kind(), error.to_string());
                result.status_code = page.status;
                result.content_type = page.content_type;
                result.response_time = page.response_time;
                return result;
            }
            Err(error) => {
                warn!("Crawl error for {}: {}", url, error);
                return PageResult::with_error(url.to_string(), depth, error.kind(), error.to_string());
            }
        };

        let mut result = PageResult::new(url.to_string(), depth);
        result.status_code = page.status;
        result.content_type = page.content_type.clone();
        result.content_length = page.body.len() as u64;
        result.response_time = page.response_time;

        match self.persister.persist(url, &page.body).await {
            Ok(path) => result.path = Some(path),
            Err(error) => {
                warn!("Could not save {}: {}", url, error);
                result.record_error(ErrorKind::Persist, error.to_string());
            }
        }

        if page.is_html() && self.job.allows_children(depth) {
            let links = self.same_site_links(url, &self.extractor.extract_hrefs(&page.body));

            let mut state = self.state.lock().await;
            for link in links {
                if state.frontier.register(link.clone(), depth + 1) {
                    debug!("  -> Registered {} at depth {}", link, depth + 1);
                    result.links_registered += 1;
                }
            }
        }

        result
    }

    fn same_site_links(&self, page_url: &SiteUrl, hrefs: &[String]) -> Vec<SiteUrl> {
        let seed = self.job.seed().as_str();
        let policy = self.job.same_site_policy();

        hrefs
            .iter()
            .filter_map(|href| resolve_href(seed, page_url.as_str(), href, self.job.href_resolution()))
            .filter(|absolute| {
                let same_site = is_same_site_with(policy, seed, absolute);
                if !same_site {
                    debug!("Skipping off-site link {}", absolute);
                }
                same_site
            })
            .filter_map(|absolute| SiteUrl::parse(&absolute))
            .collect()
    }
}
