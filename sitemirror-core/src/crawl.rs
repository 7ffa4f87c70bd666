use crate::report::CrawlSummary;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use sitemirror_scanner::job::{DEFAULT_DEST, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS};
use sitemirror_scanner::{
    ConfigError, CrawlJob, Crawler, HrefResolution, PageResult, SameSitePolicy, ScanError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

/// Options for configuring a mirror operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    pub dest: PathBuf,
    /// `None` crawls until the site is exhausted
    pub max_depth: Option<usize>,
    pub threads: usize,
    pub timeout: Duration,
    pub same_site: SameSitePolicy,
    pub resolution: HrefResolution,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dest: PathBuf::from(DEFAULT_DEST),
            max_depth: None,
            threads: DEFAULT_WORKERS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            same_site: SameSitePolicy::default(),
            resolution: HrefResolution::default(),
            show_progress_bars: false,
        }
    }

    /// Validates the options into an immutable job.
    pub fn to_job(&self) -> Result<CrawlJob, ConfigError> {
        Ok(CrawlJob::new(&self.url, &self.dest)?
            .with_max_depth(self.max_depth)
            .with_workers(self.threads)
            .with_timeout(self.timeout)
            .with_same_site_policy(self.same_site)
            .with_href_resolution(self.resolution))
    }
}

/// Callback for reporting individual page results as they come in
pub type CrawlResultCallback = Arc<dyn Fn(PageResult) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let mut path = u.path().to_string();
            if let Some(query) = u.query() {
                path.push('?');
                path.push_str(query);
            }
            path
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a mirror crawl with the given options.
///
/// Configuration problems are returned before anything is fetched. Per-page
/// failures are part of the returned summary.
pub async fn execute_crawl(
    options: CrawlOptions,
    cancel: CancellationToken,
    result_callback: Option<CrawlResultCallback>,
) -> Result<CrawlSummary, ScanError> {
    let job = options.to_job()?;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Mirroring {}...", job.seed()));
        Some(Arc::new(pb))
    } else {
        None
    };

    // Counter for tracking processed URLs
    let processed_count = Arc::new(AtomicUsize::new(0));

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let internal_progress_callback: sitemirror_scanner::ProgressCallback =
        Arc::new(move |_worker_id: usize, url: String| {
            if let Some(ref pb) = pb_clone {
                let count = count_clone.load(Ordering::Relaxed);
                pb.set_message(format!("[{count} done] {url}"));
            }
        });

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let internal_result_callback: sitemirror_scanner::ResultCallback =
        Arc::new(move |result: PageResult| {
            count_clone.fetch_add(1, Ordering::Relaxed);
            if let (Some(pb), Some(error)) = (&pb_clone, &result.error) {
                pb.println(format!("[!] {}: {}", result.url, error));
            }
            if let Some(ref callback) = result_callback {
                callback(result);
            }
        });

    let crawler = Crawler::new(job)?
        .with_progress_callback(internal_progress_callback)
        .with_result_callback(internal_result_callback)
        .with_cancellation_token(cancel);

    let started_at = Local::now();
    info!(seed = %crawler.job().seed(), "mirror started");
    let outcome = crawler.crawl().await;
    let finished_at = Local::now();
    info!(elapsed_ms = (finished_at - started_at).num_milliseconds(), "mirror finished");

    // Finish progress bar (only if enabled)
    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Mirror finished! {} URLs processed", total));
    }

    Ok(CrawlSummary::from_outcome(
        crawler.job(),
        started_at,
        finished_at,
        outcome?,
    ))
}
