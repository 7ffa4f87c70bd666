use crate::error::ConfigError;
use crate::normalize::{HrefResolution, SameSitePolicy, SiteUrl};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_DEST: &str = "downloads";
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Everything that defines one crawl. Fixed once the crawl starts.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    seed: SiteUrl,
    dest: PathBuf,
    max_depth: Option<usize>,
    workers: usize,
    timeout: Duration,
    same_site: SameSitePolicy,
    resolution: HrefResolution,
}

impl CrawlJob {
    /// Validates the seed. Depth is unbounded until [`CrawlJob::with_max_depth`].
    pub fn new(seed: &str, dest: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let raw = seed.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingSeed);
        }

        let seed = SiteUrl::parse(raw).ok_or_else(|| ConfigError::InvalidSeed {
            url: raw.to_string(),
            reason: "no host".to_string(),
        })?;
        Url::parse(seed.as_str()).map_err(|e| ConfigError::InvalidSeed {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            seed,
            dest: dest.into(),
            max_depth: None,
            workers: DEFAULT_WORKERS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            same_site: SameSitePolicy::default(),
            resolution: HrefResolution::default(),
        })
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_same_site_policy(mut self, policy: SameSitePolicy) -> Self {
        self.same_site = policy;
        self
    }

    pub fn with_href_resolution(mut self, resolution: HrefResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn seed(&self) -> &SiteUrl {
        &self.seed
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn same_site_policy(&self) -> SameSitePolicy {
        self.same_site
    }

    pub fn href_resolution(&self) -> HrefResolution {
        self.resolution
    }

    /// Whether links found on a page at `depth` may be registered.
    pub fn allows_children(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }

    /// Creates the destination root. Failure here is fatal for the run.
    pub async fn prepare_destination(&self) -> Result<(), ConfigError> {
        tokio::fs::create_dir_all(&self.dest)
            .await
            .map_err(|source| ConfigError::Destination {
                path: self.dest.clone(),
                source,
            })
    }
}

/// CLI depth convention: zero or negative means unbounded.
pub fn depth_limit(raw: i64) -> Option<usize> {
    usize::try_from(raw).ok().filter(|depth| *depth > 0)
}
