pub mod crawler;
pub mod error;
pub mod fetch;
pub mod frontier;
pub mod job;
pub mod normalize;
pub mod parse;
pub mod persist;
pub mod result;

pub use crawler::{Crawler, ProgressCallback, ResultCallback};
pub use error::{ConfigError, ErrorKind, FetchError, PersistError, ScanError};
pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use frontier::Frontier;
pub use job::{CrawlJob, depth_limit};
pub use normalize::{HrefResolution, SameSitePolicy, SiteUrl};
pub use parse::{HtmlLinkExtractor, LinkExtractor};
pub use persist::Persister;
pub use result::{CrawlOutcome, PageResult};
