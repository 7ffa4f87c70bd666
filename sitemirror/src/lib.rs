// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    EXIT_CONFIG, EXIT_INTERRUPTED, EXIT_OK, MirrorArgs, build_options, exit_code, expand_dest,
    use_color, write_report,
};

// Re-export crawl functionality from sitemirror-core
pub use sitemirror_core::crawl::{CrawlOptions, execute_crawl, extract_url_path};
pub use sitemirror_core::report::{CrawlSummary, ReportFormat, generate_crawl_report};
