use chrono::Local;
use sitemirror::handlers::*;
use sitemirror::{CrawlSummary, ReportFormat, extract_url_path};
use sitemirror_scanner::{HrefResolution, SameSitePolicy};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn args(url: &str) -> MirrorArgs {
    MirrorArgs {
        url: url.to_string(),
        dest: "downloads".to_string(),
        max_depth: -1,
        threads: 10,
        timeout_secs: 10,
        strict_host: false,
        rfc_resolve: false,
        format: ReportFormat::Text,
        output: None,
        quiet: false,
        verbose: false,
    }
}

fn empty_summary(cancelled: bool) -> CrawlSummary {
    let now = Local::now();
    CrawlSummary {
        seed: "http://example.com".to_string(),
        destination: PathBuf::from("downloads"),
        max_depth: None,
        workers: 1,
        started_at: now,
        finished_at: now,
        cancelled,
        discovered: 1,
        pages: Vec::new(),
    }
}

#[test]
fn test_build_options_defaults() {
    let options = build_options(&args(" example.com "));
    assert_eq!(options.url, "example.com");
    assert_eq!(options.dest, PathBuf::from("downloads"));
    assert_eq!(options.max_depth, None);
    assert_eq!(options.threads, 10);
    assert_eq!(options.timeout, Duration::from_secs(10));
    assert_eq!(options.same_site, SameSitePolicy::Prefix);
    assert_eq!(options.resolution, HrefResolution::Concat);
    assert!(options.show_progress_bars);
}

#[test]
fn test_build_options_flags() {
    let mut a = args("example.com");
    a.max_depth = 3;
    a.threads = 2;
    a.timeout_secs = 30;
    a.strict_host = true;
    a.rfc_resolve = true;
    a.quiet = true;

    let options = build_options(&a);
    assert_eq!(options.max_depth, Some(3));
    assert_eq!(options.threads, 2);
    assert_eq!(options.timeout, Duration::from_secs(30));
    assert_eq!(options.same_site, SameSitePolicy::Host);
    assert_eq!(options.resolution, HrefResolution::Rfc3986);
    assert!(!options.show_progress_bars);
}

#[test]
fn test_zero_depth_is_unbounded() {
    let mut a = args("example.com");
    a.max_depth = 0;
    assert_eq!(build_options(&a).max_depth, None);
}

#[test]
fn test_expand_dest_tilde() {
    let expanded = expand_dest("~/mirror");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("mirror"));
    assert_eq!(expand_dest("relative/dir"), PathBuf::from("relative/dir"));
}

#[test]
fn test_exit_codes() {
    assert_eq!(exit_code(&empty_summary(false)), EXIT_OK);
    assert_eq!(exit_code(&empty_summary(true)), EXIT_INTERRUPTED);
}

#[test]
fn test_write_report_creates_parents() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("reports").join("run.txt");
    write_report(&path, "report body")?;
    assert_eq!(std::fs::read_to_string(&path)?, "report body");
    Ok(())
}

#[test]
fn test_write_report_error_has_context() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let err = write_report(&blocker.join("run.txt"), "body").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to create directory"));
}

#[tokio::test]
async fn test_handle_mirror_missing_seed_is_config_error() {
    let dir = TempDir::new().unwrap();
    let mut a = args("   ");
    a.dest = dir.path().to_string_lossy().into_owned();
    a.quiet = true;
    assert_eq!(handle_mirror(a).await, EXIT_CONFIG);
}

#[test]
fn test_extract_url_path() {
    assert_eq!(extract_url_path("https://example.com/docs/intro"), "/docs/intro");
    assert_eq!(extract_url_path("https://example.com"), "/");
}

#[test]
fn test_use_color_off_when_piped() {
    assert!(!use_color(false));
}

#[test]
fn test_piped_report_has_no_escape_codes() {
    let report = sitemirror::generate_crawl_report(&empty_summary(false), use_color(false));
    assert!(!report.contains("\x1b["));
}

#[tokio::test]
async fn test_handle_mirror_uncreatable_destination_is_config_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let mut a = args("example.com");
    a.dest = blocker.join("mirror").to_string_lossy().into_owned();
    a.quiet = true;
    assert_eq!(handle_mirror(a).await, EXIT_CONFIG);
}
