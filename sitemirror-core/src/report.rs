// Report generation from a finished mirror run

use crate::crawl::extract_url_path;
use chrono::{DateTime, Local};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use sitemirror_scanner::{CrawlJob, CrawlOutcome, PageResult};
use std::collections::BTreeMap;
use std::path::PathBuf;
use url::Url;

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// What a mirror run did, with wall-clock bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub destination: PathBuf,
    pub max_depth: Option<usize>,
    pub workers: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub cancelled: bool,
    pub discovered: usize,
    pub pages: Vec<PageResult>,
}

impl CrawlSummary {
    pub fn from_outcome(
        job: &CrawlJob,
        started_at: DateTime<Local>,
        finished_at: DateTime<Local>,
        outcome: CrawlOutcome,
    ) -> Self {
        Self {
            seed: job.seed().to_string(),
            destination: job.dest().to_path_buf(),
            max_depth: job.max_depth(),
            workers: job.workers(),
            started_at,
            finished_at,
            cancelled: outcome.cancelled,
            discovered: outcome.discovered,
            pages: outcome.pages,
        }
    }

    pub fn fetched_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_fetched()).count()
    }

    pub fn persisted_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_persisted()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.pages.iter().filter(|p| p.error.is_some()).count()
    }

    pub fn bytes_written(&self) -> u64 {
        self.pages
            .iter()
            .filter(|p| p.is_persisted())
            .map(|p| p.content_length)
            .sum()
    }

    pub fn elapsed(&self) -> chrono::TimeDelta {
        self.finished_at - self.started_at
    }
}

fn status_label(status_code: u16, color: bool) -> String {
    let label = match status_code {
        0 => "---".to_string(),
        code => code.to_string(),
    };
    if !color {
        return label;
    }
    match status_code {
        0 => label.bright_black(),
        100..=199 => label.white(),
        200..=299 => label.green(),
        300..=399 => label.cyan(),
        400..=499 => label.yellow(),
        500..=599 => label.red(),
        _ => label.normal(),
    }
    .to_string()
}

/// Human readable report, grouped by host. `color` lets `colored` style the
/// status codes, subject to its own terminal and `NO_COLOR` detection.
pub fn generate_crawl_report(summary: &CrawlSummary, color: bool) -> String {
    let mut report = String::new();
    report.push_str(DIVIDER);
    report.push('\n');
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Seed: {}\n", summary.seed));
    report.push_str(&format!(
        "  Destination: {}\n",
        summary.destination.display()
    ));
    report.push_str(&format!(
        "  Started: {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!(
        "  Finished: {}\n",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("  Pages fetched: {}\n", summary.fetched_count()));
    report.push_str(&format!("  Pages saved: {}\n", summary.persisted_count()));
    report.push_str(&format!("  Bytes written: {}\n", summary.bytes_written()));
    report.push_str(&format!("  Failures: {}\n", summary.failed_count()));
    report.push_str(&format!("  URLs discovered: {}\n", summary.discovered));
    if summary.cancelled {
        report.push_str("  Interrupted before the site was exhausted\n");
    }
    report.push('\n');
    report.push_str(DIVIDER);
    report.push('\n');

    // BTreeMap keeps host order stable between runs
    let mut by_host: BTreeMap<String, Vec<&PageResult>> = BTreeMap::new();
    for result in &summary.pages {
        let host = Url::parse(&result.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| result.url.clone());
        by_host.entry(host).or_default().push(result);
    }

    for (host, host_results) in by_host.iter_mut() {
        host_results.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));

        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages processed\n\n", host_results.len()));

        for result in host_results.iter() {
            let mut line = format!(
                "  {} {}",
                status_label(result.status_code, color),
                extract_url_path(&result.url)
            );

            if let Some(ref content_type) = result.content_type
                && !content_type.starts_with("text/html")
            {
                if color {
                    line.push_str(&format!(" {}", content_type.bright_black()));
                } else {
                    line.push_str(&format!(" {}", content_type));
                }
            }

            match (&result.path, &result.error) {
                (_, Some(error)) => line.push_str(&format!(" [!] {}", error)),
                (Some(path), None) => line.push_str(&format!(" -> {}", path.display())),
                (None, None) => {}
            }

            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}

pub fn generate_json_report(summary: &CrawlSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

pub fn render_report(
    summary: &CrawlSummary,
    format: ReportFormat,
    color: bool,
) -> serde_json::Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_crawl_report(summary, color)),
        ReportFormat::Json => generate_json_report(summary),
    }
}
