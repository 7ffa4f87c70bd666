use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use sitemirror_core::crawl::{CrawlOptions, execute_crawl};
use sitemirror_core::print_banner;
use sitemirror_core::report::{CrawlSummary, ReportFormat, render_report};
use sitemirror_scanner::{HrefResolution, SameSitePolicy, ScanError, depth_limit};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Command line arguments after clap has validated them.
#[derive(Debug, Clone)]
pub struct MirrorArgs {
    pub url: String,
    pub dest: String,
    pub max_depth: i64,
    pub threads: usize,
    pub timeout_secs: u64,
    pub strict_host: bool,
    pub rfc_resolve: bool,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

impl MirrorArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            url: matches.get_one::<String>("url").cloned().unwrap_or_default(),
            dest: matches
                .get_one::<String>("dest")
                .cloned()
                .unwrap_or_else(|| "downloads".to_string()),
            max_depth: matches.get_one::<i64>("max_depth").copied().unwrap_or(-1),
            threads: matches.get_one::<usize>("threads").copied().unwrap_or(10),
            timeout_secs: matches.get_one::<u64>("timeout").copied().unwrap_or(10),
            strict_host: matches.get_flag("strict-host"),
            rfc_resolve: matches.get_flag("rfc-resolve"),
            format: matches
                .get_one::<String>("format")
                .and_then(|f| ReportFormat::from_str(f))
                .unwrap_or(ReportFormat::Text),
            output: matches.get_one::<PathBuf>("output").cloned(),
            quiet: matches.get_flag("quiet"),
            verbose: matches.get_flag("verbose"),
        }
    }
}

/// Expand `~` in the destination directory
pub fn expand_dest(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn build_options(args: &MirrorArgs) -> CrawlOptions {
    let mut options = CrawlOptions::new(args.url.trim());
    options.dest = expand_dest(&args.dest);
    options.max_depth = depth_limit(args.max_depth);
    options.threads = args.threads;
    options.timeout = Duration::from_secs(args.timeout_secs);
    options.same_site = if args.strict_host {
        SameSitePolicy::Host
    } else {
        SameSitePolicy::Prefix
    };
    options.resolution = if args.rfc_resolve {
        HrefResolution::Rfc3986
    } else {
        HrefResolution::Concat
    };
    options.show_progress_bars = !args.quiet;
    options
}

/// RUST_LOG wins; otherwise only warnings, or info with --verbose.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Colour only when the report goes to a terminal and `NO_COLOR` is unset.
pub fn use_color(is_terminal: bool) -> bool {
    is_terminal && std::env::var_os("NO_COLOR").is_none()
}

pub fn exit_code(summary: &CrawlSummary) -> i32 {
    if summary.cancelled {
        EXIT_INTERRUPTED
    } else {
        EXIT_OK
    }
}

/// Save a rendered report, creating parent directories as needed
pub fn write_report(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

fn print_settings(options: &CrawlOptions) {
    let depth = options
        .max_depth
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unlimited".to_string());
    println!("\n{} {}", "Mirroring".bright_cyan().bold(), options.url.trim());
    println!("Destination: {}", options.dest.display());
    println!("Workers: {}", options.threads);
    println!("Max depth: {}\n", depth);
}

/// Cancels `token` on the first Ctrl-C.
fn spawn_interrupt_listener(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    eprintln!("\n{}", "Interrupted, stopping workers...".yellow());
                    token.cancel();
                }
            }
            () = token.cancelled() => {}
        }
    });
}

/// Runs one mirror job end to end and returns the process exit code.
pub async fn handle_mirror(args: MirrorArgs) -> i32 {
    init_tracing(args.verbose);

    if !args.quiet {
        print_banner();
    }

    let options = build_options(&args);
    if !args.quiet {
        print_settings(&options);
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_listener(cancel.clone());

    println!(
        "Started at {}",
        chrono::Local::now().format(TIMESTAMP_FORMAT)
    );

    let summary = match execute_crawl(options, cancel.clone(), None).await {
        Ok(summary) => summary,
        Err(ScanError::Config(e)) => {
            cancel.cancel();
            eprintln!("{} {}", "✗".red().bold(), e);
            return EXIT_CONFIG;
        }
        Err(e) => {
            cancel.cancel();
            eprintln!("{} Mirror failed: {}", "✗".red().bold(), e);
            return EXIT_CONFIG;
        }
    };
    // Release the interrupt listener
    cancel.cancel();

    println!(
        "Finished at {}",
        summary.finished_at.format(TIMESTAMP_FORMAT)
    );
    if summary.cancelled {
        println!("\n{} Mirror interrupted\n", "!".yellow().bold());
    } else {
        println!("\n{} Mirror complete!\n", "✓".green().bold());
    }

    let report = match render_report(
        &summary,
        args.format,
        use_color(std::io::stdout().is_terminal()),
    ) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} Failed to render report: {}", "✗".red().bold(), e);
            return exit_code(&summary);
        }
    };
    print!("{}", report);

    if let Some(ref output) = args.output {
        // Files never get ANSI colours
        let plain = match render_report(&summary, args.format, false) {
            Ok(plain) => plain,
            Err(e) => {
                eprintln!("{} Failed to render report: {}", "✗".red().bold(), e);
                return EXIT_CONFIG;
            }
        };
        match write_report(output, &plain) {
            Ok(()) => println!("{} Report saved to {}", "✓".green(), output.display()),
            Err(e) => {
                eprintln!("{} {:#}", "✗".red().bold(), e);
                return EXIT_CONFIG;
            }
        }
    }

    exit_code(&summary)
}
