use crate::CLAP_STYLING;
use clap::arg;
use std::path::PathBuf;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitemirror")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitemirror")
        .about("Mirror a single website to local storage")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-u --"url" <URL>)
                .required(true)
                .help("The seed URL to mirror. A missing scheme defaults to http://"),
        )
        .arg(
            arg!(-d --"dest" <DIR>)
                .required(false)
                .help("Directory the mirrored pages are written under")
                .default_value("downloads"),
        )
        .arg(
            arg!(--"max_depth" <DEPTH>)
                .required(false)
                .visible_alias("max-depth")
                .help("Maximum link depth from the seed. Zero or negative means unlimited")
                .value_parser(clap::value_parser!(i64))
                .allow_negative_numbers(true)
                .default_value("-1"),
        )
        .arg(
            arg!(-t --"threads" <NUM_WORKERS>)
                .required(false)
                .help("The number of async worker 'threads' in the worker pool.")
                .value_parser(clap::value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            arg!(--"strict-host")
                .required(false)
                .help("Compare parsed hosts instead of URL prefixes when deciding what is on-site")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"rfc-resolve")
                .required(false)
                .help("Resolve relative links against the page URL (RFC 3986) instead of the site root")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Report format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Save report to file (default: display to screen)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Log crawl progress at info level").required(false))
}
