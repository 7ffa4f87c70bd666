//! URL normalization and same-site membership.
//!
//! Everything here works on plain strings. The default same-site test and the
//! default href resolver are textual heuristics rather than RFC 3986 logic:
//!
//! * [`SameSitePolicy::Prefix`] accepts any candidate whose scheme-stripped form
//!   starts with the scheme-stripped site root, or does so after dropping one or
//!   more leading host labels. `yandex.ru.evil.com` is therefore same-site to
//!   `yandex.ru`, and so is `example.community` to `example.com`.
//! * [`HrefResolution::Concat`] glues relative hrefs onto the site root. It never
//!   resolves `.` or `..` segments and ignores the directory of the linking page.
//!
//! The stricter alternatives are opt-in: [`SameSitePolicy::Host`] and
//! [`HrefResolution::Rfc3986`].

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

/// How candidate links are tested against the site root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSitePolicy {
    /// Literal prefix test on the scheme-stripped strings, plus subdomains.
    #[default]
    Prefix,
    /// Parsed host comparison: same host or a subdomain of it, and the root path
    /// as a path prefix.
    Host,
}

/// How hrefs found in a page are turned into absolute URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HrefResolution {
    /// `site_root + "/" + href` for anything without an http(s) scheme.
    #[default]
    Concat,
    /// Standard relative reference resolution against the linking page.
    Rfc3986,
}

/// A normalized absolute URL: scheme-qualified, trailing separators trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteUrl(String);

impl SiteUrl {
    /// Normalizes `raw`. Returns `None` when nothing but a scheme is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let with_scheme = ensure_scheme(raw.trim());
        let normalized = with_scheme.trim_end_matches('/');
        if strip_scheme(normalized).is_empty() {
            return None;
        }
        Some(Self(normalized.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scheme-stripped form. `http://` and `https://` variants share a key.
    pub fn key(&self) -> &str {
        strip_scheme(&self.0)
    }
}

impl fmt::Display for SiteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SiteUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn has_http_scheme(url: &str) -> bool {
    url.starts_with(HTTP_PREFIX) || url.starts_with(HTTPS_PREFIX)
}

/// Prefixes `http://` unless the URL already carries an http(s) scheme.
pub fn ensure_scheme(url: &str) -> String {
    if has_http_scheme(url) {
        url.to_string()
    } else {
        format!("{HTTP_PREFIX}{url}")
    }
}

/// Removes a leading `http://` or `https://`.
pub fn strip_scheme(url: &str) -> &str {
    url.strip_prefix(HTTPS_PREFIX)
        .or_else(|| url.strip_prefix(HTTP_PREFIX))
        .unwrap_or(url)
}

/// Same-site test with the default [`SameSitePolicy::Prefix`] heuristic.
pub fn is_same_site(site_root: &str, candidate: &str) -> bool {
    is_same_site_with(SameSitePolicy::Prefix, site_root, candidate)
}

pub fn is_same_site_with(policy: SameSitePolicy, site_root: &str, candidate: &str) -> bool {
    match policy {
        SameSitePolicy::Prefix => prefix_same_site(site_root, candidate),
        SameSitePolicy::Host => host_same_site(site_root, candidate),
    }
}

fn prefix_same_site(site_root: &str, candidate: &str) -> bool {
    let root = strip_scheme(site_root).trim_end_matches('/');
    if root.is_empty() {
        return false;
    }

    let candidate = strip_scheme(candidate);
    if candidate.starts_with(root) {
        return true;
    }

    // Subdomains: retry the prefix test after each label boundary in the host.
    let host_end = candidate.find('/').unwrap_or(candidate.len());
    candidate[..host_end]
        .match_indices('.')
        .any(|(idx, _)| candidate[idx + 1..].starts_with(root))
}

fn host_same_site(site_root: &str, candidate: &str) -> bool {
    let (Ok(root), Ok(candidate)) = (
        Url::parse(&ensure_scheme(site_root)),
        Url::parse(&ensure_scheme(candidate)),
    ) else {
        return false;
    };
    let (Some(root_host), Some(host)) = (root.host_str(), candidate.host_str()) else {
        return false;
    };

    let host_matches = host == root_host
        || host
            .strip_suffix(root_host)
            .is_some_and(|rest| rest.ends_with('.'));
    if !host_matches || root.port() != candidate.port() {
        return false;
    }

    let root_path = root.path().trim_end_matches('/');
    let path = candidate.path();
    root_path.is_empty()
        || path == root_path
        || path
            .strip_prefix(root_path)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Turns an href found on `page_url` into an absolute URL string.
///
/// Returns `None` for hrefs that can never name a page of the site: empty or
/// fragment-only references and non-HTTP schemes such as `mailto:`. Fragments
/// are dropped.
pub fn resolve_href(
    site_root: &str,
    page_url: &str,
    href: &str,
    mode: HrefResolution,
) -> Option<String> {
    let href = href.trim();
    let href = href.split_once('#').map_or(href, |(before, _)| before);
    if href.is_empty() || has_foreign_scheme(href) {
        return None;
    }

    match mode {
        HrefResolution::Concat => Some(concat_href(site_root, href)),
        HrefResolution::Rfc3986 => {
            let base = Url::parse(&ensure_scheme(page_url)).ok()?;
            let mut joined = base.join(href).ok()?;
            joined.set_fragment(None);
            matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
        }
    }
}

fn concat_href(site_root: &str, href: &str) -> String {
    if has_http_scheme(href) {
        return href.to_string();
    }

    let root = site_root.trim_end_matches('/');
    let relative = href.trim_start_matches('/');
    if relative.contains(strip_scheme(root)) {
        // Already names the site, e.g. a protocol-relative `//host/path`.
        relative.to_string()
    } else {
        format!("{root}/{relative}")
    }
}

/// `mailto:`, `javascript:` and friends. `host:8080/path` is not a scheme.
fn has_foreign_scheme(href: &str) -> bool {
    if has_http_scheme(href) {
        return false;
    }
    let Some((scheme, rest)) = href.split_once(':') else {
        return false;
    };

    let is_scheme = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-'));
    if !is_scheme {
        return false;
    }

    let port_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    let looks_like_port = port_len > 0 && matches!(rest[port_len..].chars().next(), None | Some('/'));
    !looks_like_port
}
