use scraper::{Html, Selector};
use std::sync::LazyLock;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Pulls anchor hrefs out of a page body, in document order.
pub trait LinkExtractor: Send + Sync + 'static {
    fn extract_hrefs(&self, body: &[u8]) -> Vec<String>;
}

/// [`LinkExtractor`] over `scraper`'s HTML5 parser. Invalid UTF-8 is replaced,
/// not rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_hrefs(&self, body: &[u8]) -> Vec<String> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        document
            .select(&ANCHOR_SELECTOR)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}
