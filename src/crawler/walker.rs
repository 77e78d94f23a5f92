//! Search-result page walking
//!
//! Parses one search-result page into its pagination bound and the post
//! links it lists. A window with N pages is walked by fetching page 1 for
//! the page count, then pages 2..N independently; the orchestrator fans
//! those out over the worker pool.
//!
//! Failures here are soft: a page that cannot be fetched or parsed
//! contributes an empty link set and a page count of 1. An all-empty walk
//! means "no data found", never a hard error.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::windows::{SearchQuery, SearchWindow};
use scraper::{Html, Selector};
use url::Url;

/// Path marker identifying a link to post/thread content
const THREAD_MARKER: &str = "threads/";

/// Result of scanning one search-result page
#[derive(Debug, Clone)]
pub struct PageScan {
    /// Absolute post URLs found on the page, in document order, deduplicated
    pub links: Vec<String>,

    /// Highest page number visible in the pagination control (1 if absent)
    pub total_pages: u32,
}

impl PageScan {
    /// The scan recorded for an unreachable or unparseable page
    pub fn empty() -> Self {
        Self {
            links: Vec::new(),
            total_pages: 1,
        }
    }
}

/// Reads the pagination control's maximum page number
///
/// The control is a `div.pageNav` holding numbered anchors; the highest
/// numeric anchor is the page count. No control means a single page.
pub fn parse_page_count(html: &Html) -> u32 {
    let Ok(selector) = Selector::parse("div.pageNav a") else {
        return 1;
    };

    html.select(&selector)
        .filter_map(|a| a.text().collect::<String>().trim().parse::<u32>().ok())
        .max()
        .unwrap_or(1)
}

/// Parses a search-result page into post links and the page count
///
/// A post link is an anchor whose href carries the thread path marker,
/// excluding fragment-only anchors and pagination anchors (`page-`).
/// Relative hrefs resolve against `base`.
pub fn parse_search_page(body: &str, base: &Url) -> PageScan {
    let html = Html::parse_document(body);

    let mut links = Vec::new();
    let mut seen = std::collections::HashSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for anchor in html.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !href.contains(THREAD_MARKER) || href.starts_with('#') || href.contains("page-") {
                continue;
            }
            let Ok(absolute) = base.join(href) else {
                continue;
            };
            let absolute = absolute.to_string();
            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    }

    let total_pages = parse_page_count(&html);

    PageScan { links, total_pages }
}

/// Fetches and scans one result page of a window
///
/// Page 1 is the window URL itself; later pages add the `page` parameter.
/// Fetch failures are logged and reported as an empty scan.
pub async fn fetch_search_page(
    fetcher: &Fetcher,
    query: &SearchQuery,
    window: &SearchWindow,
    page: u32,
) -> PageScan {
    let url = query.page_url(window, page);

    match fetcher.fetch(&url).await {
        Ok(body) => {
            let scan = parse_search_page(&body, &url);
            tracing::debug!(
                "Fetched {} post links from {}, total pages: {}",
                scan.links.len(),
                url,
                scan.total_pages
            );
            scan
        }
        Err(e) => {
            tracing::error!("Failed to fetch search page {}: {}", url, e);
            PageScan::empty()
        }
    }
}
