//! Adaptive search-window bisection
//!
//! A coarse window can resolve to more result pages than the forum search
//! will paginate through reliably. The splitter probes each window's first
//! result page and recursively bisects the date range until every
//! sub-window resolves to fewer pages than the configured ceiling, or the
//! range can no longer be subdivided.
//!
//! Windows are buffered by a few days on each side before probing, and the
//! buffer is re-applied at every new midpoint, so posts near a cut line
//! land in both halves and the downstream deduplication keeps exactly one
//! copy. Probe failures are soft: the window is returned unsplit rather
//! than aborting the subject's crawl.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::walker::parse_page_count;
use crate::crawler::windows::{SearchQuery, SearchWindow};
use chrono::{Datelike, Duration, NaiveDate};
use scraper::Html;
use std::future::Future;
use std::pin::Pin;

/// Splits a window until every returned sub-window resolves to fewer than
/// `config.page_ceiling` result pages (best effort)
///
/// Returns the finalized windows in left-to-right order. A window whose
/// buffered span is at most `config.min_split_days` is returned as-is even
/// when it is over the ceiling; termination wins over accuracy there.
pub fn split_window<'a>(
    fetcher: &'a Fetcher,
    query: &'a SearchQuery,
    config: &'a CrawlerConfig,
    window: SearchWindow,
    today: NaiveDate,
) -> Pin<Box<dyn Future<Output = Vec<SearchWindow>> + Send + 'a>> {
    Box::pin(async move {
        if window.start >= window.end {
            tracing::warn!("Invalid date range: {} to {}", window.start, window.end);
            return vec![window];
        }

        let buffered = buffer_window(&window, query, config, today);

        let total_pages = match probe_page_count(fetcher, &buffered).await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::error!(
                    "Failed to probe pagination for {}: {}; keeping window unsplit",
                    buffered.url,
                    e
                );
                return vec![buffered];
            }
        };

        if total_pages < config.page_ceiling {
            return vec![buffered];
        }

        if buffered.span_days() <= config.min_split_days {
            tracing::warn!(
                "Cannot split range further: {} to {} ({} pages)",
                buffered.start,
                buffered.end,
                total_pages
            );
            return vec![buffered];
        }

        tracing::debug!(
            "Window {} to {} resolves to {} pages, bisecting",
            buffered.start,
            buffered.end,
            total_pages
        );

        let (left, right) = bisect(&buffered, query, config, today);
        let mut windows = split_window(fetcher, query, config, left, today).await;
        windows.extend(split_window(fetcher, query, config, right, today).await);
        windows
    })
}

/// Applies the symmetric day buffer and clamps to `[min_year-01-01, today]`
fn buffer_window(
    window: &SearchWindow,
    query: &SearchQuery,
    config: &CrawlerConfig,
    today: NaiveDate,
) -> SearchWindow {
    let mut start = window.start - Duration::days(config.buffer_days);
    let mut end = window.end + Duration::days(config.buffer_days);

    if end > today {
        end = today;
    }
    if start.year() < config.min_year {
        start = NaiveDate::from_ymd_opt(config.min_year, 1, 1).unwrap_or(window.start);
    }

    SearchWindow {
        year: window.year,
        start,
        end,
        url: query.window_url(start, end),
    }
}

/// Cuts a window at its midpoint, re-applying the overlap buffer on both
/// sides of the cut
fn bisect(
    window: &SearchWindow,
    query: &SearchQuery,
    config: &CrawlerConfig,
    today: NaiveDate,
) -> (SearchWindow, SearchWindow) {
    let mid = window.start + Duration::days(window.span_days() / 2);

    let left_end = (mid + Duration::days(config.buffer_days)).min(today);
    let right_start = (mid - Duration::days(config.buffer_days)).min(today);

    let left = SearchWindow {
        year: window.year,
        start: window.start,
        end: left_end,
        url: query.window_url(window.start, left_end),
    };
    let right = SearchWindow {
        year: window.year,
        start: right_start,
        end: window.end,
        url: query.window_url(right_start, window.end),
    };

    (left, right)
}

/// Fetches a window's first result page and reads its page count
async fn probe_page_count(
    fetcher: &Fetcher,
    window: &SearchWindow,
) -> Result<u32, crate::crawler::FetchError> {
    let body = fetcher.fetch(&window.url).await?;
    let html = Html::parse_document(&body);
    Ok(parse_page_count(&html))
}
