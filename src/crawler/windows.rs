//! Search window generation
//!
//! This module turns a subject's requested year range into the coarse
//! date-partitioned search windows the crawl starts from. Windows are
//! sub-year slices taken from a fixed month-boundary table whose entries
//! overlap by a few days, so posts landing exactly on a boundary day are
//! caught by at least one window.

use crate::config::SiteConfig;
use chrono::{Datelike, NaiveDate};
use url::Url;

/// One crawl target: a name, an inclusive year range, and whether the
/// search should match titles only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub title_only: bool,
}

impl Subject {
    pub fn new(name: impl Into<String>, start_year: i32, end_year: i32, title_only: bool) -> Self {
        Self {
            name: name.into(),
            start_year,
            end_year,
            title_only,
        }
    }
}

/// Month-boundary window table: `((start month, day), (end month, day))`
///
/// Walks a year backwards in half-month steps, each window padded so that
/// consecutive windows overlap by roughly 3 days. Entries starting in
/// December resolve to the previous year; entries ending in January spill
/// into the next.
pub const MONTH_WINDOWS: [((u32, u32), (u32, u32)); 24] = [
    ((12, 13), (1, 3)),
    ((11, 28), (12, 18)),
    ((11, 13), (12, 3)),
    ((10, 29), (11, 18)),
    ((10, 13), (11, 3)),
    ((9, 28), (10, 18)),
    ((9, 13), (10, 3)),
    ((8, 29), (9, 18)),
    ((8, 13), (9, 3)),
    ((7, 29), (8, 18)),
    ((7, 13), (8, 3)),
    ((6, 28), (7, 18)),
    ((6, 13), (7, 3)),
    ((5, 29), (6, 18)),
    ((5, 13), (6, 3)),
    ((4, 28), (5, 18)),
    ((4, 13), (5, 3)),
    ((3, 29), (4, 18)),
    ((3, 13), (4, 3)),
    ((2, 26), (3, 18)),
    ((2, 13), (3, 3)),
    ((1, 29), (2, 18)),
    ((1, 13), (2, 3)),
    ((12, 29), (1, 18)),
];

/// Builds search URLs for one subject against one site
#[derive(Debug, Clone)]
pub struct SearchQuery {
    base: Url,
    encoded_name: String,
    title_only: bool,
}

impl SearchQuery {
    pub fn new(site: &SiteConfig, subject: &Subject) -> Result<Self, url::ParseError> {
        let base = Url::parse(&format!(
            "{}/search/{}/",
            site.base_url.trim_end_matches('/'),
            site.search_id
        ))?;

        Ok(Self {
            base,
            encoded_name: subject.name.replace(' ', "+"),
            title_only: subject.title_only,
        })
    }

    /// The search URL for a date range
    pub fn window_url(&self, start: NaiveDate, end: NaiveDate) -> Url {
        let mut url = self.base.clone();
        url.set_query(Some(&format!(
            "q={}&c[newer_than]={}&c[older_than]={}&c[title_only]={}&o=date",
            self.encoded_name,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            u8::from(self.title_only),
        )));
        url
    }

    /// The search URL for a specific result page of a window
    pub fn page_url(&self, window: &SearchWindow, page: u32) -> Url {
        if page <= 1 {
            return window.url.clone();
        }
        let mut url = window.url.clone();
        let query = url.query().unwrap_or_default().to_string();
        url.set_query(Some(&format!("{}&page={}", query, page)));
        url
    }
}

/// A finalized search window: calendar bounds plus the encoded search URL
///
/// `year` is the search year the window was generated for; it serves as the
/// fallback publish year for posts without a parseable timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchWindow {
    pub year: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub url: Url,
}

impl SearchWindow {
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Generates the search windows for a subject, most recent year first
///
/// Years are clamped to `[min_year, today.year()]`. Windows starting in the
/// future are discarded; windows ending beyond `today` are clipped to
/// `today`; degenerate windows (`start >= end`) are dropped. The descending
/// year order sets crawl priority, not correctness.
pub fn generate_windows(
    query: &SearchQuery,
    subject: &Subject,
    min_year: i32,
    today: NaiveDate,
) -> Vec<SearchWindow> {
    let start_year = subject.start_year.max(min_year);
    let end_year = subject.end_year.min(today.year());

    let mut windows = Vec::new();

    for year in (start_year..=end_year).rev() {
        for &((start_month, start_day), (end_month, end_day)) in &MONTH_WINDOWS {
            let start_year_adj = if start_month == 12 { year - 1 } else { year };
            let end_year_adj = if end_month == 1 { year + 1 } else { year };

            let Some(start) = NaiveDate::from_ymd_opt(start_year_adj, start_month, start_day)
            else {
                continue;
            };
            let Some(end) = NaiveDate::from_ymd_opt(end_year_adj, end_month, end_day) else {
                continue;
            };

            if start > today {
                continue;
            }
            let end = end.min(today);
            if start >= end {
                continue;
            }

            windows.push(SearchWindow {
                year,
                start,
                end,
                url: query.window_url(start, end),
            });
        }
    }

    if windows.is_empty() {
        tracing::warn!("No valid search windows generated for '{}'", subject.name);
    } else {
        tracing::info!(
            "Generated {} search windows for '{}'",
            windows.len(),
            subject.name
        );
    }

    windows
}
