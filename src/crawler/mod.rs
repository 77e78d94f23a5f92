//! The crawl pipeline
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and backoff
//! - Search window generation over a subject's year range
//! - Adaptive window bisection under the page-count ceiling
//! - Search-page walking and post-link extraction
//! - Post media extraction and subject matching
//! - Overall orchestration with cooperative cancellation

mod extractor;
mod fetcher;
mod orchestrator;
mod splitter;
mod walker;
mod windows;

pub use extractor::{extract_post, extract_post_media};
pub use fetcher::{FetchError, Fetcher, RetryPolicy};
pub use orchestrator::{CrawlOutcome, Orchestrator};
pub use splitter::split_window;
pub use walker::{fetch_search_page, parse_page_count, parse_search_page, PageScan};
pub use windows::{generate_windows, SearchQuery, SearchWindow, Subject, MONTH_WINDOWS};
