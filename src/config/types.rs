use serde::Deserialize;

/// Main configuration structure for mediatrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base origin of the forum (e.g., "https://forum.example.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Search identifier segment used by the forum's search URLs
    #[serde(rename = "search-id")]
    pub search_id: String,

    /// User agent string sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Crawler behavior configuration
///
/// All the knobs governing the crawl pipeline: retry budget, pool size,
/// and the window-splitting thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum fetch attempts per request
    #[serde(rename = "max-fetch-attempts", default = "default_max_fetch_attempts")]
    pub max_fetch_attempts: u32,

    /// Number of concurrent workers shared by a crawl session
    #[serde(rename = "workers", default = "default_workers")]
    pub workers: u32,

    /// A search window is bisected while it resolves to at least this many pages
    #[serde(rename = "page-ceiling", default = "default_page_ceiling")]
    pub page_ceiling: u32,

    /// Overlap buffer applied around window bounds, in days
    #[serde(rename = "buffer-days", default = "default_buffer_days")]
    pub buffer_days: i64,

    /// Windows spanning this many days or fewer are never bisected
    #[serde(rename = "min-split-days", default = "default_min_split_days")]
    pub min_split_days: i64,

    /// Earliest year the crawl will reach back to
    #[serde(rename = "min-year", default = "default_min_year")]
    pub min_year: i32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path the HTML gallery is written to
    #[serde(rename = "gallery-path")]
    pub gallery_path: String,
}

fn default_user_agent() -> String {
    format!("mediatrawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_fetch_attempts() -> u32 {
    3
}

fn default_workers() -> u32 {
    18
}

fn default_page_ceiling() -> u32 {
    10
}

fn default_buffer_days() -> i64 {
    3
}

fn default_min_split_days() -> i64 {
    1
}

fn default_min_year() -> i32 {
    2010
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_fetch_attempts: default_max_fetch_attempts(),
            workers: default_workers(),
            page_ceiling: default_page_ceiling(),
            buffer_days: default_buffer_days(),
            min_split_days: default_min_split_days(),
            min_year: default_min_year(),
        }
    }
}
