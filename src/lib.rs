//! Mediatrawl: a date-partitioned forum media crawler
//!
//! This crate crawls a forum's date-partitioned search interface to collect
//! media links for one or more named subjects, deduplicates them across
//! overlapping time windows, and hands the aggregated result to an output
//! sink (an HTML gallery by default).

pub mod config;
pub mod crawler;
pub mod media;
pub mod output;
pub mod session;

use thiserror::Error;

/// Main error type for mediatrawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] crawler::FetchError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("A crawl is already running for session {0}")]
    SessionBusy(i64),

    #[error("Crawl stopped by request")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for mediatrawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{FetchError, Fetcher, Orchestrator, RetryPolicy, SearchWindow, Subject};
pub use media::{MediaKind, MediaStore};
pub use session::SessionRegistry;
