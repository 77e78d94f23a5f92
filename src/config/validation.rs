//! Configuration validation
//!
//! Rejects configurations that would make the crawl misbehave silently:
//! zero-sized worker pools, a page ceiling the splitter can never satisfy,
//! or a base URL the fetcher cannot resolve against.

use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site(config)?;
    validate_crawler(config)?;
    validate_output(config)?;
    Ok(())
}

fn validate_site(config: &Config) -> Result<(), ConfigError> {
    let url = Url::parse(&config.site.base_url)
        .map_err(|_| ConfigError::InvalidUrl(config.site.base_url.clone()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must be http or https, got scheme '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url has no host: {}",
            config.site.base_url
        )));
    }

    if config.site.search_id.is_empty() {
        return Err(ConfigError::Validation(
            "search-id must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawler(config: &Config) -> Result<(), ConfigError> {
    let crawler = &config.crawler;

    if crawler.max_fetch_attempts == 0 {
        return Err(ConfigError::Validation(
            "max-fetch-attempts must be at least 1".to_string(),
        ));
    }

    if crawler.workers == 0 {
        return Err(ConfigError::Validation(
            "workers must be at least 1".to_string(),
        ));
    }

    if crawler.page_ceiling < 2 {
        return Err(ConfigError::Validation(
            "page-ceiling must be at least 2".to_string(),
        ));
    }

    if crawler.buffer_days < 0 {
        return Err(ConfigError::Validation(
            "buffer-days must not be negative".to_string(),
        ));
    }

    if crawler.min_split_days < 1 {
        return Err(ConfigError::Validation(
            "min-split-days must be at least 1".to_string(),
        ));
    }

    if crawler.min_year < 1970 {
        return Err(ConfigError::Validation(format!(
            "min-year {} is before any forum existed",
            crawler.min_year
        )));
    }

    Ok(())
}

fn validate_output(config: &Config) -> Result<(), ConfigError> {
    if config.output.gallery_path.is_empty() {
        return Err(ConfigError::Validation(
            "gallery-path must not be empty".to_string(),
        ));
    }
    Ok(())
}
