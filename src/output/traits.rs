//! Output sink trait and error types

use crate::crawler::Subject;
use crate::media::MediaStore;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while publishing crawl results
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No media to publish")]
    NoMedia,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Sink accepting the final aggregated media of a crawl
///
/// Implementations receive the subjects in their original request order
/// together with each subject's deduplicated store. Returns a
/// human-readable location of the published result.
pub trait MediaSink {
    fn publish(
        &mut self,
        subjects: &[Subject],
        stores: &HashMap<String, MediaStore>,
    ) -> OutputResult<String>;
}
