//! Output handling for crawl results
//!
//! # Components
//!
//! - `MediaSink`: the interface the orchestrator's results are handed to
//! - `GalleryWriter`: default sink, renders a self-contained HTML gallery
//! - `CrawlReport`: per-subject crawl statistics and outcome reporting

mod gallery;
mod stats;
mod traits;

pub use gallery::GalleryWriter;
pub use stats::{print_report, CrawlReport, SubjectReport};
pub use traits::{MediaSink, OutputError, OutputResult};
