//! Crawl statistics and outcome reporting

use crate::media::{MediaKind, MediaStore};

/// Summary of one crawl run
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub subjects: Vec<SubjectReport>,

    /// True when the crawl was stopped by a cancellation request
    pub stopped: bool,
}

impl CrawlReport {
    pub fn total_items(&self) -> usize {
        self.subjects.iter().map(SubjectReport::total_items).sum()
    }
}

/// Per-subject crawl statistics
#[derive(Debug, Clone, Default)]
pub struct SubjectReport {
    pub name: String,
    pub windows_planned: usize,
    pub windows_final: usize,
    pub pages_fetched: usize,
    pub posts_processed: usize,
    pub images: usize,
    pub videos: usize,
    pub gifs: usize,
}

impl SubjectReport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Copies the final per-kind counts out of the subject's store
    pub fn record_store(&mut self, store: &MediaStore) {
        self.images = store.count(MediaKind::Image);
        self.videos = store.count(MediaKind::Video);
        self.gifs = store.count(MediaKind::Gif);
    }

    pub fn total_items(&self) -> usize {
        self.images + self.videos + self.gifs
    }
}

/// Prints a human-readable crawl report
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    for subject in &report.subjects {
        println!("Subject: {}", subject.name);
        println!(
            "  Windows: {} planned, {} after splitting",
            subject.windows_planned, subject.windows_final
        );
        println!("  Pages fetched: {}", subject.pages_fetched);
        println!("  Posts processed: {}", subject.posts_processed);
        println!(
            "  Media: {} images, {} videos, {} gifs ({} total)",
            subject.images,
            subject.videos,
            subject.gifs,
            subject.total_items()
        );
    }

    println!("\nTotal media items: {}", report.total_items());
    if report.stopped {
        println!("Status: stopped by request");
    }
}
