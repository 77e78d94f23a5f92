//! Crawl orchestration
//!
//! Drives the full pipeline per subject: window generation, adaptive
//! splitting, page walking, post-link deduplication, parallel extraction,
//! and aggregation into the subject's store. Subjects run strictly
//! sequentially; within a subject, page fetches and post extractions fan
//! out over a bounded worker pool and fan back in at a batch barrier.
//!
//! Worker tasks never touch the store. Extraction results are reduced into
//! it here, in completion order, after each task finishes; the store's
//! seen-set makes that reduction commutative and idempotent.
//!
//! Cancellation is cooperative and coarse: the session registry is checked
//! before submitting a window's work and before consuming each batch
//! result. In-flight fetches are aborted at the task level and their
//! results discarded; nothing finer-grained exists.

use crate::config::Config;
use crate::crawler::extractor::extract_post;
use crate::crawler::fetcher::{Fetcher, RetryPolicy};
use crate::crawler::splitter::split_window;
use crate::crawler::walker::{fetch_search_page, PageScan};
use crate::crawler::windows::{generate_windows, SearchQuery, SearchWindow, Subject};
use crate::media::MediaStore;
use crate::output::{CrawlReport, SubjectReport};
use crate::session::{SessionId, SessionRegistry};
use crate::TrawlError;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Result of one crawl run: per-subject stores plus the run report
///
/// A stopped crawl still carries the stores; they hold whatever had been
/// aggregated before the cancellation landed.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub stores: HashMap<String, MediaStore>,
    pub report: CrawlReport,
}

/// Owns the fetcher, worker pool sizing, and the session registry
pub struct Orchestrator {
    config: Arc<Config>,
    fetcher: Arc<Fetcher>,
    registry: SessionRegistry,
    base: Url,
}

impl Orchestrator {
    pub fn new(config: Config, registry: SessionRegistry) -> crate::Result<Self> {
        let policy = RetryPolicy::from_config(&config.crawler);
        let fetcher = Fetcher::new(policy, &config.site.user_agent)?;
        let base = Url::parse(&config.site.base_url)
            .map_err(|_| crate::ConfigError::InvalidUrl(config.site.base_url.clone()))?;

        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            registry,
            base,
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Runs the full crawl for a set of subjects
    pub async fn run_crawl(
        &self,
        session: SessionId,
        subjects: &[Subject],
    ) -> crate::Result<CrawlOutcome> {
        self.run_crawl_as_of(session, subjects, Utc::now().date_naive())
            .await
    }

    /// Like [`Orchestrator::run_crawl`] with an explicit "today", so window
    /// generation and splitting are deterministic under test
    pub async fn run_crawl_as_of(
        &self,
        session: SessionId,
        subjects: &[Subject],
        today: NaiveDate,
    ) -> crate::Result<CrawlOutcome> {
        if !self.registry.begin(session) {
            return Err(TrawlError::SessionBusy(session));
        }

        let mut stores = HashMap::new();
        let mut report = CrawlReport::default();

        let result = self
            .crawl_subjects(session, subjects, today, &mut stores, &mut report)
            .await;

        match result {
            Ok(()) => {
                self.registry.finish(session);
            }
            Err(TrawlError::Cancelled) => {
                // cancel() already removed the registry entry
                tracing::info!("Crawl session {} stopped by request", session);
                report.stopped = true;
            }
            Err(e) => {
                self.registry.finish(session);
                return Err(e);
            }
        }

        Ok(CrawlOutcome { stores, report })
    }

    async fn crawl_subjects(
        &self,
        session: SessionId,
        subjects: &[Subject],
        today: NaiveDate,
        stores: &mut HashMap<String, MediaStore>,
        report: &mut CrawlReport,
    ) -> crate::Result<()> {
        // Strictly sequential: one subject's extraction completes before the
        // next subject's window generation begins
        for subject in subjects {
            let mut store = MediaStore::new();
            let mut sub_report = SubjectReport::new(&subject.name);

            let result = self
                .crawl_subject(session, subject, today, &mut store, &mut sub_report)
                .await;

            sub_report.record_store(&store);
            stores.insert(subject.name.clone(), store);
            report.subjects.push(sub_report);

            result?;
        }
        Ok(())
    }

    async fn crawl_subject(
        &self,
        session: SessionId,
        subject: &Subject,
        today: NaiveDate,
        store: &mut MediaStore,
        report: &mut SubjectReport,
    ) -> crate::Result<()> {
        tracing::info!(
            "Crawling subject '{}' ({}-{})",
            subject.name,
            subject.start_year,
            subject.end_year
        );

        let query = SearchQuery::new(&self.config.site, subject)?;
        let windows = generate_windows(&query, subject, self.config.crawler.min_year, today);
        report.windows_planned = windows.len();
        if windows.is_empty() {
            return Ok(());
        }

        let pool = Arc::new(Semaphore::new(self.config.crawler.workers as usize));

        // Phase 1: split each window and walk its pages, collecting post
        // links deduplicated across the whole subject
        let mut seen_links: HashSet<String> = HashSet::new();
        let mut post_links: Vec<(String, i32)> = Vec::new();

        for window in windows {
            self.ensure_active(session)?;

            let parts =
                split_window(&self.fetcher, &query, &self.config.crawler, window, today).await;
            report.windows_final += parts.len();

            for part in parts {
                self.ensure_active(session)?;
                self.walk_window(
                    session,
                    &query,
                    &part,
                    &pool,
                    &mut seen_links,
                    &mut post_links,
                    report,
                )
                .await?;
            }
        }

        if post_links.is_empty() {
            tracing::warn!("No posts found for '{}'", subject.name);
            return Ok(());
        }
        tracing::info!(
            "Processing {} unique post links for '{}'",
            post_links.len(),
            subject.name
        );

        // Phase 2: extract every post in parallel, then reduce in
        // completion order
        self.ensure_active(session)?;

        let mut tasks = JoinSet::new();
        let mut handles = Vec::with_capacity(post_links.len());
        for (link, window_year) in post_links {
            let fetcher = Arc::clone(&self.fetcher);
            let pool = Arc::clone(&pool);
            let subject = subject.clone();
            let base = self.base.clone();
            let handle = tasks.spawn(async move {
                let Ok(_permit) = pool.acquire_owned().await else {
                    return Vec::new();
                };
                extract_post(&fetcher, &link, &subject, window_year, &base).await
            });
            handles.push(handle);
        }
        if !self.registry.set_batch(session, handles) {
            tasks.abort_all();
            return Err(TrawlError::Cancelled);
        }

        let total_posts = tasks.len();
        let mut processed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            self.ensure_active(session)?;
            processed += 1;
            match joined {
                Ok(items) => {
                    report.posts_processed += 1;
                    for item in items {
                        store.insert_item(item);
                    }
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!("Post extraction task failed: {}", e),
            }
            if processed % 25 == 0 || processed == total_posts {
                tracing::info!(
                    "'{}': {}/{} posts processed",
                    subject.name,
                    processed,
                    total_posts
                );
            }
        }

        Ok(())
    }

    /// Walks one finalized window: page 1 inline for the page count, the
    /// remaining pages as a parallel batch
    #[allow(clippy::too_many_arguments)]
    async fn walk_window(
        &self,
        session: SessionId,
        query: &SearchQuery,
        window: &SearchWindow,
        pool: &Arc<Semaphore>,
        seen_links: &mut HashSet<String>,
        post_links: &mut Vec<(String, i32)>,
        report: &mut SubjectReport,
    ) -> crate::Result<()> {
        let first = fetch_search_page(&self.fetcher, query, window, 1).await;
        report.pages_fetched += 1;
        let total_pages = first.total_pages;
        collect_links(window.year, first, seen_links, post_links);

        if total_pages <= 1 {
            return Ok(());
        }

        let mut tasks = JoinSet::new();
        let mut handles = Vec::with_capacity(total_pages as usize - 1);
        for page in 2..=total_pages {
            let fetcher = Arc::clone(&self.fetcher);
            let pool = Arc::clone(pool);
            let query = query.clone();
            let window = window.clone();
            let handle = tasks.spawn(async move {
                let Ok(_permit) = pool.acquire_owned().await else {
                    return PageScan::empty();
                };
                fetch_search_page(&fetcher, &query, &window, page).await
            });
            handles.push(handle);
        }
        if !self.registry.set_batch(session, handles) {
            tasks.abort_all();
            return Err(TrawlError::Cancelled);
        }

        while let Some(joined) = tasks.join_next().await {
            self.ensure_active(session)?;
            match joined {
                Ok(scan) => {
                    report.pages_fetched += 1;
                    collect_links(window.year, scan, seen_links, post_links);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!("Page fetch task failed: {}", e),
            }
        }

        Ok(())
    }

    fn ensure_active(&self, session: SessionId) -> crate::Result<()> {
        if self.registry.is_active(session) {
            Ok(())
        } else {
            Err(TrawlError::Cancelled)
        }
    }
}

/// Appends a scan's links that are new for this subject, tagged with the
/// originating window's year
fn collect_links(
    year: i32,
    scan: PageScan,
    seen: &mut HashSet<String>,
    out: &mut Vec<(String, i32)>,
) {
    for link in scan.links {
        if seen.insert(link.clone()) {
            out.push((link, year));
        }
    }
}
