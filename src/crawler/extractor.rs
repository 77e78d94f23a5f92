//! Post page media extraction
//!
//! Fetches one forum post page, decides which post blocks on it belong to
//! the subject, and pulls out the media links those blocks embed.
//!
//! Matching is two-tiered. If the page title matches any part of the
//! subject's name, the whole page qualifies and every block is scanned;
//! a single short name part is enough to claim the page, so unrelated
//! pages can over-match. Without a title match, each block qualifies on
//! its own visible text or author attribute.
//!
//! Extraction is a pure parse: candidates are returned to the caller, and
//! the per-subject seen-set decides at aggregation time what is kept.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::windows::Subject;
use crate::media::{classify_image_url, is_rejected_url, MediaItem, MediaKind};
use chrono::DateTime;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Fetches a post page and extracts the subject's media from it
///
/// Any failure while fetching or processing the post is logged and yields
/// an empty result; one bad post never aborts its siblings.
pub async fn extract_post(
    fetcher: &Fetcher,
    post_url: &str,
    subject: &Subject,
    fallback_year: i32,
    base: &Url,
) -> Vec<MediaItem> {
    let url = match Url::parse(post_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Failed to process post {}: {}", post_url, e);
            return Vec::new();
        }
    };

    match fetcher.fetch(&url).await {
        Ok(body) => extract_post_media(&body, post_url, subject, fallback_year, base),
        Err(e) => {
            tracing::error!("Failed to process post {}: {}", post_url, e);
            Vec::new()
        }
    }
}

/// Extracts the subject's media candidates from a post page body
pub fn extract_post_media(
    body: &str,
    post_url: &str,
    subject: &Subject,
    fallback_year: i32,
    base: &Url,
) -> Vec<MediaItem> {
    let html = Html::parse_document(body);

    let page_title = extract_page_title(&html);
    let name_lower = subject.name.to_lowercase();
    let title_matched = title_matches(&page_title, &name_lower);
    if title_matched {
        tracing::info!(
            "Page title '{}' matches subject '{}', taking all media in {}",
            page_title,
            subject.name,
            post_url
        );
    }

    let articles = select_articles(&html, post_url);
    if articles.is_empty() {
        tracing::warn!("No post blocks found in {}", post_url);
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut any_matched = false;

    for article in articles {
        if !title_matched && !block_matches(&article, &name_lower) {
            continue;
        }
        any_matched = true;

        let date = extract_post_date(&article)
            .unwrap_or_else(|| format!("{}-01-01", fallback_year));

        if let Ok(year) = date[..4].parse::<i32>() {
            if year < subject.start_year || year > subject.end_year {
                tracing::debug!("Skipping post block outside year range: {}", date);
                continue;
            }
        }

        scan_block_media(&article, &date, base, &mut items);
    }

    if !any_matched {
        tracing::info!("No post blocks matched subject '{}' in {}", subject.name, post_url);
    }

    items
}

/// Reads the page's overall title, lowercased
fn extract_page_title(html: &Html) -> String {
    let Ok(selector) = Selector::parse("div.p-title h1.p-title-value") else {
        return String::new();
    };

    html.select(&selector)
        .next()
        .map(|el| {
            el.text()
                .collect::<String>()
                .trim()
                .to_lowercase()
        })
        .unwrap_or_default()
}

/// Page-level match: any whitespace-delimited part of the subject's name
/// appearing as a prefix, suffix, or hyphen-insensitive substring of the
/// title claims the whole page
fn title_matches(page_title: &str, name_lower: &str) -> bool {
    if page_title.is_empty() {
        return false;
    }
    let dehyphenated = page_title.replace('-', " ");
    name_lower.split_whitespace().any(|part| {
        page_title.starts_with(part)
            || page_title.ends_with(part)
            || dehyphenated.contains(part)
    })
}

/// Selects the post blocks in scope for this URL
///
/// A URL addressing a specific post (`post-NNN`) narrows the scan to that
/// block; otherwise every block on the page is considered.
fn select_articles<'a>(html: &'a Html, post_url: &str) -> Vec<ElementRef<'a>> {
    if let Some(id) = post_id_from_url(post_url) {
        let selector = format!(
            r#"article[data-content="post-{id}"][id="js-post-{id}"]"#
        );
        let parsed = Selector::parse(&selector);
        if let Ok(sel) = parsed {
            return html.select(&sel).collect();
        }
    }

    match Selector::parse("article") {
        Ok(sel) => html.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

/// Pulls the numeric id out of the first `post-NNN` marker in a URL
fn post_id_from_url(url: &str) -> Option<String> {
    let mut rest = url;
    while let Some(idx) = rest.find("post-") {
        let tail = &rest[idx + 5..];
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return Some(digits);
        }
        rest = tail;
    }
    None
}

/// Block-level match on visible text or the author attribute
fn block_matches(article: &ElementRef<'_>, name_lower: &str) -> bool {
    let text = article.text().collect::<Vec<_>>().join(" ").to_lowercase();
    if text.contains(name_lower) {
        return true;
    }
    article
        .value()
        .attr("data-author")
        .map(|author| author.to_lowercase().contains(name_lower))
        .unwrap_or(false)
}

/// Reads the block's publish date from its timestamp marker
fn extract_post_date(article: &ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("time.u-dt").ok()?;
    let time = article.select(&selector).next()?;
    let datetime = time.value().attr("datetime")?;

    DateTime::parse_from_str(datetime, "%Y-%m-%dT%H:%M:%S%z")
        .ok()
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}

/// Scans one block's media carriers and appends surviving candidates
fn scan_block_media(
    article: &ElementRef<'_>,
    date: &str,
    base: &Url,
    items: &mut Vec<MediaItem>,
) {
    let carriers: [(&str, Option<MediaKind>); 3] = [
        ("img[src]", None),
        ("video[src]", Some(MediaKind::Video)),
        ("source[src]", Some(MediaKind::Video)),
    ];

    for (selector_str, forced_kind) in carriers {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in article.select(&selector) {
            let Some(src) = element.value().attr("src") else {
                continue;
            };
            let Some(url) = resolve_media_url(src, base) else {
                continue;
            };
            if is_rejected_url(&url) {
                tracing::debug!("Skipping unwanted media: {}", url);
                continue;
            }
            let kind = forced_kind.unwrap_or_else(|| classify_image_url(&url));
            items.push(MediaItem {
                kind,
                url,
                date: date.to_string(),
            });
        }
    }
}

/// Resolves a media src against the site origin
fn resolve_media_url(src: &str, base: &Url) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    // Data URIs survive the join with their scheme intact and are caught
    // by the rejection check downstream
    base.join(src).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://forum.example.com/").unwrap()
    }

    fn subject() -> Subject {
        Subject::new("Jane Doe", 2019, 2021, false)
    }

    fn extract(body: &str) -> Vec<MediaItem> {
        extract_post_media(
            body,
            "https://forum.example.com/threads/t.1/",
            &subject(),
            2020,
            &base(),
        )
    }

    #[test]
    fn test_title_match_takes_all_blocks() {
        let body = r#"
            <div class="p-title"><h1 class="p-title-value">Jane Doe — New Photos</h1></div>
            <article data-author="someone else">
                <time class="u-dt" datetime="2020-05-04T10:00:00+0000"></time>
                <img src="https://cdn.example.com/a.jpg">
            </article>
        "#;
        let items = extract(body);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://cdn.example.com/a.jpg");
        assert_eq!(items[0].kind, MediaKind::Image);
        assert_eq!(items[0].date, "2020-05-04");
    }

    #[test]
    fn test_title_suffix_and_hyphen_matching() {
        assert!(title_matches("photos of jane", "jane doe"));
        assert!(title_matches("jane's gallery", "jane doe"));
        assert!(title_matches("best-of-doe-collection", "jane doe"));
        assert!(!title_matches("unrelated topic", "jane doe"));
        assert!(!title_matches("", "jane doe"));
    }

    #[test]
    fn test_block_match_by_author_attribute() {
        let body = r#"
            <div class="p-title"><h1 class="p-title-value">Mixed thread</h1></div>
            <article data-author="Jane Doe">
                <img src="/media/b.jpg">
            </article>
            <article data-author="Somebody">
                <img src="/media/c.jpg">
            </article>
        "#;
        let items = extract(body);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://forum.example.com/media/b.jpg");
    }

    #[test]
    fn test_block_match_by_visible_text() {
        let body = r#"
            <article data-author="fan123">
                <p>Some shots of Jane Doe from last week</p>
                <img src="/media/d.jpg">
            </article>
        "#;
        let items = extract(body);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_unmatched_blocks_are_skipped() {
        let body = r#"
            <article data-author="other">
                <p>Nothing relevant here</p>
                <img src="/media/e.jpg">
            </article>
        "#;
        assert!(extract(body).is_empty());
    }

    #[test]
    fn test_missing_timestamp_uses_window_fallback() {
        let body = r#"
            <article data-author="Jane Doe">
                <img src="/media/f.jpg">
            </article>
        "#;
        let items = extract(body);
        assert_eq!(items[0].date, "2020-01-01");
    }

    #[test]
    fn test_blocks_outside_year_range_are_dropped() {
        let body = r#"
            <article data-author="Jane Doe">
                <time class="u-dt" datetime="2015-03-01T08:00:00+0000"></time>
                <img src="/media/old.jpg">
            </article>
            <article data-author="Jane Doe">
                <time class="u-dt" datetime="2020-03-01T08:00:00+0000"></time>
                <img src="/media/kept.jpg">
            </article>
        "#;
        let items = extract(body);
        assert_eq!(items.len(), 1);
        assert!(items[0].url.ends_with("kept.jpg"));
    }

    #[test]
    fn test_gif_and_video_classification() {
        let body = r#"
            <article data-author="Jane Doe">
                <time class="u-dt" datetime="2020-05-04T10:00:00+0000"></time>
                <img src="https://cdn.example.com/anim.GIF">
                <video src="https://cdn.example.com/clip.mp4"></video>
                <video><source src="https://cdn.example.com/alt.webm"></video>
            </article>
        "#;
        let items = extract(body);
        let kinds: Vec<MediaKind> = items.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![MediaKind::Gif, MediaKind::Video, MediaKind::Video]
        );
    }

    #[test]
    fn test_denylisted_and_data_uris_rejected() {
        let body = r#"
            <div class="p-title"><h1 class="p-title-value">Jane Doe — New Photos</h1></div>
            <article>
                <time class="u-dt" datetime="2020-05-04T10:00:00+0000"></time>
                <img src="https://site/a.jpg">
                <img src="https://site/data/avatars/s/0/123.jpg">
                <img src="https://site/addonflare/awardsystem/icons/star.png">
                <img src="data:image/png;base64,AAAA">
                <img src="https://site/banners/premium-banner.png">
            </article>
        "#;
        let items = extract(body);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://site/a.jpg");
    }

    #[test]
    fn test_post_id_narrows_scope() {
        let body = r#"
            <article data-content="post-42" id="js-post-42" data-author="Jane Doe">
                <img src="/media/wanted.jpg">
            </article>
            <article data-content="post-43" id="js-post-43" data-author="Jane Doe">
                <img src="/media/ignored.jpg">
            </article>
        "#;
        let items = extract_post_media(
            body,
            "https://forum.example.com/threads/t.1/post-42",
            &subject(),
            2020,
            &base(),
        );
        assert_eq!(items.len(), 1);
        assert!(items[0].url.ends_with("wanted.jpg"));
    }

    #[test]
    fn test_post_id_parsing() {
        assert_eq!(post_id_from_url("https://f/threads/t.1/post-987"), Some("987".into()));
        assert_eq!(post_id_from_url("https://f/threads/my-post-about-x.1/"), None);
        assert_eq!(
            post_id_from_url("https://f/threads/my-post-about-x.1/post-55"),
            Some("55".into())
        );
        assert_eq!(post_id_from_url("https://f/threads/t.1/"), None);
    }

    #[test]
    fn test_jane_doe_scenario() {
        // One post titled for the subject, one real image, one chrome icon
        let body = r#"
            <div class="p-title"><h1 class="p-title-value">Jane Doe — New Photos</h1></div>
            <article>
                <time class="u-dt" datetime="2020-07-15T12:00:00+0000"></time>
                <img src="https://site/a.jpg">
                <img src="https://site/data/avatars/badge.png">
            </article>
        "#;
        let items = extract_post_media(
            body,
            "https://forum.example.com/threads/jane.1/",
            &Subject::new("Jane Doe", 2020, 2020, false),
            2020,
            &base(),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, MediaKind::Image);
        assert_eq!(items[0].url, "https://site/a.jpg");
    }

    #[test]
    fn test_timezone_offset_variants_parse() {
        let body = r#"
            <article data-author="Jane Doe">
                <time class="u-dt" datetime="2020-05-04T10:00:00+0530"></time>
                <img src="/media/tz.jpg">
            </article>
        "#;
        let items = extract(body);
        assert_eq!(items[0].date, "2020-05-04");
    }
}
