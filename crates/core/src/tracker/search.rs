//! Duplicate search is advisory: failures become warnings and an empty list.

use std::future::Future;

use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::http::{pause, SEARCH_PAUSE};

use super::UploadError;

/// Await `search`, pause, and swallow any error.
pub async fn advisory<F>(tracker: &str, search: F) -> Vec<String>
where
    F: Future<Output = Result<Vec<String>, UploadError>>,
{
    let result = search.await;
    pause(SEARCH_PAUSE).await;

    match result {
        Ok(dupes) => {
            info!(tracker = %tracker, count = dupes.len(), "Duplicate search finished");
            dupes
        }
        Err(e) => {
            warn!(tracker = %tracker, error = %e, "Duplicate search failed, assuming no duplicates");
            Vec::new()
        }
    }
}

/// `title` attributes of links to `details.php?id=N` pages, skipping links
/// that carry extra query parameters.
pub fn scrape_detail_titles(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"a[href^="details.php?id="]"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|a| a.value().attr("href").is_some_and(|h| !h.contains('&')))
        .filter_map(|a| a.value().attr("title").map(str::to_string))
        .collect()
}
