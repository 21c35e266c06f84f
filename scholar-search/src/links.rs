//! Results page URL construction and link canonicalisation.

use crate::config::PAGE_SIZE;
use crate::types::SortOrder;
use url::form_urlencoded;

/// Host root of the results source.
pub const HOST_ROOT: &str = "https://scholar.google.com";

/// Build the URL of the results page starting at `page_index * PAGE_SIZE`.
///
/// The query is form-encoded (spaces become `+`).
///
/// # Examples
///
/// ```
/// use scholar_search::links::page_url;
/// use scholar_search::SortOrder;
///
/// let url = page_url("bayesian regression", 2, SortOrder::Relevance);
/// assert_eq!(
///     url,
///     "https://scholar.google.com/scholar?hl=en&q=bayesian+regression&start=20&scisbd=0"
/// );
/// ```
pub fn page_url(query: &str, page_index: usize, sort: SortOrder) -> String {
    page_url_at(HOST_ROOT, query, page_index, sort)
}

/// Like [`page_url`], against an alternative host root (mirrors, test servers).
pub fn page_url_at(base: &str, query: &str, page_index: usize, sort: SortOrder) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let start = page_index * PAGE_SIZE;
    format!(
        "{}/scholar?hl=en&q={encoded}&start={start}&scisbd={}",
        base.trim_end_matches('/'),
        sort.query_value()
    )
}

/// Make a title link absolute.
///
/// Links into the results source itself (`/scholar…`) are served
/// root-relative; those get the host root prefixed. Every other link is
/// returned unchanged.
pub fn canonical_source_link(href: &str) -> String {
    if href.starts_with("/scholar") {
        format!("{HOST_ROOT}{href}")
    } else {
        href.to_string()
    }
}
