//! Results page parsing.
//!
//! Turns the HTML of one results page into [`Record`]s using CSS selectors.
//! Every sub-field is optional: a missing heading, snippet or footer
//! degrades to the record defaults instead of failing the page.

use crate::error::SearchError;
use crate::links::canonical_source_link;
use crate::types::{Record, NO_TITLE};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Selector matching one result entry (and the results container).
pub const RESULTS_SELECTOR: &str = ".gs_ri, .gs_r, .gs_or";

/// Footer link text that carries the citation count.
const CITED_BY_MARKER: &str = "Cited by";

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("invalid selector {css}: {e:?}")))
}

fn year_pattern() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| {
        // SAFETY: constant pattern, verified by the tests below.
        Regex::new(r"\b(19|20)\d{2}\b").unwrap_or_else(|_| unreachable!("year pattern is valid"))
    })
}

/// Returns `true` if the page contains at least one results entry.
pub fn has_results(html: &str) -> bool {
    let Ok(sel) = selector(RESULTS_SELECTOR) else {
        return false;
    };
    Html::parse_document(html).select(&sel).next().is_some()
}

/// Parse one results page into records, in page order.
///
/// Nested matches of the entry selector (an inner `.gs_ri` inside its
/// `.gs_r` wrapper) are folded into their outermost entry so each result
/// yields exactly one record.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] only if a built-in selector fails to
/// compile; content problems never error.
pub fn parse_results_html(html: &str) -> Result<Vec<Record>, SearchError> {
    let document = Html::parse_document(html);

    let entry_sel = selector(RESULTS_SELECTOR)?;
    let title_sel = selector("h3 a")?;
    let snippet_sel = selector(".gs_rs")?;
    let authors_sel = selector(".gs_a")?;
    let footer_link_sel = selector(".gs_fl a")?;
    let document_sel = selector(".gs_or_ggsm a, .gs_ggsd a")?;

    let mut records = Vec::new();

    for entry in document.select(&entry_sel) {
        if nested_in_entry(&entry, &entry_sel) {
            continue;
        }

        let title_el = entry.select(&title_sel).next();
        let title = title_el
            .map(element_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());
        let primary_link = title_el
            .and_then(|el| el.value().attr("href"))
            .map(str::to_string);
        let source_link = primary_link.as_deref().map(canonical_source_link);

        let snippet = entry
            .select(&snippet_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let authors_and_year_text = entry
            .select(&authors_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let document_link = entry
            .select(&document_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(str::to_string);

        let citation_count = entry
            .select(&footer_link_sel)
            .map(element_text)
            .find(|text| text.contains(CITED_BY_MARKER))
            .and_then(|text| parse_citation_count(&text));

        let publication_year = extract_year(&authors_and_year_text);

        records.push(Record {
            title,
            primary_link,
            source_link,
            document_link,
            snippet,
            authors_and_year_text,
            citation_count,
            publication_year,
        });
    }

    tracing::debug!(count = records.len(), "results page parsed");
    Ok(records)
}

/// Parse the number out of a "Cited by N" link text.
///
/// Returns `None` for anything that is not a plain non-negative integer.
pub fn parse_citation_count(text: &str) -> Option<u64> {
    let digits = text.replace(CITED_BY_MARKER, "");
    let digits = digits.trim();
    match digits.parse::<u64>() {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::debug!(text, error = %e, "unparseable citation count");
            None
        }
    }
}

/// First four-digit year in 1900–2099 found in `text`.
pub fn extract_year(text: &str) -> Option<i32> {
    year_pattern()
        .find(text)
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn nested_in_entry(el: &ElementRef<'_>, entry_sel: &Selector) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| entry_sel.matches(&ancestor))
}
