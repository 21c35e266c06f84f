//! Plain-text rendering of ranked results for pasting into an LLM prompt.

use crate::ranking::ScoredRecord;
use std::fmt::Write;

/// Render `ranked` as a numbered plain-text listing.
///
/// ```text
/// Search results for "graph neural networks" (2 papers)
///
/// 1. Title
///    Authors: A Author - Journal, 2020
///    Year: 2020 | Citations: 42
///    Link: https://...
///    Summary: ...
/// ```
///
/// Unknown years render as `?`, unknown citation counts as `0` and a
/// missing link as `#`.
pub fn format_for_llm(query: &str, ranked: &[ScoredRecord]) -> String {
    let noun = if ranked.len() == 1 { "paper" } else { "papers" };
    let mut out = format!("Search results for \"{query}\" ({} {noun})\n", ranked.len());

    for (i, scored) in ranked.iter().enumerate() {
        let r = &scored.record;
        let year = r
            .publication_year
            .map_or_else(|| "?".to_string(), |y| y.to_string());
        let cites = r.citation_count.unwrap_or(0);
        let authors = if r.authors_and_year_text.is_empty() {
            "?"
        } else {
            r.authors_and_year_text.as_str()
        };

        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "\n{n}. {title}\n   Authors: {authors}\n   Year: {year} | Citations: {cites}\n   Link: {link}\n",
            n = i + 1,
            title = r.title,
            link = r.best_link().unwrap_or("#"),
        );
        if !r.snippet.is_empty() {
            let _ = writeln!(out, "   Summary: {}", r.snippet);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_search::Record;

    fn scored(record: Record) -> ScoredRecord {
        ScoredRecord { record, score: 0.0 }
    }

    #[test]
    fn empty_listing_has_header_only() {
        let text = format_for_llm("anything", &[]);
        assert_eq!(text, "Search results for \"anything\" (0 papers)\n");
    }

    #[test]
    fn renders_known_fields() {
        let record = Record {
            title: "Deep Learning".into(),
            authors_and_year_text: "Y LeCun, Y Bengio, G Hinton - nature, 2015".into(),
            citation_count: Some(500),
            publication_year: Some(2015),
            source_link: Some("https://example.org/src".into()),
            document_link: Some("https://example.org/paper.pdf".into()),
            snippet: "Deep learning allows computational models...".into(),
            ..Default::default()
        };
        let text = format_for_llm("deep learning", &[scored(record)]);
        assert!(text.starts_with("Search results for \"deep learning\" (1 paper)\n"));
        assert!(text.contains("\n1. Deep Learning\n"));
        assert!(text.contains("Authors: Y LeCun, Y Bengio, G Hinton - nature, 2015"));
        assert!(text.contains("Year: 2015 | Citations: 500"));
        assert!(text.contains("Link: https://example.org/paper.pdf"));
        assert!(text.contains("Summary: Deep learning allows"));
    }

    #[test]
    fn unknowns_use_placeholders() {
        let text = format_for_llm("q", &[scored(Record::titled("Bare"))]);
        assert!(text.contains("Authors: ?"));
        assert!(text.contains("Year: ? | Citations: 0"));
        assert!(text.contains("Link: #"));
        assert!(!text.contains("Summary:"));
    }

    #[test]
    fn entries_are_numbered_in_order() {
        let text = format_for_llm(
            "q",
            &[scored(Record::titled("First")), scored(Record::titled("Second"))],
        );
        let first = text.find("1. First").expect("first entry");
        let second = text.find("2. Second").expect("second entry");
        assert!(first < second);
    }
}
