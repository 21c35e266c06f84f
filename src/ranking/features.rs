//! Per-record scoring terms shared by the strategies.
//!
//! Unknown citation counts and years contribute exactly `0.0` to their
//! term; they are never imputed.

use scholar_search::Record;
use similar::TextDiff;

/// Divisor applied to `ln(1 + citations)`.
pub const CITATION_SCALE: f64 = 10.0;

/// Year at which the recency term is zero.
pub const RECENCY_BASE_YEAR: i32 = 2000;

/// Years over which the recency term grows by 1.0.
pub const RECENCY_SPAN_YEARS: f64 = 25.0;

/// Decay constant, in years, of the posterior strategy's recency feature.
pub const RECENCY_DECAY_YEARS: f64 = 5.0;

/// Character-sequence similarity ratio in `0.0..=1.0`.
///
/// Both sides are lowercased. `2 * matches / (len_a + len_b)` over a
/// character diff.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    f64::from(TextDiff::from_chars(a.as_str(), b.as_str()).ratio())
}

/// Query similarity against the title, or the snippet when the record has
/// no title. `0.0` when both are missing.
pub fn lexical_similarity(query: &str, record: &Record) -> f64 {
    if record.has_title() {
        sequence_ratio(query, &record.title)
    } else if !record.snippet.is_empty() {
        sequence_ratio(query, &record.snippet)
    } else {
        0.0
    }
}

/// `ln(1 + citations) / 10`; unknown → `0.0`.
pub fn citation_term(record: &Record) -> f64 {
    record
        .citation_count
        .map_or(0.0, |c| (c as f64).ln_1p() / CITATION_SCALE)
}

/// `max(0, (year - 2000) / 25)`; unknown → `0.0`. Not capped above.
pub fn recency_term(record: &Record) -> f64 {
    record.publication_year.map_or(0.0, |year| {
        (f64::from(year - RECENCY_BASE_YEAR) / RECENCY_SPAN_YEARS).max(0.0)
    })
}

/// Citations per year since publication.
///
/// Age is `max(1, now - year + 1)`; an unknown year counts as published
/// this year and unknown citations as zero.
pub fn citations_per_year(record: &Record, current_year: i32) -> f64 {
    let cites = record.citation_count.unwrap_or(0) as f64;
    let year = record.publication_year.unwrap_or(current_year);
    let age = (current_year - year + 1).max(1);
    cites / f64::from(age)
}

/// `exp(-(now - year) / 5)`; unknown → `0.0`.
pub fn recency_decay(record: &Record, current_year: i32) -> f64 {
    record.publication_year.map_or(0.0, |year| {
        (-f64::from(current_year - year) / RECENCY_DECAY_YEARS).exp()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_search::NO_TITLE;

    fn record(title: &str, snippet: &str) -> Record {
        Record {
            title: title.to_string(),
            snippet: snippet.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn identical_strings_ratio_one() {
        assert!((sequence_ratio("Deep Learning", "deep learning") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_strings_ratio_zero() {
        assert!(sequence_ratio("abc", "xyz").abs() < 1e-9);
    }

    #[test]
    fn partial_overlap_between_bounds() {
        let r = sequence_ratio("deep learning", "shallow learning");
        assert!(r > 0.3 && r < 1.0, "ratio {r}");
    }

    #[test]
    fn similarity_uses_title_first() {
        let rec = record("Deep Learning", "unrelated words");
        assert!((lexical_similarity("deep learning", &rec) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_falls_back_to_snippet() {
        let rec = record(NO_TITLE, "deep learning");
        assert!((lexical_similarity("deep learning", &rec) - 1.0).abs() < 1e-9);
        let rec = record("", "deep learning");
        assert!((lexical_similarity("deep learning", &rec) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_zero_without_text() {
        let rec = record(NO_TITLE, "");
        assert_eq!(lexical_similarity("deep learning", &rec), 0.0);
    }

    #[test]
    fn unknown_citations_contribute_zero() {
        assert_eq!(citation_term(&Record::default()), 0.0);
    }

    #[test]
    fn citation_term_is_scaled_log() {
        let rec = Record {
            citation_count: Some(500),
            ..Default::default()
        };
        assert!((citation_term(&rec) - (501f64).ln() / 10.0).abs() < 1e-12);
        let zero = Record {
            citation_count: Some(0),
            ..Default::default()
        };
        assert_eq!(citation_term(&zero), 0.0);
    }

    #[test]
    fn unknown_year_contributes_zero() {
        assert_eq!(recency_term(&Record::default()), 0.0);
        assert_eq!(recency_decay(&Record::default(), 2025), 0.0);
    }

    #[test]
    fn recency_term_clamps_below_and_not_above() {
        let old = Record {
            publication_year: Some(1990),
            ..Default::default()
        };
        assert_eq!(recency_term(&old), 0.0);
        let new = Record {
            publication_year: Some(2050),
            ..Default::default()
        };
        assert!((recency_term(&new) - 2.0).abs() < 1e-12);
        let mid = Record {
            publication_year: Some(2015),
            ..Default::default()
        };
        assert!((recency_term(&mid) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn citations_per_year_uses_age() {
        let rec = Record {
            citation_count: Some(100),
            publication_year: Some(2016),
            ..Default::default()
        };
        // age = 2025 - 2016 + 1 = 10
        assert!((citations_per_year(&rec, 2025) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn citations_per_year_unknown_year_is_this_year() {
        let rec = Record {
            citation_count: Some(7),
            ..Default::default()
        };
        assert!((citations_per_year(&rec, 2025) - 7.0).abs() < 1e-12);
        let future = Record {
            citation_count: Some(7),
            publication_year: Some(2030),
            ..Default::default()
        };
        assert!((citations_per_year(&future, 2025) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn recency_decay_halves_scale() {
        let rec = Record {
            publication_year: Some(2020),
            ..Default::default()
        };
        assert!((recency_decay(&rec, 2025) - (-1.0f64).exp()).abs() < 1e-12);
        let this_year = Record {
            publication_year: Some(2025),
            ..Default::default()
        };
        assert!((recency_decay(&this_year, 2025) - 1.0).abs() < 1e-12);
    }
}
