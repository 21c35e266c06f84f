//! Ranking modes and their weight table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weights of the three lexical-strategy terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub similarity: f64,
    pub citations: f64,
    pub recency: f64,
}

impl Weights {
    pub const fn new(similarity: f64, citations: f64, recency: f64) -> Self {
        Self {
            similarity,
            citations,
            recency,
        }
    }
}

/// Fixed weights used by the embedding strategy.
pub const SEMANTIC_WEIGHTS: Weights = Weights::new(0.6, 0.25, 0.15);

/// A named ranking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Even mix of relevance, citations and recency.
    #[default]
    Balanced,
    /// Favour new work.
    Recent,
    /// Favour heavily cited work.
    Famous,
    /// Citations first, relevance second.
    Influential,
    /// Recent and cited.
    Hot,
    /// Embedding similarity.
    Semantic,
    /// Pure title similarity, one result.
    Single,
    /// Posterior-regression weighting.
    Bayesian,
}

/// How a mode scores records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weighting {
    Lexical(Weights),
    Embedding,
    Posterior,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Balanced,
        Mode::Recent,
        Mode::Famous,
        Mode::Influential,
        Mode::Hot,
        Mode::Semantic,
        Mode::Single,
        Mode::Bayesian,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Recent => "recent",
            Self::Famous => "famous",
            Self::Influential => "influential",
            Self::Hot => "hot",
            Self::Semantic => "semantic",
            Self::Single => "single",
            Self::Bayesian => "bayesian",
        }
    }

    /// The mode's entry in the weight table.
    pub fn weighting(&self) -> Weighting {
        match self {
            Self::Balanced => Weighting::Lexical(Weights::new(0.5, 0.3, 0.2)),
            Self::Recent => Weighting::Lexical(Weights::new(0.3, 0.1, 0.6)),
            Self::Famous => Weighting::Lexical(Weights::new(0.2, 0.7, 0.1)),
            Self::Influential => Weighting::Lexical(Weights::new(0.3, 0.5, 0.2)),
            Self::Hot => Weighting::Lexical(Weights::new(0.3, 0.3, 0.4)),
            Self::Single => Weighting::Lexical(Weights::new(1.0, 0.0, 0.0)),
            Self::Semantic => Weighting::Embedding,
            Self::Bayesian => Weighting::Posterior,
        }
    }

    /// Upper bound on result count imposed by the mode itself.
    pub fn result_cap(&self) -> Option<usize> {
        match self {
            Self::Single => Some(1),
            _ => None,
        }
    }

    /// Resolve a mode name, falling back to [`Mode::Balanced`] for
    /// anything unrecognised.
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(mode = name, "unknown ranking mode; using balanced");
            Self::default()
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| format!("unknown ranking mode: {s}"))
    }
}
