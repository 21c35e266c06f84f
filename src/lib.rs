//! renderscholar: collect scholarly search results and rank them.
//!
//! Records come from [`scholar_search`], which pages through the results
//! source and hands access challenges to a human operator. This crate ranks
//! the collected pool and renders the short list.
//!
//! # Architecture
//!
//! - **Ranking**: [`RankingEngine`] resolves a [`Mode`] into a scoring
//!   strategy (lexical weighting, embedding similarity or posterior
//!   regression), sorts stably and truncates to top-K
//! - **Embedding**: [`MiniLmEmbedder`] runs `all-MiniLM-L6-v2` via ONNX
//!   Runtime for the semantic mode
//! - **Pipeline**: [`run_pipeline`] collects, ranks and returns a
//!   serializable [`PipelineOutput`]
//! - **Output**: JSON, or the plain-text [`format_for_llm`] listing

pub mod config;
pub mod embedding;
pub mod error;
pub mod llm_view;
pub mod pipeline;
pub mod ranking;

pub use config::{RankingConfig, RenderConfig};
pub use embedding::{Embedder, MiniLmEmbedder};
pub use error::{RankError, Result};
pub use llm_view::format_for_llm;
pub use pipeline::{run_pipeline, run_pipeline_with, PipelineOutput, PipelineRequest};
pub use ranking::{Mode, RankingEngine, ScoredRecord, ScoringStrategy};
