//! CLI binary for renderscholar.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use renderscholar::{
    format_for_llm, run_pipeline, MiniLmEmbedder, Mode, PipelineRequest, RankingEngine,
    RenderConfig,
};
use scholar_search::{Collector, FileMarkers, SortOrder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Collect scholarly search results and rank them.
#[derive(Parser)]
#[command(name = "renderscholar", version, about)]
struct Cli {
    /// Search query.
    query: String,

    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Records to collect before ranking.
    #[arg(long)]
    pool_size: Option<usize>,

    /// Records to keep after ranking.
    #[arg(long = "filter-top-k")]
    top_k: Option<usize>,

    /// Ranking mode: balanced, recent, famous, influential, hot, semantic,
    /// single or bayesian. Unknown names rank as balanced.
    #[arg(long)]
    mode: Option<String>,

    /// Result ordering requested from the source (relevance or date).
    #[arg(long)]
    sort: Option<SortOrder>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Write output to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not pause for the operator when a challenge appears.
    #[arg(long)]
    no_wait: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Llm,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("renderscholar=info,scholar_search=info,ort=warn,hf_hub=warn")
        }))
        .init();

    let cli = Cli::parse();

    let mut config = RenderConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let request = PipelineRequest {
        query: cli.query.clone(),
        pool_size: config.ranking.pool_size,
        top_k: config.ranking.top_k,
        mode: config.ranking.mode,
        sort: config.ranking.sort,
    };

    let mut engine = RankingEngine::new().with_posterior(config.ranking.posterior.clone());
    if request.mode == Mode::Semantic {
        let embedder = tokio::task::spawn_blocking(MiniLmEmbedder::download_and_load)
            .await
            .context("embedding model loader panicked")??;
        engine = engine.with_embedder(Arc::new(embedder));
    }

    let markers = FileMarkers::new(&config.search.marker_dir, config.search.marker_poll());
    if config.search.wait_for_operator {
        eprintln!(
            "If an access challenge appears, solve it in a browser, paste the browser's \
             Cookie header into {}, then delete {}",
            config.search.clearance_cookie_path().display(),
            markers.challenge_path().display()
        );
    }
    let collector = Collector::new(config.search.clone(), markers)?;

    let output = tokio::select! {
        result = run_pipeline(&request, &collector, &engine) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down...");
            return Ok(());
        }
    };

    let rendered = match cli.format {
        Format::Json => serde_json::to_string_pretty(&output)?,
        Format::Llm => format_for_llm(&output.query, &output.ranked),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "results written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn apply_overrides(config: &mut RenderConfig, cli: &Cli) {
    if let Some(pool_size) = cli.pool_size {
        config.ranking.pool_size = pool_size;
    }
    if let Some(top_k) = cli.top_k {
        config.ranking.top_k = top_k;
    }
    if let Some(mode) = &cli.mode {
        config.ranking.mode = Mode::parse_or_default(mode);
    }
    if let Some(sort) = cli.sort {
        config.ranking.sort = sort;
    }
    if cli.no_wait {
        config.search.wait_for_operator = false;
    }
}
