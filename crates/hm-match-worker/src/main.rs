use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

use hm_common::logging::init_tracing;
use hm_common::matching::{MatchingEngine, WeightTriple};
use hm_common::rerank::oracle::HttpJudgmentOracle;
use hm_common::rerank::{RerankConfig, RerankOrchestrator};
use hm_common::store::pgvector::PgVectorStore;
use hm_common::store::{CandidateRetriever, MatchFilters, RetrievalError};

#[derive(Parser, Debug)]
#[command(
    name = "hm-match-worker",
    about = "Rank stored documents against a CV or JD and print the matches as JSON"
)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    db_url: String,

    /// Document id of the source CV or JD
    #[arg(long)]
    source_id: i64,

    /// Number of matches to return
    #[arg(long, default_value_t = 10)]
    top_k: usize,

    /// Structural filters as JSON (min_years, max_years, required_skills, domains, seniority)
    #[arg(long)]
    filters: Option<String>,

    /// Explicit channel weights as JSON, overriding adaptive weighting
    #[arg(long)]
    weights: Option<String>,

    /// Rerank the top matches through the judgment oracle
    #[arg(long, default_value_t = false)]
    rerank: bool,

    /// Cap on oracle calls when reranking
    #[arg(long)]
    max_rerank: Option<usize>,
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("hm-match-worker");

    let args = Cli::parse();

    let filters: MatchFilters = match &args.filters {
        Some(raw) => serde_json::from_str(raw)?,
        None => MatchFilters::default(),
    };
    let weights: Option<WeightTriple> = match &args.weights {
        Some(raw) => Some(serde_json::from_str(raw)?),
        None => None,
    };

    let store = PgVectorStore::from_url(&args.db_url)?;
    let engine = MatchingEngine::with_defaults(store);

    let ranked = engine
        .rank(args.source_id, &filters, weights, args.top_k)
        .await?;
    info!(
        source_id = args.source_id,
        matches = ranked.len(),
        "ranking complete"
    );

    if !args.rerank {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    let source = engine
        .store()
        .fetch_document(args.source_id)
        .await?
        .ok_or(RetrievalError::NotFound(args.source_id))?;

    let mut config = RerankConfig::from_env();
    if let Some(max) = args.max_rerank {
        config.max_candidates = max;
    }

    let orchestrator = RerankOrchestrator::new(HttpJudgmentOracle::from_env(), config);
    let reranked = orchestrator.rerank(&source.profile, &ranked).await;
    info!(
        source_id = args.source_id,
        reranked = reranked.len(),
        "rerank complete"
    );

    println!("{}", serde_json::to_string_pretty(&reranked)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("hm-match-worker failed: {err}");
        std::process::exit(1);
    }
}
