//! Augur scoring entrypoint.
//!
//! Loads the draw history, scores candidates in one batched pass and prints the ranked
//! report as JSON. Configured entirely through `AUGUR_*` environment variables.

use std::time::Instant;

use mimalloc::MiMalloc;

use augur::cache::LikelihoodCache;
use augur::config::Config;
use augur::draw::{History, load_candidates};
use augur::model::{LikelihoodModel, ModelConfig};
use augur::scoring::{
    CandidateGenerator, CandidateScorer, ContextConfig, ScoringContext, ScoringReport,
    ScoringWeights,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let history = History::load(config.require_history_path()?, config.num_numbers)?;
    let ctx = ScoringContext::from_history(&history, &ContextConfig::from(&config))?;

    let model_config = match &config.model_path {
        Some(path) => ModelConfig::new(path.clone(), config.num_numbers as usize),
        None => {
            tracing::warn!("No AUGUR_MODEL_PATH configured, scoring with the stub likelihood");
            ModelConfig::stub(config.num_numbers as usize)
        }
    }
    .with_max_batch_size(config.max_batch_size);
    let model = LikelihoodModel::load(model_config)?;

    let candidates = match &config.candidates_path {
        Some(path) => load_candidates(path, config.num_numbers)?,
        None => {
            let seed = if config.seed == 0 {
                history.fingerprint()
            } else {
                config.seed
            };
            let probabilities = ctx.ensemble_probabilities(&model)?;
            CandidateGenerator::new(seed).generate(
                &probabilities,
                config.draw_size,
                config.num_candidates,
            )?
        }
    };

    tracing::info!(
        history_draws = history.len(),
        candidates = candidates.len(),
        model_loaded = model.is_model_loaded(),
        max_batch_size = config.max_batch_size,
        "Augur starting"
    );

    let cache = config
        .cache_enabled()
        .then(|| LikelihoodCache::with_capacity(config.cache_capacity));
    let scorer = CandidateScorer::new(model, ScoringWeights::default(), cache)?;

    let started = Instant::now();
    let ranked = scorer.rank(&candidates, &ctx, config.top_n)?;
    let elapsed_micros = started.elapsed().as_micros();

    tracing::info!(
        elapsed_micros = elapsed_micros as u64,
        model_passes = ranked.stats.model_passes,
        "Scoring complete"
    );

    let report = ScoringReport {
        model_loaded: scorer.model().is_model_loaded(),
        history_draws: history.len(),
        elapsed_micros,
        stats: ranked.stats,
        ranked: ranked.candidates,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
