//! Batched vs per-candidate likelihood scoring.
//!
//! Compares one stacked forward pass against one pass per candidate, for the stub
//! baseline and a randomly initialised CVAE.

use std::hint::black_box;

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use augur::draw::{CandidateSet, History};
use augur::model::{CvaeArchitecture, LikelihoodModel, ModelConfig};
use augur::scoring::{
    CandidateGenerator, CandidateScorer, ContextConfig, ScoringContext, ScoringWeights,
};

const POOL: u32 = 49;
const DRAW_SIZE: usize = 6;

fn fixture(num_candidates: usize) -> (ScoringContext, Vec<CandidateSet>) {
    let uniform = vec![1.0 / POOL as f32; POOL as usize];
    let draws: Vec<Vec<u32>> = CandidateGenerator::new(42)
        .generate(&uniform, DRAW_SIZE, 100)
        .unwrap()
        .into_iter()
        .map(|set| set.numbers().to_vec())
        .collect();
    let history = History::from_numbers(POOL, draws).unwrap();
    let ctx = ScoringContext::from_history(&history, &ContextConfig::default()).unwrap();

    let candidates = CandidateGenerator::new(7)
        .generate(ctx.iching().probabilities(), DRAW_SIZE, num_candidates)
        .unwrap();
    (ctx, candidates)
}

fn cvae_model(varmap: &VarMap) -> LikelihoodModel {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
    LikelihoodModel::from_var_builder(
        vb,
        CvaeArchitecture::new(POOL as usize),
        ModelConfig::stub(POOL as usize),
    )
    .unwrap()
}

fn bench_likelihood(c: &mut Criterion) {
    let varmap = VarMap::new();
    let mut group = c.benchmark_group("likelihood");

    for num_candidates in [50, 200] {
        let (ctx, candidates) = fixture(num_candidates);

        for (label, model) in [
            ("stub", LikelihoodModel::stub(POOL as usize).unwrap()),
            ("cvae", cvae_model(&varmap)),
        ] {
            let scorer = CandidateScorer::new(model, ScoringWeights::default(), None).unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("{label}/batch"), num_candidates),
                &candidates,
                |bench, candidates| {
                    bench.iter(|| scorer.score_batch(black_box(candidates), &ctx).unwrap())
                },
            );
            group.bench_with_input(
                BenchmarkId::new(format!("{label}/sequential"), num_candidates),
                &candidates,
                |bench, candidates| {
                    bench.iter(|| scorer.score_sequential(black_box(candidates), &ctx).unwrap())
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_likelihood);
criterion_main!(benches);
