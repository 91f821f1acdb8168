use super::*;
use candle_nn::VarMap;
use std::path::PathBuf;

const POOL: usize = 12;

fn candidate(numbers: &[u32]) -> CandidateSet {
    CandidateSet::new(numbers.to_vec(), POOL as u32).unwrap()
}

fn sample_candidates() -> Vec<CandidateSet> {
    vec![
        candidate(&[1, 2, 3]),
        candidate(&[4, 8, 12]),
        candidate(&[2, 5, 7, 11]),
        candidate(&[6]),
        candidate(&[1, 3, 5, 7, 9, 11]),
    ]
}

fn sample_condition() -> Vec<f32> {
    (0..POOL).map(|i| (i % 3) as f32 / 2.0).collect()
}

fn random_cvae(config: ModelConfig) -> (VarMap, LikelihoodModel) {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let arch = CvaeArchitecture {
        num_numbers: POOL,
        latent_dim: 4,
        hidden_dim: 16,
    };
    let model = LikelihoodModel::from_var_builder(vb, arch, config).unwrap();
    (varmap, model)
}

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-4, "{x} vs {y}");
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ModelConfig::default();
        assert!(config.model_path.is_none());
        assert_eq!(config.num_numbers, 49);
        assert_eq!(config.max_batch_size, crate::constants::DEFAULT_MAX_BATCH_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_new() {
        let config = ModelConfig::new("/models/cvae", 35);
        assert_eq!(config.model_path, Some(PathBuf::from("/models/cvae")));
        assert_eq!(config.num_numbers, 35);
        assert_eq!(
            config.weights_path(),
            Some(PathBuf::from("/models/cvae/model.safetensors"))
        );
        assert_eq!(
            config.architecture_path(),
            Some(PathBuf::from("/models/cvae/config.json"))
        );
    }

    #[test]
    fn test_config_stub_paths() {
        let config = ModelConfig::stub(10);
        assert!(config.weights_path().is_none());
        assert!(config.architecture_path().is_none());
    }

    #[test]
    #[serial_test::serial]
    fn test_config_from_env() {
        // SAFETY: Test code only, serialised with the other env tests.
        unsafe {
            std::env::set_var(ModelConfig::ENV_MODEL_PATH, "  /models/cvae  ");
            std::env::set_var(ModelConfig::ENV_MAX_BATCH_SIZE, "32");
        }
        let config = ModelConfig::from_env(49);
        assert_eq!(config.model_path, Some(PathBuf::from("/models/cvae")));
        assert_eq!(config.max_batch_size, 32);

        // SAFETY: Test code only, serialised with the other env tests.
        unsafe { std::env::set_var(ModelConfig::ENV_MAX_BATCH_SIZE, "0") };
        assert_eq!(
            ModelConfig::from_env(49).max_batch_size,
            crate::constants::DEFAULT_MAX_BATCH_SIZE
        );

        // SAFETY: Test code only, serialised with the other env tests.
        unsafe {
            std::env::remove_var(ModelConfig::ENV_MODEL_PATH);
            std::env::remove_var(ModelConfig::ENV_MAX_BATCH_SIZE);
        }
        assert!(ModelConfig::from_env(49).model_path.is_none());
    }

    #[test]
    #[should_panic(expected = "max_batch_size must be at least 1")]
    fn test_config_zero_batch_size_panics() {
        let _ = ModelConfig::stub(10).with_max_batch_size(0);
    }

    #[test]
    #[should_panic(expected = "prior_smoothing must be between 0.0 and 1.0")]
    fn test_config_invalid_smoothing_panics() {
        let _ = ModelConfig::stub(10).with_prior_smoothing(2.0);
    }

    #[test]
    fn test_config_validate_rejects_empty_path() {
        let config = ModelConfig {
            model_path: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_config_validate_rejects_zero_pool() {
        let config = ModelConfig {
            num_numbers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_architecture_roundtrip_json() {
        let arch = CvaeArchitecture::new(49);
        let json = serde_json::to_string(&arch).unwrap();
        let parsed: CvaeArchitecture = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, arch);
    }

    #[test]
    fn test_architecture_validate() {
        let arch = CvaeArchitecture {
            num_numbers: 10,
            latent_dim: 0,
            hidden_dim: 8,
        };
        assert!(arch.validate().is_err());
        assert!(CvaeArchitecture::new(10).validate().is_ok());
    }
}

mod stub_tests {
    use super::*;

    #[test]
    fn test_stub_creation() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        assert!(!model.is_model_loaded());
        assert_eq!(model.num_numbers(), POOL);
        assert_eq!(model.forward_passes(), 0);
    }

    #[test]
    fn test_load_missing_model_dir() {
        let result = LikelihoodModel::load(ModelConfig::new("/nonexistent/cvae", POOL));
        assert!(matches!(result, Err(ModelError::ModelNotFound { .. })));
    }

    #[test]
    fn test_load_dir_without_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let result = LikelihoodModel::load(ModelConfig::new(dir.path(), POOL));
        assert!(matches!(result, Err(ModelError::ModelLoadFailed { .. })));
    }

    #[test]
    fn test_stub_log_likelihood_is_negative() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let ll = model
            .log_likelihood(&candidate(&[1, 2, 3]), &sample_condition())
            .unwrap();
        assert!(ll < 0.0);
        assert!(ll.is_finite());
    }

    #[test]
    fn test_stub_prefers_frequent_numbers() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let mut condition = vec![0.0; POOL];
        condition[0] = 1.0;
        condition[1] = 1.0;
        condition[2] = 1.0;

        let hot = model
            .log_likelihood(&candidate(&[1, 2, 3]), &condition)
            .unwrap();
        let cold = model
            .log_likelihood(&candidate(&[10, 11, 12]), &condition)
            .unwrap();
        assert!(hot > cold);
    }

    #[test]
    fn test_stub_matches_closed_form() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let condition = sample_condition();
        let set = candidate(&[2, 3]);

        let s = crate::constants::DEFAULT_PRIOR_SMOOTHING;
        let expected: f32 = condition
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let p = (c + s) / (1.0 + 2.0 * s);
                if set.numbers().contains(&(i as u32 + 1)) {
                    p.ln()
                } else {
                    (1.0 - p).ln()
                }
            })
            .sum();

        let ll = model.log_likelihood(&set, &condition).unwrap();
        assert!((ll - expected).abs() < 1e-3, "{ll} vs {expected}");
    }

    #[test]
    fn test_stub_batch_matches_loop() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let condition = sample_condition();
        let candidates = sample_candidates();

        let batched = model.log_likelihood_batch(&candidates, &condition).unwrap();
        let looped: Vec<f32> = candidates
            .iter()
            .map(|c| model.log_likelihood(c, &condition).unwrap())
            .collect();

        assert_close(&batched, &looped);
    }

    #[test]
    fn test_stub_marginals_are_smoothed_condition() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let condition = sample_condition();
        let marginals = model.marginals(&condition).unwrap();

        assert_eq!(marginals.len(), POOL);
        assert!(marginals.iter().all(|&p| p > 0.0 && p < 1.0));
        assert!(marginals[2] > marginals[0]);
    }

    #[test]
    fn test_condition_dimension_mismatch() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let result = model.log_likelihood_batch(&sample_candidates(), &[0.5; 3]);
        assert!(matches!(
            result,
            Err(ModelError::DimensionMismatch {
                expected: POOL,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_candidate_from_larger_pool_rejected() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let foreign = CandidateSet::new(vec![1, 40], 49).unwrap();
        let result = model.log_likelihood(&foreign, &sample_condition());
        assert!(matches!(result, Err(ModelError::DimensionMismatch { .. })));
    }
}

mod batching_tests {
    use super::*;

    #[test]
    fn test_empty_batch_runs_no_pass() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let scores = model.log_likelihood_batch(&[], &sample_condition()).unwrap();
        assert!(scores.is_empty());
        assert_eq!(model.forward_passes(), 0);
    }

    #[test]
    fn test_batch_within_limit_is_single_pass() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let candidates = sample_candidates();
        model
            .log_likelihood_batch(&candidates, &sample_condition())
            .unwrap();
        assert_eq!(model.forward_passes(), 1);
    }

    #[test]
    fn test_loop_is_one_pass_per_candidate() {
        let model = LikelihoodModel::stub(POOL).unwrap();
        let candidates = sample_candidates();
        for c in &candidates {
            model.log_likelihood(c, &sample_condition()).unwrap();
        }
        assert_eq!(model.forward_passes(), candidates.len() as u64);
    }

    #[test]
    fn test_batch_chunks_by_max_batch_size() {
        let model =
            LikelihoodModel::load(ModelConfig::stub(POOL).with_max_batch_size(2)).unwrap();
        let candidates = sample_candidates();
        let scores = model
            .log_likelihood_batch(&candidates, &sample_condition())
            .unwrap();
        assert_eq!(scores.len(), 5);
        assert_eq!(model.forward_passes(), 3);
    }

    #[test]
    fn test_chunked_matches_unchunked() {
        let condition = sample_condition();
        let candidates = sample_candidates();

        let whole = LikelihoodModel::stub(POOL).unwrap();
        let chunked =
            LikelihoodModel::load(ModelConfig::stub(POOL).with_max_batch_size(2)).unwrap();

        assert_close(
            &whole.log_likelihood_batch(&candidates, &condition).unwrap(),
            &chunked.log_likelihood_batch(&candidates, &condition).unwrap(),
        );
    }
}

mod cvae_tests {
    use super::*;

    #[test]
    fn test_from_var_builder_loaded() {
        let (_varmap, model) = random_cvae(ModelConfig::stub(POOL));
        assert!(model.is_model_loaded());
    }

    #[test]
    fn test_from_var_builder_pool_mismatch() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let result = LikelihoodModel::from_var_builder(
            vb,
            CvaeArchitecture::new(POOL + 1),
            ModelConfig::stub(POOL),
        );
        assert!(matches!(result, Err(ModelError::InvalidConfig { .. })));
    }

    #[test]
    fn test_cvae_batch_matches_loop() {
        let (_varmap, model) = random_cvae(ModelConfig::stub(POOL));
        let condition = sample_condition();
        let candidates = sample_candidates();

        let batched = model.log_likelihood_batch(&candidates, &condition).unwrap();
        let looped: Vec<f32> = candidates
            .iter()
            .map(|c| model.log_likelihood(c, &condition).unwrap())
            .collect();

        assert_close(&batched, &looped);
        assert!(batched.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_cvae_batch_preserves_order() {
        let (_varmap, model) = random_cvae(ModelConfig::stub(POOL));
        let condition = sample_condition();
        let candidates = sample_candidates();

        let forward = model.log_likelihood_batch(&candidates, &condition).unwrap();
        let mut reversed_input = candidates.clone();
        reversed_input.reverse();
        let mut backward = model
            .log_likelihood_batch(&reversed_input, &condition)
            .unwrap();
        backward.reverse();

        assert_close(&forward, &backward);
    }

    #[test]
    fn test_cvae_marginals_are_probabilities() {
        let (_varmap, model) = random_cvae(ModelConfig::stub(POOL));
        let marginals = model.marginals(&sample_condition()).unwrap();
        assert_eq!(marginals.len(), POOL);
        assert!(marginals.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_load_saved_weights_matches_in_memory() {
        let (varmap, in_memory) = random_cvae(ModelConfig::stub(POOL));

        let dir = tempfile::tempdir().unwrap();
        varmap.save(dir.path().join(WEIGHTS_FILENAME)).unwrap();
        let arch = CvaeArchitecture {
            num_numbers: POOL,
            latent_dim: 4,
            hidden_dim: 16,
        };
        std::fs::write(
            dir.path().join(ARCHITECTURE_FILENAME),
            serde_json::to_string(&arch).unwrap(),
        )
        .unwrap();

        let loaded = LikelihoodModel::load(ModelConfig::new(dir.path(), POOL)).unwrap();
        assert!(loaded.is_model_loaded());

        let condition = sample_condition();
        let candidates = sample_candidates();
        assert_close(
            &in_memory
                .log_likelihood_batch(&candidates, &condition)
                .unwrap(),
            &loaded.log_likelihood_batch(&candidates, &condition).unwrap(),
        );
    }

    #[test]
    fn test_load_rejects_bad_architecture_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ARCHITECTURE_FILENAME), "{ nope").unwrap();
        std::fs::write(dir.path().join(WEIGHTS_FILENAME), b"").unwrap();

        let result = LikelihoodModel::load(ModelConfig::new(dir.path(), POOL));
        assert!(matches!(result, Err(ModelError::ModelLoadFailed { .. })));
    }

    #[test]
    fn test_gaussian_kl_zero_at_prior() {
        let mu = Tensor::zeros((2, 3), DType::F32, &Device::Cpu).unwrap();
        let logvar = Tensor::zeros((2, 3), DType::F32, &Device::Cpu).unwrap();
        let kl = cvae::gaussian_kl(&mu, &logvar)
            .unwrap()
            .to_vec1::<f32>()
            .unwrap();
        assert_close(&kl, &[0.0, 0.0]);
    }

    #[test]
    fn test_bernoulli_log_likelihood_zero_logits() {
        let x = Tensor::new(&[[1.0f32, 0.0]], &Device::Cpu).unwrap();
        let logits = Tensor::zeros((1, 2), DType::F32, &Device::Cpu).unwrap();
        let ll = bernoulli_log_likelihood(&x, &logits)
            .unwrap()
            .to_vec1::<f32>()
            .unwrap();
        assert_close(&ll, &[2.0 * 0.5f32.ln()]);
    }
}
