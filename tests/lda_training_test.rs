//! End-to-end tests of the training pipeline.
//!
//! 1. `test_train_writes_accumulated_model`: trains from a corpus file and reloads the saved model.
//! 2. `test_corpus_without_documents_is_rejected`: no model is written for an empty corpus.
//! 3. `test_log_likelihood_improves_on_separable_corpus`: the chain separates two disjoint vocabularies.
//! 4. `test_held_out_inference_keeps_model_fixed`: sampling unseen documents without updating.

use gibbs_lda::document::{Corpus, Document};
use gibbs_lda::error::LdaError;
use gibbs_lda::gibbs::Sampler;
use gibbs_lda::model::Model;
use gibbs_lda::train::{run_sweeps, train, TrainConfig};
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten documents over {a, b} and ten over {c, d}.
    fn separable_corpus(num_topics: usize) -> Corpus {
        (0..20)
            .map(|i| {
                let text = if i % 2 == 0 {
                    "a b a b a b"
                } else {
                    "c d c d c d"
                };
                Document::new(text, num_topics).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_train_writes_accumulated_model() {
        let dir = TempDir::new().expect("Could not create temp dir");
        let corpus_file = dir.path().join("corpus.txt");
        let model_file = dir.path().join("model.txt");
        fs::write(
            &corpus_file,
            "apple orange apple banana\nsingle\n\nzebra lion zebra tiger\norange lion banana\n",
        )
        .unwrap();

        let config = TrainConfig {
            num_topics: 3,
            corpus_file,
            model_file: model_file.clone(),
            burn_in_iterations: 5,
            accumulate_iterations: 4,
            seed: Some(42),
            top_words: 2,
            show_progress: false,
            ..TrainConfig::default()
        };
        let report = train(&config).expect("Expected training to succeed");

        let saved = Model::load(&model_file).expect("Expected saved model to load");
        assert_eq!(saved, report.accumulated);
        assert!(saved.is_consistent());
        assert_eq!(saved.num_words(), 6);
        // 11 occurrences, counted once per accumulation sweep.
        let total: i64 = saved.global_histogram().iter().sum();
        assert_eq!(total, 4 * 11);
        assert_eq!(report.log_likelihoods.len(), 9);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_loading() {
        let config = TrainConfig {
            num_topics: 0,
            corpus_file: "/nonexistent/corpus.txt".into(),
            model_file: "/nonexistent/model.txt".into(),
            ..TrainConfig::default()
        };
        assert!(matches!(train(&config), Err(LdaError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_corpus_is_an_io_error() {
        let dir = TempDir::new().expect("Could not create temp dir");
        let config = TrainConfig {
            corpus_file: dir.path().join("missing.txt"),
            model_file: dir.path().join("model.txt"),
            show_progress: false,
            ..TrainConfig::default()
        };
        assert!(matches!(train(&config), Err(LdaError::Io(_))));
        assert!(!dir.path().join("model.txt").exists());
    }

    #[test]
    fn test_corpus_without_documents_is_rejected() {
        let dir = TempDir::new().expect("Could not create temp dir");
        let corpus_file = dir.path().join("corpus.txt");
        let model_file = dir.path().join("model.txt");
        fs::write(&corpus_file, "lonely\n\n   \nsingle\n").unwrap();

        let config = TrainConfig {
            corpus_file: corpus_file.clone(),
            model_file: model_file.clone(),
            show_progress: false,
            ..TrainConfig::default()
        };
        match train(&config) {
            Err(LdaError::EmptyCorpus(path)) => assert_eq!(path, corpus_file),
            other => panic!("Expected an empty-corpus error, got {other:?}"),
        }
        assert!(!model_file.exists());
    }

    #[test]
    fn test_log_likelihood_improves_on_separable_corpus() {
        let mut corpus = separable_corpus(2);
        let config = TrainConfig {
            num_topics: 2,
            burn_in_iterations: 50,
            accumulate_iterations: 10,
            seed: Some(2024),
            show_progress: false,
            ..TrainConfig::default()
        };
        let report = run_sweeps(&config, &mut corpus);

        let first = report.log_likelihoods[0];
        let last = *report.log_likelihoods.last().unwrap();
        assert!(
            last > first,
            "Expected log-likelihood to improve: first {first}, last {last}"
        );

        // Each topic should end up owning one of the two vocabularies.
        let model = &report.model;
        let topic_of = |w: &str| {
            let h = model.word_histogram(w);
            if h[0] >= h[1] {
                0
            } else {
                1
            }
        };
        assert_eq!(topic_of("a"), topic_of("b"));
        assert_eq!(topic_of("c"), topic_of("d"));
        assert_ne!(topic_of("a"), topic_of("c"));
    }

    #[test]
    fn test_held_out_inference_keeps_model_fixed() {
        let mut training = separable_corpus(2);
        let config = TrainConfig {
            num_topics: 2,
            burn_in_iterations: 20,
            accumulate_iterations: 5,
            seed: Some(7),
            show_progress: false,
            ..TrainConfig::default()
        };
        let report = run_sweeps(&config, &mut training);

        let mut held_out: Corpus = ["a b b a", "d c c d", "a d unseen"]
            .iter()
            .map(|t| Document::new(t, 2).unwrap())
            .collect();
        let mut sampler = Sampler::new(0.1, 0.01, report.accumulated.clone(), None).set_seed(1);
        for _ in 0..10 {
            sampler.sample_corpus(&mut held_out, false, false);
        }
        assert_eq!(sampler.model(), &report.accumulated);
        let ll = sampler.corpus_log_likelihood(&held_out);
        assert!(ll.is_finite() && ll < 0.0, "log-likelihood {ll}");
        for doc in held_out.iter() {
            assert!(doc.is_valid());
        }
    }
}
