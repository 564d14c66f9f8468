/*!
# Training driver

Loads a corpus, counts the initial assignment, runs burn-in and accumulation
sweeps with a progress bar, and writes the accumulated model.

```rust,no_run
use gibbs_lda::train::{train, TrainConfig};

let config = TrainConfig {
    num_topics: 20,
    corpus_file: "corpus.txt".into(),
    model_file: "model.txt".into(),
    seed: Some(42),
    ..TrainConfig::default()
};
let report = train(&config)?;
println!("final log-likelihood: {:?}", report.log_likelihoods.last());
# Ok::<(), gibbs_lda::error::LdaError>(())
```
*/

use std::path::PathBuf;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::document::Corpus;
use crate::error::{LdaError, Result};
use crate::gibbs::Sampler;
use crate::model::Model;

/// Settings for one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub num_topics: usize,
    /// Symmetric Dirichlet concentration over topics per document.
    pub topic_prior: f64,
    /// Symmetric Dirichlet concentration over words per topic.
    pub word_prior: f64,
    pub corpus_file: PathBuf,
    /// Where the accumulated model is written.
    pub model_file: PathBuf,
    pub burn_in_iterations: usize,
    pub accumulate_iterations: usize,
    /// Compute and report the corpus log-likelihood before every sweep.
    pub compute_loglikelihood: bool,
    /// Fixed seed; drawn from the thread RNG when `None`.
    pub seed: Option<u64>,
    /// Number of top words logged per topic at the end (0 disables).
    pub top_words: usize,
    /// Optional CSV export of the smoothed topic-word matrix.
    pub csv_file: Option<PathBuf>,
    pub show_progress: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_topics: 2,
            topic_prior: 0.1,
            word_prior: 0.01,
            corpus_file: PathBuf::new(),
            model_file: PathBuf::new(),
            burn_in_iterations: 50,
            accumulate_iterations: 10,
            compute_loglikelihood: true,
            seed: None,
            top_words: 0,
            csv_file: None,
            show_progress: true,
        }
    }
}

impl TrainConfig {
    /// Checks every setting, reporting all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.num_topics < 2 {
            problems.push("num_topics must be larger than or equal to 2".to_string());
        }
        if !(self.topic_prior > 0.0 && self.topic_prior.is_finite()) {
            problems.push("topic_prior must be positive".to_string());
        }
        if !(self.word_prior > 0.0 && self.word_prior.is_finite()) {
            problems.push("word_prior must be positive".to_string());
        }
        if self.corpus_file.as_os_str().is_empty() {
            problems.push("corpus_file must be specified".to_string());
        }
        if self.model_file.as_os_str().is_empty() {
            problems.push("model_file must be specified".to_string());
        }
        if self.burn_in_iterations == 0 {
            problems.push("burn_in_iterations must be positive".to_string());
        }
        if self.accumulate_iterations == 0 {
            problems.push("accumulate_iterations must be positive".to_string());
        }
        if cfg!(not(feature = "csv")) && self.csv_file.is_some() {
            problems.push("csv_file requires the `csv` feature".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(LdaError::InvalidConfig(problems))
        }
    }
}

/// Outcome of [`run_sweeps`] and [`train`].
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Corpus log-likelihood measured before each sweep (empty if disabled).
    pub log_likelihoods: Vec<f64>,
    /// Sum of the model states after every accumulation sweep.
    pub accumulated: Model,
    /// Live model after the last sweep.
    pub model: Model,
    pub seed: u64,
}

/// Runs the full training pipeline described by `config`.
pub fn train(config: &TrainConfig) -> Result<TrainReport> {
    config.validate()?;
    let start = Instant::now();

    let mut corpus = Corpus::load(&config.corpus_file, config.num_topics)?;
    if corpus.is_empty() {
        return Err(LdaError::EmptyCorpus(config.corpus_file.clone()));
    }

    let report = run_sweeps(config, &mut corpus);
    report.accumulated.save(&config.model_file)?;

    #[cfg(feature = "csv")]
    {
        if let Some(csv_file) = &config.csv_file {
            crate::io::csv::save_topic_word_csv(&report.accumulated, config.word_prior, csv_file)?;
        }
    }

    if config.top_words > 0 {
        for topic in 0..report.accumulated.num_topics() {
            let words: Vec<&str> = report
                .accumulated
                .top_words(topic, config.top_words)
                .into_iter()
                .map(|(w, _)| w)
                .collect();
            info!(topic, words = %words.join(" "), "top words");
        }
    }

    info!(
        elapsed = ?start.elapsed(),
        seed = report.seed,
        model_file = %config.model_file.display(),
        "training finished"
    );
    Ok(report)
}

/**
Runs `burn_in_iterations + accumulate_iterations` training sweeps over `corpus`.

The model is counted from the corpus's current labels. Only the sweeps after
burn-in are folded into the accumulator.
*/
pub fn run_sweeps(config: &TrainConfig, corpus: &mut Corpus) -> TrainReport {
    let model = Model::from_corpus(config.num_topics, corpus);
    let accumulator = Model::new(config.num_topics);
    let mut sampler = Sampler::new(
        config.topic_prior,
        config.word_prior,
        model,
        Some(accumulator),
    );
    if let Some(seed) = config.seed {
        sampler = sampler.set_seed(seed);
    }
    let seed = sampler.seed;

    let n_sweeps = config.burn_in_iterations + config.accumulate_iterations;
    let pb = if config.show_progress {
        ProgressBar::new(n_sweeps as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_prefix("Gibbs");

    info!(
        documents = corpus.len(),
        vocabulary = sampler.model().num_words(),
        topics = config.num_topics,
        sweeps = n_sweeps,
        seed,
        "starting Gibbs sampling"
    );

    let mut log_likelihoods = Vec::new();
    for iteration in 0..n_sweeps {
        let burn_in = iteration < config.burn_in_iterations;
        if config.compute_loglikelihood {
            let ll = sampler.corpus_log_likelihood(corpus);
            info!(iteration, burn_in, log_likelihood = ll, "sweep");
            pb.set_message(format!("log-likelihood {ll:.3}"));
            log_likelihoods.push(ll);
        } else {
            info!(iteration, burn_in, "sweep");
        }
        sampler.sample_corpus(corpus, true, burn_in);
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    let (model, accumulated) = sampler.into_models();
    TrainReport {
        log_likelihoods,
        accumulated: accumulated.unwrap_or_else(|| Model::new(config.num_topics)),
        model,
        seed,
    }
}
