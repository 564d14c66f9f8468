//! Command-line driver: trains an LDA model on a corpus file and writes the
//! accumulated word-topic counts.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use gibbs_lda::train::{train, TrainConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gibbs-lda")]
#[command(about = "Train an LDA topic model with collapsed Gibbs sampling")]
#[command(version)]
struct Cli {
    /// The number of topics expected in the trained model
    #[arg(long, default_value_t = 2)]
    num_topics: usize,

    /// The parameter of the symmetric Dirichlet on topics
    #[arg(long, default_value_t = 0.1)]
    topic_prior: f64,

    /// The parameter of the symmetric Dirichlet on words
    #[arg(long, default_value_t = 0.01)]
    word_prior: f64,

    /// The training corpus, one document per line
    #[arg(long)]
    corpus_file: Option<PathBuf>,

    /// The output model file
    #[arg(long)]
    model_file: Option<PathBuf>,

    /// Number of Gibbs sweeps discarded while the chain burns in
    #[arg(long, default_value_t = 50)]
    burn_in_iterations: usize,

    /// Number of Gibbs sweeps accumulated into the output model
    #[arg(long, default_value_t = 10)]
    accumulate_iterations: usize,

    /// Whether to compute and report the log-likelihood before every sweep
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    compute_loglikelihood: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of top words logged per topic after training (0 disables)
    #[arg(long, default_value_t = 10)]
    top_words: usize,

    /// Also export smoothed topic-word probabilities as CSV (needs the `csv` feature)
    #[arg(long)]
    csv_file: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl From<Cli> for TrainConfig {
    fn from(cli: Cli) -> Self {
        Self {
            num_topics: cli.num_topics,
            topic_prior: cli.topic_prior,
            word_prior: cli.word_prior,
            corpus_file: cli.corpus_file.unwrap_or_default(),
            model_file: cli.model_file.unwrap_or_default(),
            burn_in_iterations: cli.burn_in_iterations,
            accumulate_iterations: cli.accumulate_iterations,
            compute_loglikelihood: cli.compute_loglikelihood,
            seed: cli.seed,
            top_words: cli.top_words,
            csv_file: cli.csv_file,
            show_progress: !cli.no_progress,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = TrainConfig::from(Cli::parse());
    if let Err(e) = train(&config) {
        error!("Stop training: {e}");
        std::process::exit(1);
    }
}
