/*!
# Collapsed Gibbs sampler for LDA

The [`Sampler`] re-draws the topic of every word occurrence from its
conditional distribution given all other assignments, updating the document
histogram and the model counts after each draw so that the next occurrence
sees the new state.

With `alpha` the topic prior, `beta` the word prior and `V` the vocabulary
size, the un-normalized weight of topic `k` for word `w` in document `d` is

```text
(n_wk + adj + beta) * (n_dk + adj + alpha) / (n_k + adj + V * beta)
```

where `adj` is -1 for the occurrence's current topic while training (the
occurrence must not count itself) and 0 otherwise.

## Example Usage

```rust
use gibbs_lda::document::{Corpus, Document};
use gibbs_lda::gibbs::Sampler;
use gibbs_lda::model::Model;

let mut corpus: Corpus = ["apple orange apple", "zebra lion zebra"]
    .iter()
    .map(|text| Document::new(text, 2).unwrap())
    .collect();
let model = Model::from_corpus(2, &corpus);
let mut sampler = Sampler::new(0.1, 0.01, model, Some(Model::new(2))).set_seed(42);

sampler.sample_corpus(&mut corpus, true, true); // burn-in
sampler.sample_corpus(&mut corpus, true, false);
assert!(sampler.model().is_consistent());
assert_eq!(sampler.accumulator().unwrap(), sampler.model());
```
*/

use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::distributions::sample_accumulative;
use crate::document::{Corpus, Document};
use crate::model::Model;

/// Gibbs sampler over a live model and an optional accumulator.
#[derive(Debug, Clone)]
pub struct Sampler {
    topic_prior: f64,
    word_prior: f64,

    /// Counts of the current assignment, updated after every draw while training.
    model: Model,

    /// Running sum of the post-burn-in states of `model`.
    accumulator: Option<Model>,

    /// Random seed for reproducibility.
    pub seed: u64,

    rng: SmallRng,
}

impl Sampler {
    /// Creates a sampler seeded from the thread RNG.
    ///
    /// # Panics
    /// If either prior is not positive, or if the accumulator's topic count
    /// differs from the model's.
    pub fn new(
        topic_prior: f64,
        word_prior: f64,
        model: Model,
        accumulator: Option<Model>,
    ) -> Self {
        assert!(
            topic_prior > 0.0 && word_prior > 0.0,
            "priors must be positive, got topic_prior = {topic_prior}, word_prior = {word_prior}"
        );
        if let Some(acc) = &accumulator {
            assert_eq!(
                acc.num_topics(),
                model.num_topics(),
                "accumulator and model disagree on the number of topics"
            );
        }
        let seed = thread_rng().gen::<u64>();
        Self {
            topic_prior,
            word_prior,
            model,
            accumulator,
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Sets a new seed and reseeds the random source.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn topic_prior(&self) -> f64 {
        self.topic_prior
    }

    pub fn word_prior(&self) -> f64 {
        self.word_prior
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn accumulator(&self) -> Option<&Model> {
        self.accumulator.as_ref()
    }

    /// Consumes the sampler, returning the live model and the accumulator.
    pub fn into_models(self) -> (Model, Option<Model>) {
        (self.model, self.accumulator)
    }

    /**
    Un-normalized conditional distribution over topics for one occurrence of
    `word` in `doc`.

    When `updating` is true, the counts at `target_topic` (the occurrence's
    current topic) are reduced by one so the occurrence does not condition
    on itself.
    */
    pub fn topic_distribution(
        &self,
        doc: &Document,
        word: &str,
        target_topic: usize,
        updating: bool,
    ) -> Vec<f64> {
        self.check_topic_count(doc);
        let num_topics = self.model.num_topics();
        let vocabulary_size = self.model.num_words() as f64;
        let word_histogram = self.model.word_histogram(word);
        let global_histogram = self.model.global_histogram();
        let doc_histogram = doc.topic_histogram();

        (0..num_topics)
            .map(|k| {
                let adjustment = if updating && k == target_topic { -1 } else { 0 };
                let topic_word = (word_histogram[k] + adjustment) as f64;
                let doc_topic = (doc_histogram[k] + adjustment) as f64;
                let global_topic = (global_histogram[k] + adjustment) as f64;
                (topic_word + self.word_prior) * (doc_topic + self.topic_prior)
                    / (global_topic + vocabulary_size * self.word_prior)
            })
            .collect()
    }

    /**
    Re-draws the topic of every occurrence in `doc`.

    If `updating` is true the model counts follow every change; otherwise
    only the document's labels move (inference against a fixed model).

    # Panics
    If the document and model disagree on the number of topics, or if a
    conditional distribution cannot be sampled from (corrupted counts).
    */
    pub fn sample_document(&mut self, doc: &mut Document, updating: bool) {
        self.check_topic_count(doc);
        let mut cursor = doc.cursor();
        while !cursor.done() {
            let old_topic = cursor.topic();
            let weights =
                self.topic_distribution(cursor.document(), cursor.word(), old_topic, updating);
            let new_topic = match sample_accumulative(&weights, &mut self.rng) {
                Some(topic) => topic,
                None => panic!("cannot sample a topic from {weights:?}"),
            };
            if updating {
                self.model.reassign_topic(cursor.word(), old_topic, new_topic);
            }
            cursor.set_topic(new_topic);
            cursor.advance();
        }
    }

    /// One sweep over every document in corpus order.
    ///
    /// A training sweep that is not part of burn-in is added to the accumulator.
    pub fn sample_corpus(&mut self, corpus: &mut Corpus, updating: bool, burn_in: bool) {
        for doc in corpus.iter_mut() {
            self.sample_document(doc, updating);
        }
        debug!(
            documents = corpus.len(),
            updating,
            burn_in,
            "finished corpus sweep"
        );

        if updating && !burn_in {
            if let Some(accumulator) = self.accumulator.as_mut() {
                accumulator.accumulate(&self.model);
                trace!(words = accumulator.num_words(), "accumulated model state");
            }
        }
    }

    /**
    Log-likelihood of `doc` under the current model.

    `P(k | d)` is smoothed with the topic prior. `P(w | k)` is smoothed with
    the word prior scaled by the document length. Each occurrence contributes
    `ln sum_k P(w | k) P(k | d)`.
    */
    pub fn document_log_likelihood(&self, doc: &Document) -> f64 {
        self.check_topic_count(doc);
        let num_topics = self.model.num_topics();
        let doc_length = doc.len() as f64;

        let smoothed_doc_length = doc_length + self.topic_prior * num_topics as f64;
        let prob_topic_given_doc: Vec<f64> = doc
            .topic_histogram()
            .iter()
            .map(|&c| (c as f64 + self.topic_prior) / smoothed_doc_length)
            .collect();

        let global_histogram = self.model.global_histogram();
        doc.words()
            .map(|(word, _)| {
                let word_histogram = self.model.word_histogram(word);
                let prob_word: f64 = (0..num_topics)
                    .map(|k| {
                        let prob_word_given_topic = (word_histogram[k] as f64 + self.word_prior)
                            / (global_histogram[k] as f64 + doc_length * self.word_prior);
                        prob_word_given_topic * prob_topic_given_doc[k]
                    })
                    .sum();
                prob_word.ln()
            })
            .sum()
    }

    /// Sum of [`Sampler::document_log_likelihood`] over the corpus.
    ///
    /// Documents are scored in parallel and summed in corpus order.
    pub fn corpus_log_likelihood(&self, corpus: &Corpus) -> f64 {
        let per_document: Vec<f64> = corpus
            .documents()
            .par_iter()
            .map(|doc| self.document_log_likelihood(doc))
            .collect();
        per_document.iter().sum()
    }

    fn check_topic_count(&self, doc: &Document) {
        assert_eq!(
            doc.num_topics(),
            self.model.num_topics(),
            "document and model disagree on the number of topics"
        );
    }
}
