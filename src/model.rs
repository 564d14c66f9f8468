/*!
Word-topic count tables.

A [`Model`] maps every known word to its topic histogram and keeps a global
histogram equal to the column sums of all word histograms. Every mutation
goes through [`Model::increment_topic`], which updates both tables in the same
call, so the column-sum invariant holds after each one.

Counts are signed: a reassignment decrements before it increments, and a
count may be observed at -1 between the two steps if the old topic was never
counted for that word.

# File format

```text
apple  0 1
banana 2 0
```

One line per word, followed by its K counts, separated by whitespace.

# Examples

```rust
use gibbs_lda::model::Model;

let mut model = Model::new(2);
model.increment_topic("apple", 0, 3);
model.reassign_topic("apple", 0, 1);
assert_eq!(model.word_histogram("apple"), [2, 1]);
assert_eq!(model.global_histogram(), [2, 1]);
assert_eq!(model.word_histogram("unseen"), [0, 0]);
```
*/

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::Array2;
use tracing::info;

use crate::document::Corpus;
use crate::error::{LdaError, Result};
use crate::io::for_each_line;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    topic_histograms: HashMap<String, Vec<i64>>,
    global_histogram: Vec<i64>,
    /// Returned for words the model has never seen.
    zero_histogram: Vec<i64>,
}

impl Model {
    /// Creates an empty model over `num_topics` topics.
    pub fn new(num_topics: usize) -> Self {
        Self {
            topic_histograms: HashMap::new(),
            global_histogram: vec![0; num_topics],
            zero_histogram: vec![0; num_topics],
        }
    }

    /// Counts the current topic assignment of every occurrence in `corpus`.
    pub fn from_corpus(num_topics: usize, corpus: &Corpus) -> Self {
        let mut model = Self::new(num_topics);
        for doc in corpus.iter() {
            for (word, topic) in doc.words() {
                model.increment_topic(word, topic, 1);
            }
        }
        model
    }

    /// Loads a model file. See the module docs for the format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let model = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            words = model.num_words(),
            topics = model.num_topics(),
            "loaded model"
        );
        Ok(model)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut model: Option<Model> = None;

        for_each_line(reader, |line_no, line| {
            let parse_error = |reason: String| LdaError::Parse {
                line: line_no,
                reason,
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                return Ok(());
            }
            if fields.len() < 3 {
                return Err(parse_error(format!(
                    "expected a word and at least 2 counts: {line:?}"
                )));
            }

            let num_topics = fields.len() - 1;
            let model = model.get_or_insert_with(|| Model::new(num_topics));
            if num_topics != model.num_topics() {
                return Err(parse_error(format!(
                    "found {num_topics} counts, expected {}",
                    model.num_topics()
                )));
            }

            let word = fields[0];
            if model.contains(word) {
                return Err(parse_error(format!("duplicated word: {word}")));
            }

            let counts = fields[1..]
                .iter()
                .map(|f| {
                    f.parse::<i64>()
                        .map_err(|e| parse_error(format!("invalid count {f:?}: {e}")))
                })
                .collect::<Result<Vec<i64>>>()?;
            for (topic, &count) in counts.iter().enumerate() {
                model.global_histogram[topic] += count;
            }
            model.topic_histograms.insert(word.to_string(), counts);
            Ok(())
        })?;

        model.ok_or(LdaError::EmptyModel)
    }

    /// Writes the model to `path`, one word per line in sorted order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        info!(path = %path.display(), words = self.num_words(), "saved model");
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (word, hist) in self.sorted_words() {
            write!(writer, "{word}")?;
            for c in hist {
                write!(writer, " {c}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    pub fn num_topics(&self) -> usize {
        self.global_histogram.len()
    }

    /// Vocabulary size: number of distinct words with a histogram.
    pub fn num_words(&self) -> usize {
        self.topic_histograms.len()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.topic_histograms.contains_key(word)
    }

    /// Topic histogram of `word`, all zeros if the word is unknown.
    pub fn word_histogram(&self, word: &str) -> &[i64] {
        self.topic_histograms
            .get(word)
            .map_or(&self.zero_histogram, |h| h)
    }

    pub fn global_histogram(&self) -> &[i64] {
        &self.global_histogram
    }

    /// Iterates over `(word, histogram)` in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[i64])> + '_ {
        self.topic_histograms
            .iter()
            .map(|(w, h)| (w.as_str(), h.as_slice()))
    }

    fn sorted_words(&self) -> Vec<(&str, &[i64])> {
        let mut words: Vec<_> = self.iter().collect();
        words.sort_unstable_by(|a, b| a.0.cmp(b.0));
        words
    }

    /// Adds `count` to `word`'s histogram and the global histogram at `topic`.
    ///
    /// # Panics
    /// If `topic >= self.num_topics()`.
    pub fn increment_topic(&mut self, word: &str, topic: usize, count: i64) {
        let num_topics = self.num_topics();
        assert!(
            topic < num_topics,
            "topic ({topic}) >= num_topics ({num_topics})"
        );
        match self.topic_histograms.get_mut(word) {
            Some(hist) => hist[topic] += count,
            None => {
                let mut hist = vec![0; num_topics];
                hist[topic] = count;
                self.topic_histograms.insert(word.to_string(), hist);
            }
        }
        self.global_histogram[topic] += count;
    }

    /// Moves one count of `word` from `old_topic` to `new_topic`.
    pub fn reassign_topic(&mut self, word: &str, old_topic: usize, new_topic: usize) {
        self.increment_topic(word, old_topic, -1);
        self.increment_topic(word, new_topic, 1);
    }

    /// Adds every count of `other` into `self`.
    ///
    /// # Panics
    /// If the two models have different numbers of topics.
    pub fn accumulate(&mut self, other: &Model) {
        assert_eq!(
            self.num_topics(),
            other.num_topics(),
            "cannot accumulate a model with {} topics into one with {} topics",
            other.num_topics(),
            self.num_topics()
        );
        for (word, hist) in other.iter() {
            for (topic, &count) in hist.iter().enumerate() {
                self.increment_topic(word, topic, count);
            }
        }
    }

    /// Checks that the global histogram equals the column sums of the word histograms.
    pub fn is_consistent(&self) -> bool {
        let mut sums = vec![0i64; self.num_topics()];
        for hist in self.topic_histograms.values() {
            if hist.len() != sums.len() {
                return false;
            }
            for (s, &c) in sums.iter_mut().zip(hist) {
                *s += c;
            }
        }
        sums == self.global_histogram
    }

    /// The `n` words with the highest count in `topic`, ties broken by word.
    pub fn top_words(&self, topic: usize, n: usize) -> Vec<(&str, i64)> {
        assert!(
            topic < self.num_topics(),
            "topic ({topic}) >= num_topics ({})",
            self.num_topics()
        );
        let mut words: Vec<(&str, i64)> = self.iter().map(|(w, h)| (w, h[topic])).collect();
        words.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        words.truncate(n);
        words
    }

    /**
    Smoothed topic-word probabilities.

    Returns the vocabulary in sorted order and a `num_words x num_topics`
    matrix whose entry `(w, k)` is `(n_wk + word_prior) / (n_k + V * word_prior)`,
    so every column sums to one.
    */
    pub fn topic_word_matrix(&self, word_prior: f64) -> (Vec<String>, Array2<f64>) {
        let words = self.sorted_words();
        let v = words.len() as f64;
        let mut matrix = Array2::<f64>::zeros((words.len(), self.num_topics()));
        for (row, (_, hist)) in words.iter().enumerate() {
            for (k, &count) in hist.iter().enumerate() {
                matrix[(row, k)] = (count as f64 + word_prior)
                    / (self.global_histogram[k] as f64 + v * word_prior);
            }
        }
        let vocabulary = words.into_iter().map(|(w, _)| w.to_string()).collect();
        (vocabulary, matrix)
    }
}
