/*!
Documents, corpora and the occurrence cursor.

A [`Document`] stores every word occurrence of one line of text together with
its current topic label. Occurrences are grouped by unique word, sorted
lexicographically:

```text
unique_words:   apple     orange   zebra
word_offsets:   0         4        6
topics:         0 3 4 0   0 3      1
```

The per-document topic histogram is kept in step with the labels; the only
way to change a label is [`WordCursor::set_topic`].

# Examples

```rust
use gibbs_lda::document::Document;

let mut doc = Document::new("apple orange apple", 3).unwrap();
assert_eq!(doc.unique_words(), ["apple", "orange"]);
assert_eq!(doc.topic_histogram(), [3, 0, 0]);

let mut cursor = doc.cursor();
cursor.set_topic(2);
cursor.advance();
assert_eq!(cursor.word(), "apple");
drop(cursor);
assert_eq!(doc.topic_histogram(), [2, 0, 1]);
```
*/

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{LdaError, Result};
use crate::io::for_each_line;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    unique_words: Vec<String>,
    /// Start of each unique word's slot range in `topics`.
    word_offsets: Vec<usize>,
    topics: Vec<usize>,
    topic_histogram: Vec<i64>,
}

impl Document {
    /// Parses whitespace-separated `text` into a document over `num_topics` topics.
    ///
    /// Every occurrence starts out labeled with topic 0. Fails if `num_topics < 2`
    /// or if the text has fewer than two words.
    pub fn new(text: &str, num_topics: usize) -> Result<Self> {
        if num_topics < 2 {
            return Err(LdaError::InvalidDocument(format!(
                "num_topics must be >= 2, got {num_topics}"
            )));
        }

        let mut words: Vec<&str> = text.split_whitespace().collect();
        if words.len() < 2 {
            return Err(LdaError::InvalidDocument(format!(
                "document has fewer than 2 words: {text:?}"
            )));
        }
        words.sort();

        let mut unique_words: Vec<String> = Vec::new();
        let mut word_offsets = Vec::new();
        for (i, &w) in words.iter().enumerate() {
            if unique_words.last().map(String::as_str) != Some(w) {
                unique_words.push(w.to_string());
                word_offsets.push(i);
            }
        }

        let mut topic_histogram = vec![0; num_topics];
        topic_histogram[0] = words.len() as i64;

        let doc = Self {
            unique_words,
            word_offsets,
            topics: vec![0; words.len()],
            topic_histogram,
        };
        debug_assert!(doc.is_valid());
        Ok(doc)
    }

    /// Number of word occurrences.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn num_topics(&self) -> usize {
        self.topic_histogram.len()
    }

    /// Distinct words in cursor order.
    pub fn unique_words(&self) -> &[String] {
        &self.unique_words
    }

    /// `topic_histogram()[k]` is the number of occurrences labeled `k`.
    pub fn topic_histogram(&self) -> &[i64] {
        &self.topic_histogram
    }

    /// Topic labels of all occurrences, in cursor order.
    pub fn topics(&self) -> &[usize] {
        &self.topics
    }

    /// Checks the structural invariants: offsets partition the occurrences,
    /// every label is in range and the histogram matches the labels.
    pub fn is_valid(&self) -> bool {
        let n = self.topics.len();
        let k = self.topic_histogram.len();
        if self.unique_words.is_empty()
            || self.word_offsets.len() != self.unique_words.len()
            || n < 2
            || k < 2
            || self.word_offsets[0] != 0
        {
            return false;
        }
        let offsets_ok = self
            .word_offsets
            .windows(2)
            .all(|w| w[0] < w[1] && w[1] <= n)
            && self.word_offsets[self.word_offsets.len() - 1] < n;

        let mut counts = vec![0i64; k];
        for &t in &self.topics {
            if t >= k {
                return false;
            }
            counts[t] += 1;
        }
        offsets_ok && counts == self.topic_histogram
    }

    /// Returns a cursor positioned at the first occurrence.
    pub fn cursor(&mut self) -> WordCursor<'_> {
        WordCursor {
            doc: self,
            word_index: 0,
            slot: 0,
        }
    }

    /// Read-only walk over `(word, topic)` pairs in cursor order.
    pub fn words(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.unique_words
            .iter()
            .enumerate()
            .flat_map(move |(i, word)| {
                self.topics[self.word_offsets[i]..self.word_end(i)]
                    .iter()
                    .map(move |&t| (word.as_str(), t))
            })
    }

    /// One past the last slot owned by the `i`-th unique word.
    fn word_end(&self, i: usize) -> usize {
        self.word_offsets
            .get(i + 1)
            .copied()
            .unwrap_or(self.topics.len())
    }
}

/**
A forward-only cursor over every occurrence of a [`Document`].

Occurrences are visited in unique-word order, then in slot order within a
word. The cursor holds the document mutably for its whole lifetime so that
label changes and histogram updates cannot be observed half-done.

All accessors and [`WordCursor::set_topic`] panic once [`WordCursor::done`]
returns `true`.
*/
pub struct WordCursor<'a> {
    doc: &'a mut Document,
    word_index: usize,
    slot: usize,
}

impl<'a> WordCursor<'a> {
    pub fn done(&self) -> bool {
        assert!(
            self.word_index <= self.doc.unique_words.len(),
            "word_index = {}, unique words = {}",
            self.word_index,
            self.doc.unique_words.len()
        );
        self.word_index == self.doc.unique_words.len()
    }

    /// Moves to the next occurrence.
    pub fn advance(&mut self) {
        self.check_not_done("advance");
        self.slot += 1;
        if self.slot >= self.doc.word_end(self.word_index) {
            self.word_index += 1;
        }
    }

    pub fn word(&self) -> &str {
        self.check_not_done("word");
        &self.doc.unique_words[self.word_index]
    }

    pub fn topic(&self) -> usize {
        self.check_not_done("topic");
        self.doc.topics[self.slot]
    }

    /// Relabels the current occurrence, moving one count in the document
    /// histogram from the old topic to `new_topic`.
    pub fn set_topic(&mut self, new_topic: usize) {
        self.check_not_done("set_topic");
        let num_topics = self.doc.topic_histogram.len();
        assert!(
            new_topic < num_topics,
            "new_topic ({new_topic}) >= num_topics ({num_topics})"
        );
        let old_topic = self.doc.topics[self.slot];
        self.doc.topic_histogram[old_topic] -= 1;
        self.doc.topic_histogram[new_topic] += 1;
        self.doc.topics[self.slot] = new_topic;
    }

    /// The document being walked.
    pub fn document(&self) -> &Document {
        self.doc
    }

    fn check_not_done(&self, op: &str) {
        if self.done() {
            panic!("WordCursor::{op} called after the last occurrence");
        }
    }
}

/// An ordered, append-only collection of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /**
    Loads a corpus file with one document per line.

    Lines with at most one word are skipped. A line longer than
    [`crate::io::MAX_LINE_LENGTH`] or a line that cannot be turned into a
    document aborts the load.
    */
    pub fn load<P: AsRef<Path>>(path: P, num_topics: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let corpus = Self::from_reader(BufReader::new(file), num_topics)?;
        info!(
            path = %path.display(),
            documents = corpus.len(),
            occurrences = corpus.total_occurrences(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    pub fn from_reader<R: BufRead>(reader: R, num_topics: usize) -> Result<Self> {
        let mut corpus = Self::new();
        for_each_line(reader, |line_no, line| {
            if line.split_whitespace().nth(1).is_none() {
                debug!(line = line_no, "skipping line with fewer than 2 words");
                return Ok(());
            }
            let doc = Document::new(line, num_topics).map_err(|e| LdaError::Parse {
                line: line_no,
                reason: e.to_string(),
            })?;
            corpus.push(doc);
            Ok(())
        })?;
        Ok(corpus)
    }

    pub fn push(&mut self, doc: Document) {
        self.documents.push(doc);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Sum of all document lengths.
    pub fn total_occurrences(&self) -> usize {
        self.documents.iter().map(Document::len).sum()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Document> {
        self.documents.iter_mut()
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NUM_TOPICS: usize = 3;
    const CONTENT: &str = "apple orange apple";

    #[test]
    fn rejects_short_texts() {
        for text in ["", "   ", "orange", "  orange \t"] {
            assert!(
                Document::new(text, NUM_TOPICS).is_err(),
                "Expected {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_fewer_than_two_topics() {
        assert!(matches!(
            Document::new(CONTENT, 1),
            Err(LdaError::InvalidDocument(_))
        ));
    }

    #[test]
    fn initial_state_puts_all_mass_on_topic_zero() {
        let doc = Document::new(CONTENT, NUM_TOPICS).unwrap();
        assert_eq!(doc.unique_words(), ["apple", "orange"]);
        assert_eq!(doc.word_offsets, vec![0, 2]);
        assert_eq!(doc.topics(), [0, 0, 0]);
        assert_eq!(doc.topic_histogram(), [3, 0, 0]);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.num_topics(), NUM_TOPICS);
        assert!(doc.is_valid());

        for k in 2..6 {
            let doc = Document::new("b a c a b a", k).unwrap();
            let mut expected = vec![0; k];
            expected[0] = 6;
            assert_eq!(doc.topic_histogram(), expected.as_slice());
        }
    }

    #[test]
    fn cursor_visits_occurrences_in_word_order() {
        let mut doc = Document::new(CONTENT, NUM_TOPICS).unwrap();
        let mut cursor = doc.cursor();
        let mut visited = Vec::new();
        while !cursor.done() {
            visited.push((cursor.word().to_string(), cursor.topic()));
            cursor.advance();
        }
        assert_eq!(
            visited,
            vec![
                ("apple".to_string(), 0),
                ("apple".to_string(), 0),
                ("orange".to_string(), 0)
            ]
        );
    }

    #[test]
    fn words_matches_cursor_order() {
        let mut doc = Document::new("c a b a c c", 2).unwrap();
        let from_words: Vec<(String, usize)> =
            doc.words().map(|(w, t)| (w.to_string(), t)).collect();
        let mut from_cursor = Vec::new();
        let mut cursor = doc.cursor();
        while !cursor.done() {
            from_cursor.push((cursor.word().to_string(), cursor.topic()));
            cursor.advance();
        }
        assert_eq!(from_words, from_cursor);
    }

    #[test]
    fn set_topic_moves_histogram_mass() {
        let mut doc = Document::new(CONTENT, NUM_TOPICS).unwrap();
        {
            let mut cursor = doc.cursor();
            cursor.set_topic(2);
            cursor.advance();
            cursor.set_topic(1);
            cursor.advance();
            cursor.set_topic(0);
            assert_eq!(cursor.document().topic_histogram(), [1, 1, 1]);
        }
        assert_eq!(doc.topics(), [2, 1, 0]);
        assert!(doc.is_valid());
    }

    #[test]
    fn set_topic_to_same_topic_is_a_no_op() {
        let mut doc = Document::new(CONTENT, NUM_TOPICS).unwrap();
        doc.cursor().set_topic(0);
        assert_eq!(doc.topic_histogram(), [3, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "new_topic (3) >= num_topics (3)")]
    fn set_topic_out_of_range_panics() {
        let mut doc = Document::new(CONTENT, NUM_TOPICS).unwrap();
        doc.cursor().set_topic(3);
    }

    #[test]
    #[should_panic(expected = "advance called after the last occurrence")]
    fn advance_past_end_panics() {
        let mut doc = Document::new("a b", 2).unwrap();
        let mut cursor = doc.cursor();
        cursor.advance();
        cursor.advance();
        cursor.advance();
    }

    #[test]
    #[should_panic(expected = "word called after the last occurrence")]
    fn word_past_end_panics() {
        let mut doc = Document::new("a b", 2).unwrap();
        let mut cursor = doc.cursor();
        cursor.advance();
        cursor.advance();
        let _ = cursor.word();
    }

    #[test]
    #[should_panic(expected = "set_topic called after the last occurrence")]
    fn set_topic_past_end_panics() {
        let mut doc = Document::new("a b", 2).unwrap();
        let mut cursor = doc.cursor();
        cursor.advance();
        cursor.advance();
        cursor.set_topic(1);
    }

    #[test]
    fn corpus_from_reader_skips_short_lines() {
        let input = "apple orange apple\n\nlonely\n  \njagar zebra\n";
        let corpus = Corpus::from_reader(input.as_bytes(), 2).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.documents()[0].unique_words(), ["apple", "orange"]);
        assert_eq!(corpus.documents()[0].topic_histogram(), [3, 0]);
        assert_eq!(corpus.documents()[1].unique_words(), ["jagar", "zebra"]);
        assert_eq!(corpus.documents()[1].topic_histogram(), [2, 0]);
        assert_eq!(corpus.total_occurrences(), 5);
    }

    #[test]
    fn corpus_load_reports_document_errors_with_line() {
        let err = Corpus::from_reader("a b\nc d\n".as_bytes(), 1).unwrap_err();
        assert!(matches!(err, LdaError::Parse { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn corpus_load_from_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/corpus.txt");
        let corpus = Corpus::load(path, 2).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.documents()[0].topics(), [0, 0, 0]);
        assert_eq!(corpus.documents()[1].topics(), [0, 0]);
    }

    #[test]
    fn corpus_load_missing_file_is_io_error() {
        let err = Corpus::load("/nonexistent/corpus.txt", 2).unwrap_err();
        assert!(matches!(err, LdaError::Io(_)));
    }

    proptest! {
        #[test]
        fn histogram_tracks_labels(
            words in proptest::collection::vec("[a-e]{1,3}", 2..30),
            moves in proptest::collection::vec(0usize..4, 0..60),
        ) {
            let text = words.join(" ");
            let mut doc = Document::new(&text, 4).unwrap();
            {
                let mut cursor = doc.cursor();
                for &t in &moves {
                    if cursor.done() {
                        break;
                    }
                    cursor.set_topic(t);
                    cursor.advance();
                }
            }
            prop_assert!(doc.is_valid());
            prop_assert_eq!(doc.topic_histogram().iter().sum::<i64>(), doc.len() as i64);
            prop_assert!(doc.topic_histogram().iter().all(|&c| c >= 0));
        }
    }
}
