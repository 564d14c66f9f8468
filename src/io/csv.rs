/*!
# CSV export of topic-word probabilities

Enable via the `csv` feature.
*/

use std::fs::File;
use std::path::Path;

use csv::Writer;
use ndarray::Array2;

use crate::error::Result;
use crate::model::Model;

/**
Saves the smoothed `P(word | topic)` matrix of `model` as a CSV file.

The file has a header row `word,topic_0,topic_1,...` followed by one row
per word in sorted order.

# Examples

```rust
use gibbs_lda::io::csv::save_topic_word_csv;
use gibbs_lda::model::Model;

let mut model = Model::new(2);
model.increment_topic("apple", 0, 3);
model.increment_topic("zebra", 1, 2);
save_topic_word_csv(&model, 0.01, "/tmp/topics.csv").expect("Expecting saving to succeed");
```
*/
pub fn save_topic_word_csv<P: AsRef<Path>>(model: &Model, word_prior: f64, path: P) -> Result<()> {
    let (vocabulary, matrix) = model.topic_word_matrix(word_prior);
    let mut wtr = Writer::from_writer(File::create(path)?);
    write_matrix(&mut wtr, &vocabulary, &matrix)?;
    wtr.flush()?;
    Ok(())
}

fn write_matrix<W: std::io::Write>(
    wtr: &mut Writer<W>,
    vocabulary: &[String],
    matrix: &Array2<f64>,
) -> Result<()> {
    let mut header = vec!["word".to_string()];
    header.extend((0..matrix.ncols()).map(|k| format!("topic_{k}")));
    wtr.write_record(&header)?;

    for (word, row) in vocabulary.iter().zip(matrix.rows()) {
        let mut record = vec![word.clone()];
        record.extend(row.iter().map(|p| p.to_string()));
        wtr.write_record(&record)?;
    }
    Ok(())
}
