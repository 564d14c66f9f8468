/*!
# Line-oriented file helpers

Corpus and model files are both read one bounded line at a time. The optional
`csv` module exports a trained model's topic-word matrix.
*/

#[cfg(feature = "csv")]
pub mod csv;

use std::io::{BufRead, Read};

use crate::error::{LdaError, Result};

/// Maximum accepted length of a single line in corpus and model files (1 MiB).
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Reads every line of `reader`, rejecting lines longer than [`MAX_LINE_LENGTH`].
///
/// Calls `f` with the 1-based line number and the line without its terminator.
pub(crate) fn for_each_line<R, F>(reader: R, f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &str) -> Result<()>,
{
    for_each_line_bounded(reader, MAX_LINE_LENGTH, f)
}

pub(crate) fn for_each_line_bounded<R, F>(mut reader: R, limit: usize, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &str) -> Result<()>,
{
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        // One byte past the limit plus the newline is enough to detect an oversized line.
        let n = (&mut reader)
            .take(limit as u64 + 2)
            .read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(());
        }
        line_no += 1;

        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > limit {
            return Err(LdaError::LineTooLong {
                line: line_no,
                limit,
            });
        }

        let line = std::str::from_utf8(&buf).map_err(|e| LdaError::Parse {
            line: line_no,
            reason: format!("invalid UTF-8: {e}"),
        })?;
        f(line_no, line)?;
    }
}
