//! Comment-aware line reading for plain-text input files.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Yields trimmed lines, skipping blanks and `#` comments.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buf: String,
}

impl LineReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: String::new(),
        }
    }

    /// Next meaningful line, or an empty string once the stream is exhausted.
    ///
    /// Read errors are treated as end of stream.
    pub fn next_line(&mut self) -> String {
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => return String::new(),
                Ok(_) => {
                    let line = self.buf.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    return line.to_owned();
                }
                Err(err) => {
                    tracing::debug!(%err, "line reader stopped on read error");
                    return String::new();
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let line = self.next_line();
        if line.is_empty() { None } else { Some(line) }
    }
}
