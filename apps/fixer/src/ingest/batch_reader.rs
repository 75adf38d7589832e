use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Splits a line-delimited source into fixed-size windows.
///
/// The first line is a header and is always discarded; `skip` further lines are
/// discarded after it so a previous run can be resumed. Lines keep their line
/// terminators. An empty window means the source is exhausted.
pub struct BatchReader<R> {
    reader: R,
    window_size: usize,
    consumed: usize,
}

impl BatchReader<BufReader<File>> {
    pub async fn open(path: &Path, window_size: usize, skip: usize) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        Self::new(BufReader::new(file), window_size, skip).await
    }
}

impl<R: AsyncBufRead + Unpin> BatchReader<R> {
    pub async fn new(mut reader: R, window_size: usize, skip: usize) -> std::io::Result<Self> {
        let mut line = String::new();
        // header
        reader.read_line(&mut line).await?;
        let mut consumed = 0;
        for _ in 0..skip {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }
            consumed += 1;
        }
        Ok(Self {
            reader,
            window_size: window_size.max(1),
            consumed,
        })
    }

    pub async fn next_window(&mut self) -> std::io::Result<Vec<String>> {
        let mut window = Vec::with_capacity(self.window_size);
        while window.len() < self.window_size {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                break;
            }
            window.push(line);
        }
        self.consumed += window.len();
        Ok(window)
    }

    /// Data lines consumed so far, skipped ones included. This is the `skip`
    /// value that resumes right after the last window returned.
    pub fn offset(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &[u8] = b"[\n{\"q\":1},\n{\"q\":2},\n{\"q\":3},\n{\"q\":4},\n{\"q\":5}\n";

    #[tokio::test]
    async fn test_windows_skip_header_and_keep_line_breaks() {
        let mut reader = BatchReader::new(SOURCE, 2, 0).await.unwrap();
        assert_eq!(
            reader.next_window().await.unwrap(),
            vec!["{\"q\":1},\n", "{\"q\":2},\n"]
        );
        assert_eq!(
            reader.next_window().await.unwrap(),
            vec!["{\"q\":3},\n", "{\"q\":4},\n"]
        );
        assert_eq!(reader.next_window().await.unwrap(), vec!["{\"q\":5}\n"]);
        assert!(reader.next_window().await.unwrap().is_empty());
        assert_eq!(reader.offset(), 5);
    }

    #[tokio::test]
    async fn test_resume_offset_skips_lines_after_header() {
        let mut reader = BatchReader::new(SOURCE, 10, 3).await.unwrap();
        assert_eq!(reader.offset(), 3);
        assert_eq!(
            reader.next_window().await.unwrap(),
            vec!["{\"q\":4},\n", "{\"q\":5}\n"]
        );
        assert_eq!(reader.offset(), 5);
    }

    #[tokio::test]
    async fn test_restart_from_offset_matches_continuation() {
        let mut first = BatchReader::new(SOURCE, 2, 0).await.unwrap();
        first.next_window().await.unwrap();
        let continued = first.next_window().await.unwrap();

        let mut restarted = BatchReader::new(SOURCE, 2, 2).await.unwrap();
        assert_eq!(restarted.next_window().await.unwrap(), continued);
    }

    #[tokio::test]
    async fn test_skip_past_end_yields_empty_window() {
        let mut reader = BatchReader::new(SOURCE, 2, 50).await.unwrap();
        assert_eq!(reader.offset(), 5);
        assert!(reader.next_window().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_header_only_source() {
        let mut reader = BatchReader::new(&b"header\n"[..], 3, 0).await.unwrap();
        assert!(reader.next_window().await.unwrap().is_empty());
    }
}
