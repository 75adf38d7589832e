use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Append-only text file, flushed after every write so an aborted run keeps
/// everything written before the failure.
pub struct LineSink {
    path: PathBuf,
    file: File,
}

impl LineSink {
    pub async fn open_append(path: PathBuf) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self { path, file })
    }

    /// Writes `text` followed by a newline.
    pub async fn append(&mut self, text: &str) -> std::io::Result<()> {
        let mut buf = String::with_capacity(text.len() + 1);
        buf.push_str(text);
        buf.push('\n');
        self.file.write_all(buf.as_bytes()).await?;
        self.file.flush().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `<output_dir>/<input file name>.<extension>`
pub fn sink_path(output_dir: &Path, input: &Path, extension: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    output_dir.join(format!("{name}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_path_uses_input_basename() {
        let path = sink_path(Path::new("/tmp/out"), Path::new("data/en/general.json"), "problems");
        assert_eq!(path, PathBuf::from("/tmp/out/general.json.problems"));
    }

    #[tokio::test]
    async fn test_append_accumulates_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.out");

        let mut sink = LineSink::open_append(path.clone()).await.unwrap();
        sink.append("first").await.unwrap();
        drop(sink);

        let mut sink = LineSink::open_append(path.clone()).await.unwrap();
        sink.append("second").await.unwrap();
        assert_eq!(sink.path(), path.as_path());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
