//! Append-only file sink

use crate::client::LogSink;
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::warn;

/// Sink that appends every line to a file
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed.
    ///
    /// An open failure does not error; the sink is simply not valid.
    pub async fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let writer = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(file) => Some(BufWriter::new(file)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to open log file");
                None
            }
        };

        Self {
            path,
            writer: Mutex::new(writer),
        }
    }

    /// File being appended to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for FileSink {
    async fn write(&self, line: &str) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Ok(());
        };

        let result = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Write to log file failed");
            *guard = None;
            return Err(e.into());
        }
        Ok(())
    }

    async fn is_valid(&self) -> bool {
        self.writer.lock().await.is_some()
    }
}
