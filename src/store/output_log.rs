//! Newline-delimited JSON artifact holding one run's rate records

use crate::core::rates::RateRecord;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct OutputLog {
    path: PathBuf,
}

impl OutputLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        OutputLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empties the artifact, creating it and its parent directory if needed.
    pub async fn reset(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::File::create(&self.path).await?;
        debug!(path = %self.path.display(), "Reset output log");
        Ok(())
    }

    /// Appends one record as a single line; never truncates.
    pub async fn append(&self, record: &RateRecord) -> io::Result<()> {
        let mut line = record.to_json_line().map_err(io::Error::other)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn read_lines(&self) -> io::Result<Vec<String>> {
        let content = fs::read_to_string(&self.path).await?;
        Ok(content.lines().map(String::from).collect())
    }
}
