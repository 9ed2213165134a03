use crate::domain::ports::Storage;
use crate::utils::error::{CollectorError, Result};
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Appends each record as one line. The file is opened and closed on every call.
#[derive(Debug, Clone, Default)]
pub struct JsonlStorage;

impl JsonlStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for JsonlStorage {
    async fn append_line(&self, path: &Path, data: &[u8]) -> Result<()> {
        let io_error = |source| CollectorError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut line = Vec::with_capacity(data.len() + 1);
        line.extend_from_slice(data);
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(io_error)?;

        // 單次寫入整行，讀取端不會看到半行
        file.write_all(&line).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;

        tracing::debug!("Appended {} bytes to {}", line.len(), path.display());
        Ok(())
    }
}
