//! Append-only JSON-lines trade store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tc_core::{CollectorError, Trade};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use super::TradeStore;

pub struct JsonlTradeStore {
    path: PathBuf,
    writer: Mutex<BufWriter<tokio::fs::File>>,
}

impl JsonlTradeStore {
    /// Open `path` for appending, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CollectorError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| CollectorError::Store(format!("open {}: {e}", path.display())))?;
        Ok(Self { path, writer: Mutex::new(BufWriter::new(file)) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TradeStore for JsonlTradeStore {
    async fn save(&self, trade: &Trade) -> Result<(), CollectorError> {
        let mut line = serde_json::to_vec(trade).map_err(|e| CollectorError::Parse(e.to_string()))?;
        line.push(b'\n');
        let mut w = self.writer.lock().await;
        w.write_all(&line).await.map_err(|e| CollectorError::Store(format!("{}: {e}", self.path.display())))
    }

    async fn flush(&self) -> Result<(), CollectorError> {
        let mut w = self.writer.lock().await;
        w.flush().await.map_err(|e| CollectorError::Store(format!("{}: {e}", self.path.display())))
    }
}
