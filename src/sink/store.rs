//! Result storage backends.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::CrawlError;
use crate::models::Item;

/// Destination for flushed item batches. A write failure fails the whole
/// batch; the sink decides what to do with it.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn write(&self, batch: &[Item]) -> Result<(), CrawlError>;
}

/// Appends items to a JSON-lines file, one item per line. The file is
/// opened per flush in append mode; the lock keeps batches whole.
pub struct JsonlStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl ResultStore for JsonlStore {
    async fn write(&self, batch: &[Item]) -> Result<(), CrawlError> {
        let mut buf = Vec::with_capacity(batch.len() * 256);
        for item in batch {
            serde_json::to_writer(&mut buf, item)
                .map_err(|e| CrawlError::Store(format!("serialize item: {e}")))?;
            buf.push(b'\n');
        }

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| CrawlError::Store(format!("open {}: {e}", self.path.display())))?;
        file.write_all(&buf)
            .await
            .map_err(|e| CrawlError::Store(format!("append {}: {e}", self.path.display())))?;
        file.flush()
            .await
            .map_err(|e| CrawlError::Store(format!("flush {}: {e}", self.path.display())))?;
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<Vec<Item>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn items(&self) -> Vec<Item> {
        self.items.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn write(&self, batch: &[Item]) -> Result<(), CrawlError> {
        self.items.lock().await.extend_from_slice(batch);
        Ok(())
    }
}
