//! Persisted ticket sequence counter.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tix_core::{read_json_or_default, write_json_atomic};
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
/// Trait contract for `CounterStore` behavior.
pub trait CounterStore: Send + Sync {
    /// Current count as loaded at startup plus any increments since.
    async fn load(&self) -> Result<u64>;
    /// Increments, persists, and returns the new count.
    async fn increment(&self) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CounterFile {
    count: u64,
}

/// `{"count": N}` file store.
///
/// The async mutex is held across the file write, so concurrent increments
/// are serialized and each caller observes a distinct value.
pub struct JsonFileCounterStore {
    path: PathBuf,
    count: Mutex<u64>,
}

impl JsonFileCounterStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file: CounterFile = read_json_or_default(&path)
            .with_context(|| format!("failed to load ticket counter {}", path.display()))?;
        debug!(path = %path.display(), count = file.count, "ticket counter loaded");
        Ok(Self {
            path,
            count: Mutex::new(file.count),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CounterStore for JsonFileCounterStore {
    async fn load(&self) -> Result<u64> {
        Ok(*self.count.lock().await)
    }

    async fn increment(&self) -> Result<u64> {
        let mut count = self.count.lock().await;
        let next = count
            .checked_add(1)
            .context("ticket counter overflowed u64")?;
        write_json_atomic(&self.path, &CounterFile { count: next })
            .with_context(|| format!("failed to persist ticket counter {}", self.path.display()))?;
        *count = next;
        Ok(next)
    }
}

#[derive(Debug, Default)]
/// Non-persistent store for tests and dry runs.
pub struct InMemoryCounterStore {
    count: Mutex<u64>,
}

impl InMemoryCounterStore {
    pub fn with_count(count: u64) -> Self {
        Self {
            count: Mutex::new(count),
        }
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn load(&self) -> Result<u64> {
        Ok(*self.count.lock().await)
    }

    async fn increment(&self) -> Result<u64> {
        let mut count = self.count.lock().await;
        *count = count
            .checked_add(1)
            .context("ticket counter overflowed u64")?;
        Ok(*count)
    }
}
