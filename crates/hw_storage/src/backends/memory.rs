use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hw_core::{Checkpoint, CheckpointStore, Result};
use tokio::sync::RwLock;

/// In-process checkpoint store. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    checkpoint: Arc<RwLock<Option<Checkpoint>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            checkpoint: Arc::new(RwLock::new(Some(checkpoint))),
            saves: Arc::default(),
        }
    }

    /// The last saved checkpoint, if any.
    pub async fn snapshot(&self) -> Option<Checkpoint> {
        self.checkpoint.read().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn load(&self) -> Result<Checkpoint> {
        Ok(self.checkpoint.read().await.clone().unwrap_or_default())
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        *self.checkpoint.write().await = Some(checkpoint.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
