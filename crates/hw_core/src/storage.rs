use async_trait::async_trait;

use crate::checkpoint::Checkpoint;
use crate::Result;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Loads the persisted checkpoint, or a default one if none exists yet
    async fn load(&self) -> Result<Checkpoint>;

    /// Persists the checkpoint, replacing any previous one
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
}
