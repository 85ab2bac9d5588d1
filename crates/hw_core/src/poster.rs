use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait Poster: Send + Sync {
    /// Returns the name of the destination platform
    fn name(&self) -> &str;

    /// Publishes one post. Any error is treated as recoverable by callers.
    async fn post(&self, text: &str) -> Result<()>;
}
