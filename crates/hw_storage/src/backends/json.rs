use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hw_core::{Checkpoint, CheckpointStore, Error, Result};
use tracing::debug;

/// Checkpoint persisted as a pretty-printed JSON document.
///
/// A missing file loads as a fresh checkpoint. A file that exists but
/// cannot be read or parsed is reported as [`Error::CorruptState`] rather
/// than replaced, since starting over would repost history.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn corrupt(&self, reason: impl ToString) -> Error {
        Error::CorruptState {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl CheckpointStore for JsonFileStore {
    async fn load(&self) -> Result<Checkpoint> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state file at {}, starting fresh", self.path.display());
                return Ok(Checkpoint::default());
            }
            Err(e) => return Err(self.corrupt(e)),
        };

        serde_json::from_str(&raw).map_err(|e| self.corrupt(e))
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Going through Value sorts the keys.
        let document = serde_json::to_value(checkpoint)?;
        let mut json = serde_json::to_string_pretty(&document)?;
        json.push('\n');

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        let checkpoint = store.load().await.unwrap();

        assert_eq!(checkpoint, Checkpoint::default());
    }

    #[tokio::test]
    async fn test_round_trip_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = JsonFileStore::new(&path);

        let mut checkpoint = store.load().await.unwrap();
        checkpoint.news_cursor = Some("news".to_string());
        checkpoint.posted_uris = vec!["uri-1".to_string()];
        checkpoint.bootstrap_completed = true;
        store.save(&checkpoint).await.unwrap();

        assert!(path.exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().await.unwrap(), checkpoint);
    }

    #[tokio::test]
    async fn test_saved_document_is_sorted_json() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        store.save(&Checkpoint::default()).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let keys: Vec<&str> = raw
            .lines()
            .filter_map(|line| line.trim().strip_prefix('"'))
            .filter_map(|line| line.split('"').next())
            .collect();
        assert_eq!(
            keys,
            vec![
                "bootstrapCompleted",
                "postedArticleUris",
                "updatesAfterBlogUri",
                "updatesAfterNewsUri",
                "updatesAfterPrUri",
            ]
        );
    }

    #[tokio::test]
    async fn test_state_written_by_older_versions_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"updatesAfterNewsUri": "n-1", "postedArticleUris": ["a"]}"#).unwrap();

        let checkpoint = JsonFileStore::new(&path).load().await.unwrap();

        assert_eq!(checkpoint.news_cursor.as_deref(), Some("n-1"));
        assert_eq!(checkpoint.posted_uris, vec!["a".to_string()]);
        assert!(!checkpoint.bootstrap_completed);
    }

    #[tokio::test]
    async fn test_malformed_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();

        assert!(matches!(err, Error::CorruptState { .. }));
        assert!(err.is_fatal());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_wrong_document_shape_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"postedArticleUris": "uri-1"}"#).unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();

        assert!(matches!(err, Error::CorruptState { .. }));
    }
}
