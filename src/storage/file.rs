//! Directory-backed snapshot store.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temporary sibling file
//! first and are renamed into place, so a crash mid-write leaves the previous
//! snapshot intact.

use super::StateStore;
use crate::error::{GraphError, Result};
use crate::types::GraphState;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores snapshots as pretty-printed JSON files.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(GraphError::Storage(format!("invalid storage key: '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn save(&self, key: &str, state: &GraphState) -> Result<()> {
        let path = self.path_for(key)?;
        let body = serde_json::to_vec_pretty(state)?;

        fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &body).await?;
        fs::rename(&tmp, &path).await?;

        tracing::trace!(path = %path.display(), bytes = body.len(), "snapshot written");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<GraphState>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewNode;
    use crate::version::ClientId;

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state"));
        let client = ClientId::new("A");

        let mut state = GraphState::new(&client);
        state
            .nodes
            .push(NewNode::new().with_id("n1").with_data("title", "X").into_node(&client).unwrap());

        store.save("flow-state", &state).await.unwrap();
        assert!(dir.path().join("state/flow-state.json").exists());

        let loaded = store.load("flow-state").await.unwrap();
        assert_eq!(loaded, Some(state));
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("flow-state").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("flow-state.json"), b"{not json").unwrap();

        let store = FileStore::new(dir.path());
        let err = store.load("flow-state").await.unwrap_err();
        assert!(matches!(err, GraphError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let store = FileStore::new("/tmp/unused");
        let state = GraphState::new(&ClientId::new("A"));
        assert!(store.save("../escape", &state).await.is_err());
        assert!(store.load("").await.is_err());
    }
}
