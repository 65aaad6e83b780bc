use async_trait::async_trait;
use live_select_models::Snapshot;
use std::path::PathBuf;
use tracing::debug;
use crate::error::SourceError;
use crate::traits::SnapshotSupplier;

/// Replays a listing saved to disk in the same JSON shape the live endpoint returns.
pub struct FileSnapshotSupplier {
    path: PathBuf,
}

impl FileSnapshotSupplier {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SnapshotSupplier for FileSnapshotSupplier {
    fn supplier_name(&self) -> &str {
        "file"
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceError::new(format!("Failed to read snapshot file {}: {}", self.path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        debug!(
            path = %self.path.display(),
            genres = snapshot.genre_count(),
            "Loaded snapshot from file"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_file_supplier_reads_listing() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"onlives":[{{"genre_id":101,"genre_name":"Music","lives":[{{"room_id":1,"started_at":10,"main_name":"a"}}]}}]}}"#
        )
        .unwrap();

        let supplier = FileSnapshotSupplier::new(file.path().to_path_buf());
        let snapshot = supplier.fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.genre_count(), 1);
        assert_eq!(snapshot.onlives[0].lives[0].room_id, Some(1));
    }

    #[tokio::test]
    async fn test_file_supplier_missing_file_is_error() {
        let supplier = FileSnapshotSupplier::new(PathBuf::from("/nonexistent/snapshot.json"));
        let err = supplier.fetch_snapshot().await.unwrap_err();
        assert!(err.message().contains("/nonexistent/snapshot.json"));
    }
}
