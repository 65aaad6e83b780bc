use async_trait::async_trait;
use live_select_models::Snapshot;
use crate::error::SourceError;

/// Produces the per-genre listing of rooms broadcasting right now.
///
/// One call per run. Implementations own their transport, retries and
/// timeouts; callers only see a complete snapshot or an error.
#[async_trait]
pub trait SnapshotSupplier: Send + Sync {
    fn supplier_name(&self) -> &str;

    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError>;
}
