use live_select_config::Config;
use std::path::PathBuf;
use tracing::info;
use crate::error::SourceError;
use crate::file::FileSnapshotSupplier;
use crate::showroom::ShowroomClient;
use crate::traits::SnapshotSupplier;

/// Build the supplier for a run: a saved listing when one is given, otherwise the live API.
pub fn create_supplier(
    config: &Config,
    snapshot_file: Option<PathBuf>,
) -> Result<Box<dyn SnapshotSupplier>, SourceError> {
    match snapshot_file {
        Some(path) => {
            info!(path = %path.display(), "Using snapshot file instead of live listing");
            Ok(Box::new(FileSnapshotSupplier::new(path)))
        }
        None => Ok(Box::new(ShowroomClient::from_config(&config.api)?)),
    }
}
