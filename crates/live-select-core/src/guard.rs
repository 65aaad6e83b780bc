use crate::error::SelectError;
use crate::visit_history::VisitHistory;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Owns a restored history and saves it when the run ends, however it ends.
///
/// `commit` saves and reports the outcome; dropping an uncommitted guard
/// (early return, `?`, panic unwind) saves as well and logs any failure.
pub struct HistoryGuard {
    history: VisitHistory,
    path: PathBuf,
    armed: bool,
}

impl HistoryGuard {
    pub fn new(history: VisitHistory, path: PathBuf) -> Self {
        Self {
            history,
            path,
            armed: true,
        }
    }

    pub fn history(&self) -> &VisitHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut VisitHistory {
        &mut self.history
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save now. Returns the number of visits written.
    pub fn commit(mut self) -> Result<usize, SelectError> {
        self.armed = false;
        self.history.save(&self.path)?;
        Ok(self.history.len())
    }
}

impl Drop for HistoryGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.history.save(&self.path) {
            Ok(()) => info!(
                operation = "history_guard_save",
                path = %self.path.display(),
                visits = self.history.len(),
                "Saved visit history on early exit"
            ),
            Err(e) => error!(
                operation = "history_guard_save",
                path = %self.path.display(),
                error = %e,
                "Failed to save visit history on early exit"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visit_history::parse_timestamp;
    use tempfile::TempDir;

    #[test]
    fn test_drop_saves_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rvl.txt");
        {
            let mut guard = HistoryGuard::new(VisitHistory::new("Free"), path.clone());
            guard
                .history_mut()
                .record_visit(42, parse_timestamp("2022/08/11 12:00:00 +0900 JST").unwrap());
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "\"2022/08/11 12:00:00 +0900 +09\"\t42\n");
    }

    #[test]
    fn test_commit_saves_once_and_reports_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rvl.txt");
        let mut guard = HistoryGuard::new(VisitHistory::new("Free"), path.clone());
        guard
            .history_mut()
            .record_visit(1, parse_timestamp("2022/08/11 12:00:00 +0900 JST").unwrap());
        guard
            .history_mut()
            .record_visit(2, parse_timestamp("2022/08/11 12:01:00 +0900 JST").unwrap());

        assert_eq!(guard.commit().unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_commit_surfaces_save_error() {
        let dir = TempDir::new().unwrap();
        // The target is a directory, so the final rename fails
        let path = dir.path().join("rvl.txt");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let guard = HistoryGuard::new(VisitHistory::new("Free"), path.clone());
        assert!(guard.commit().is_err());
        assert!(path.join("keep").exists());
    }
}
