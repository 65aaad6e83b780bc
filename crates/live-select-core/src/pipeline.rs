use crate::collector::Collector;
use crate::error::SelectError;
use crate::exclusion::ExclusionStore;
use crate::guard::HistoryGuard;
use crate::selector::{select_with_report, SelectionPolicy, SelectionReport};
use crate::visit_history::VisitHistory;
use chrono::{DateTime, FixedOffset, TimeZone, Timelike};
use live_select_config::Config;
use live_select_models::{Room, Snapshot};
use live_select_sources::SnapshotSupplier;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Everything one run needs, resolved from configuration up front.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub policy: SelectionPolicy,
    pub exclusion_path: PathBuf,
    pub visit_history_path: PathBuf,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: SelectionPolicy::from_config(config),
            exclusion_path: config.exclusion_path(),
            visit_history_path: config.visit_history_path(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub candidates: Vec<Room>,
    pub report: SelectionReport,
    /// Visits recorded for rooms the collector acted on
    pub visited: usize,
    /// Entries in the saved history file
    pub history_size: usize,
    pub duration: std::time::Duration,
}

/// One pass: fetch, load lists, select, collect, save.
///
/// A supplier failure returns before any list file is read or written.
/// Once the history is restored it is saved on every exit path.
pub async fn run_once(
    settings: &RunSettings,
    supplier: &dyn SnapshotSupplier,
    collector: &mut dyn Collector,
    now: DateTime<FixedOffset>,
) -> Result<RunOutcome, SelectError> {
    let start = Instant::now();
    let category = settings.policy.category.as_str();

    let snapshot = supplier
        .fetch_snapshot()
        .await
        .map_err(|e| SelectError::Upstream(format!("{}: {}", supplier.supplier_name(), e)))?;
    log_snapshot_summary(&snapshot);

    let exclusions = ExclusionStore::load(category, &settings.exclusion_path)?;
    let history = VisitHistory::restore(
        category,
        &settings.visit_history_path,
        settings.policy.validity_minutes,
        now,
    )?;
    let mut guard = HistoryGuard::new(history, settings.visit_history_path.clone());

    let (candidates, report) = select_with_report(&snapshot, &settings.policy, &exclusions, guard.history(), now)?;
    log_candidates(category, &candidates, now);

    let acted_on = collector.collect(&candidates);
    // The history file keeps whole seconds; record what will be read back
    let visited_at = now.with_nanosecond(0).unwrap_or(now);
    for room_id in &acted_on {
        guard.history_mut().record_visit(*room_id, visited_at);
    }
    let history_size = guard.commit()?;

    info!(
        operation = "selection_run_complete",
        category,
        candidates = candidates.len(),
        considered = report.considered,
        skipped_excluded = report.skipped_excluded,
        skipped_cooldown = report.skipped_cooldown,
        skipped_duplicate = report.skipped_duplicate,
        skipped_genre = report.skipped_genre,
        truncated = report.truncated,
        visited = acted_on.len(),
        history_size,
        duration_ms = start.elapsed().as_millis() as u64,
        "Selection run completed"
    );

    Ok(RunOutcome {
        candidates,
        report,
        visited: acted_on.len(),
        history_size,
        duration: start.elapsed(),
    })
}

fn log_snapshot_summary(snapshot: &Snapshot) {
    info!(
        genres = snapshot.genre_count(),
        rooms = snapshot.room_count(),
        "Live rooms on air"
    );
    for group in &snapshot.onlives {
        debug!(
            genre_id = group.genre_id,
            genre_name = %group.genre_name,
            rooms = group.lives.len(),
            "Genre"
        );
    }
}

fn log_candidates(category: &str, candidates: &[Room], now: DateTime<FixedOffset>) {
    info!(category, candidates = candidates.len(), "Candidate rooms selected");
    for room in candidates {
        let started = now
            .offset()
            .timestamp_opt(room.started_at, 0)
            .single()
            .map(|t| t.format("%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| room.started_at.to_string());
        info!(
            category,
            room_id = room.room_id,
            started = %started,
            main_name = %room.main_name,
            "Candidate"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::HandoffCollector;
    use crate::visit_history::parse_timestamp;
    use async_trait::async_trait;
    use live_select_models::{GenreGroup, LiveRoom};
    use live_select_sources::SourceError;
    use tempfile::TempDir;

    struct StaticSupplier(Snapshot);

    #[async_trait]
    impl SnapshotSupplier for StaticSupplier {
        fn supplier_name(&self) -> &str {
            "static"
        }

        async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSupplier;

    #[async_trait]
    impl SnapshotSupplier for FailingSupplier {
        fn supplier_name(&self) -> &str {
            "failing"
        }

        async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
            Err(SourceError::new("connection refused".to_string()))
        }
    }

    fn now() -> DateTime<FixedOffset> {
        parse_timestamp("2022/08/11 13:00:00 +0900 JST").unwrap()
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![GenreGroup {
            genre_id: 101,
            genre_name: "Music".to_string(),
            lives: vec![
                LiveRoom::new(101, 1_660_190_000, "a"),
                LiveRoom::new(102, 1_660_190_100, "b"),
                LiveRoom::new(103, 1_660_190_200, "c"),
            ],
        }])
    }

    fn settings(dir: &TempDir, max_candidates: i64) -> RunSettings {
        RunSettings {
            policy: SelectionPolicy::new("Official", 60, max_candidates),
            exclusion_path: dir.path().join("excl.txt"),
            visit_history_path: dir.path().join("rvl.txt"),
        }
    }

    #[tokio::test]
    async fn test_run_records_and_saves_visits() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, 10);
        std::fs::write(&settings.exclusion_path, "102\tskip me\n").unwrap();
        std::fs::write(
            &settings.visit_history_path,
            "\"2022/08/11 09:00:00 +0900 JST\"\t555\n",
        )
        .unwrap();

        let supplier = StaticSupplier(snapshot());
        let mut collector = HandoffCollector::new(false);
        let outcome = run_once(&settings, &supplier, &mut collector, now()).await.unwrap();

        let ids: Vec<_> = outcome.candidates.iter().map(|r| r.room_id).collect();
        assert_eq!(ids, vec![101, 103]);
        assert_eq!(outcome.visited, 2);
        // The stale 555 entry was pruned on restore
        assert_eq!(outcome.history_size, 2);

        let content = std::fs::read_to_string(&settings.visit_history_path).unwrap();
        assert_eq!(
            content,
            "\"2022/08/11 13:00:00 +0900 +09\"\t101\n\"2022/08/11 13:00:00 +0900 +09\"\t103\n"
        );

        // A second run in the same window finds nothing new
        let outcome = run_once(&settings, &supplier, &mut collector, now()).await.unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.report.skipped_cooldown, 2);
    }

    #[tokio::test]
    async fn test_visits_are_recorded_in_whole_seconds() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, 1);
        let at = parse_timestamp("2022/08/11 13:00:00.750 +0900 JST").unwrap();

        let mut collector = HandoffCollector::new(false);
        run_once(&settings, &StaticSupplier(snapshot()), &mut collector, at).await.unwrap();

        let history = VisitHistory::restore("Official", &settings.visit_history_path, 60, at).unwrap();
        assert_eq!(history.last_visit(101), Some(now()));
    }

    #[tokio::test]
    async fn test_dry_run_saves_pruned_history_only() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, 10);

        let supplier = StaticSupplier(snapshot());
        let mut collector = HandoffCollector::new(true);
        let outcome = run_once(&settings, &supplier, &mut collector, now()).await.unwrap();

        assert_eq!(outcome.candidates.len(), 3);
        assert_eq!(outcome.visited, 0);
        assert_eq!(std::fs::read_to_string(&settings.visit_history_path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_history_untouched() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, 10);
        let original = "\"2022/08/11 09:00:00 +0900 JST\"\t555\n";
        std::fs::write(&settings.visit_history_path, original).unwrap();

        let mut collector = HandoffCollector::new(false);
        let err = run_once(&settings, &FailingSupplier, &mut collector, now()).await.unwrap_err();

        assert!(matches!(err, SelectError::Upstream(ref msg) if msg.contains("connection refused")));
        assert_eq!(std::fs::read_to_string(&settings.visit_history_path).unwrap(), original);
    }

    #[tokio::test]
    async fn test_selection_error_still_saves_restored_history() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, 10);
        std::fs::write(
            &settings.visit_history_path,
            "\"2022/08/11 09:00:00 +0900 JST\"\t555\n\"2022/08/11 12:30:00 +0900 JST\"\t556\n",
        )
        .unwrap();

        let mut broken = snapshot();
        broken.onlives[0].lives.push(LiveRoom::default());
        let mut collector = HandoffCollector::new(false);
        let err = run_once(&settings, &StaticSupplier(broken), &mut collector, now()).await.unwrap_err();
        assert!(matches!(err, SelectError::MalformedSnapshot { .. }));

        // Guard wrote back the pruned, unmodified history
        assert_eq!(
            std::fs::read_to_string(&settings.visit_history_path).unwrap(),
            "\"2022/08/11 12:30:00 +0900 +09\"\t556\n"
        );
    }

    #[tokio::test]
    async fn test_malformed_exclusion_list_aborts_without_writing() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, 10);
        std::fs::write(&settings.exclusion_path, "not-a-number\tx\n").unwrap();

        let mut collector = HandoffCollector::new(false);
        let err = run_once(&settings, &StaticSupplier(snapshot()), &mut collector, now()).await.unwrap_err();

        assert!(matches!(err, SelectError::Parse { .. }));
        assert!(!settings.visit_history_path.exists());
    }
}
