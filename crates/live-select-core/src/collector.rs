use live_select_models::{Room, RoomId};
use tracing::info;

/// Downstream consumer of a candidate list.
///
/// Returns the rooms it actually acted on; only those get a visit recorded.
pub trait Collector: Send {
    fn collect(&mut self, candidates: &[Room]) -> Vec<RoomId>;
}

/// Hands the list to an external collection task and counts every room as visited.
///
/// With `dry_run` nothing is reported as visited, so the next run sees the same rooms.
#[derive(Debug, Default)]
pub struct HandoffCollector {
    dry_run: bool,
}

impl HandoffCollector {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl Collector for HandoffCollector {
    fn collect(&mut self, candidates: &[Room]) -> Vec<RoomId> {
        if self.dry_run {
            info!(candidates = candidates.len(), "Dry run: not recording visits");
            return Vec::new();
        }
        candidates.iter().map(|r| r.room_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(room_id: RoomId) -> Room {
        Room {
            room_id,
            genre_id: 101,
            genre_name: "Music".to_string(),
            started_at: 0,
            main_name: "x".to_string(),
        }
    }

    #[test]
    fn test_handoff_reports_all_candidates() {
        let mut collector = HandoffCollector::new(false);
        assert_eq!(collector.collect(&[room(1), room(2)]), vec![1, 2]);
    }

    #[test]
    fn test_dry_run_reports_none() {
        let mut collector = HandoffCollector::new(true);
        assert!(collector.collect(&[room(1), room(2)]).is_empty());
    }
}
