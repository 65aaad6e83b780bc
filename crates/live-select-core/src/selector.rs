use crate::error::SelectError;
use crate::exclusion::ExclusionStore;
use crate::visit_history::CooldownView;
use chrono::{DateTime, FixedOffset};
use live_select_config::{CandidateOrder, Config};
use live_select_models::{Room, RoomId, Snapshot};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::debug;

/// Per-run selection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub category: String,
    pub validity_minutes: i64,
    pub max_candidates: i64,
    /// Applicable genre ids; empty accepts every genre
    pub genres: Vec<i64>,
    pub order: CandidateOrder,
}

impl SelectionPolicy {
    pub fn new(category: &str, validity_minutes: i64, max_candidates: i64) -> Self {
        Self {
            category: category.to_string(),
            validity_minutes,
            max_candidates,
            genres: Vec::new(),
            order: CandidateOrder::Snapshot,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            category: config.category.clone(),
            validity_minutes: config.validity_minutes,
            max_candidates: config.max_candidates,
            genres: config.category_genres(),
            order: config.order,
        }
    }

    pub fn with_genres(mut self, genres: Vec<i64>) -> Self {
        self.genres = genres;
        self
    }

    pub fn with_order(mut self, order: CandidateOrder) -> Self {
        self.order = order;
        self
    }

    fn limit(&self) -> Result<usize, SelectError> {
        if self.validity_minutes <= 0 {
            return Err(SelectError::Precondition(format!(
                "validity_minutes must be positive, got {}",
                self.validity_minutes
            )));
        }
        if self.max_candidates <= 0 {
            return Err(SelectError::Precondition(format!(
                "max_candidates must be positive, got {}",
                self.max_candidates
            )));
        }
        Ok(usize::try_from(self.max_candidates).unwrap_or(usize::MAX))
    }
}

/// Counters describing how a candidate list was reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReport {
    /// Rooms checked against the exclusion list and the cooldown
    pub considered: usize,
    pub skipped_excluded: usize,
    pub skipped_cooldown: usize,
    pub skipped_duplicate: usize,
    pub skipped_genre: usize,
    /// The limit was reached with rooms left unchecked
    pub truncated: bool,
}

/// Pick at most `max_candidates` rooms that are neither excluded nor cooling down.
///
/// Pure: neither store is modified and no visit is recorded.
pub fn select(
    snapshot: &Snapshot,
    policy: &SelectionPolicy,
    exclusions: &ExclusionStore,
    cooldown: &dyn CooldownView,
    now: DateTime<FixedOffset>,
) -> Result<Vec<Room>, SelectError> {
    select_with_report(snapshot, policy, exclusions, cooldown, now).map(|(rooms, _)| rooms)
}

pub fn select_with_report(
    snapshot: &Snapshot,
    policy: &SelectionPolicy,
    exclusions: &ExclusionStore,
    cooldown: &dyn CooldownView,
    now: DateTime<FixedOffset>,
) -> Result<(Vec<Room>, SelectionReport), SelectError> {
    let limit = policy.limit()?;
    let mut report = SelectionReport::default();

    let mut rooms = flatten(snapshot, &policy.genres, &mut report)?;
    match policy.order {
        CandidateOrder::Snapshot => {}
        // Stable sorts: equal start times keep listing order
        CandidateOrder::NewestFirst => rooms.sort_by_key(|r| Reverse(r.started_at)),
        CandidateOrder::OldestFirst => rooms.sort_by_key(|r| r.started_at),
    }

    let total = rooms.len();
    let mut candidates = Vec::with_capacity(limit.min(total));
    for room in rooms {
        if candidates.len() == limit {
            report.truncated = true;
            break;
        }
        report.considered += 1;

        if exclusions.contains(room.room_id) {
            debug!(room_id = room.room_id, "Skipping excluded room");
            report.skipped_excluded += 1;
            continue;
        }
        if !cooldown.is_expired(room.room_id, now, policy.validity_minutes) {
            debug!(room_id = room.room_id, "Skipping room visited within the cooldown window");
            report.skipped_cooldown += 1;
            continue;
        }
        candidates.push(room);
    }

    debug!(
        category = %policy.category,
        total,
        selected = candidates.len(),
        ?report,
        "Selection finished"
    );
    Ok((candidates, report))
}

/// Validate every listed room and flatten groups in listing order.
///
/// A room repeated under several genres keeps its first position.
fn flatten(snapshot: &Snapshot, genres: &[i64], report: &mut SelectionReport) -> Result<Vec<Room>, SelectError> {
    let mut seen: HashSet<RoomId> = HashSet::new();
    let mut rooms = Vec::with_capacity(snapshot.room_count());

    for group in &snapshot.onlives {
        for (index, live) in group.lives.iter().enumerate() {
            let room = live
                .to_room(group.genre_id, &group.genre_name)
                .map_err(|field| SelectError::MalformedSnapshot {
                    genre_id: group.genre_id,
                    index,
                    field,
                })?;

            if !genres.is_empty() && !genres.contains(&room.genre_id) {
                report.skipped_genre += 1;
                continue;
            }
            if !seen.insert(room.room_id) {
                report.skipped_duplicate += 1;
                continue;
            }
            rooms.push(room);
        }
    }

    Ok(rooms)
}
