use crate::error::SelectError;
use chrono::{DateTime, Duration, FixedOffset};
use live_select_models::{RoomId, VisitRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Date/time part of a history timestamp; followed by a zone abbreviation.
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S %z";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.f %z";

/// Read-only cooldown check handed to the selector.
pub trait CooldownView {
    /// True when the room was never visited or its last visit is older than the window.
    fn is_expired(&self, room_id: RoomId, now: DateTime<FixedOffset>, validity_minutes: i64) -> bool;
}

/// Rooms visited recently, keyed by room id.
///
/// File format: `"<YYYY/MM/DD hh:mm:ss ±hhmm ZONE>"<TAB><room_id>` per line,
/// rewritten in full on every save.
#[derive(Debug, Clone, Default)]
pub struct VisitHistory {
    category: String,
    visits: HashMap<RoomId, DateTime<FixedOffset>>,
}

fn validity_window(validity_minutes: i64) -> Duration {
    Duration::try_minutes(validity_minutes).unwrap_or(Duration::MAX)
}

fn is_stale(visited_at: DateTime<FixedOffset>, now: DateTime<FixedOffset>, validity_minutes: i64) -> bool {
    now.signed_duration_since(visited_at) > validity_window(validity_minutes)
}

/// Parse `2022/08/11 11:01:04 +0900 JST`; the zone abbreviation is optional.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, String> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 3 || fields.len() > 4 {
        return Err(format!("unrecognised timestamp {:?}", text));
    }
    if let Some(zone) = fields.get(3) {
        if !is_zone_abbreviation(zone) {
            return Err(format!("unrecognised zone {:?} in timestamp {:?}", zone, text));
        }
    }
    let stamp = fields[..3].join(" ");
    DateTime::parse_from_str(&stamp, TIMESTAMP_PARSE_FORMAT)
        .map_err(|e| format!("unrecognised timestamp {:?}: {}", text, e))
}

/// `JST`-style letters, or Go's numeric stand-in for unnamed zones (`+09`, `-0330`).
fn is_zone_abbreviation(zone: &str) -> bool {
    match zone.strip_prefix(['+', '-']) {
        Some(digits) => matches!(digits.len(), 2 | 4) && digits.bytes().all(|b| b.is_ascii_digit()),
        None => !zone.is_empty() && zone.bytes().all(|b| b.is_ascii_uppercase()),
    }
}

/// Render a timestamp the way [`parse_timestamp`] (and Go's `time.Parse`) reads it.
///
/// Whole seconds only. The zone name is not kept: a visit read as `+0900 JST`
/// is written back as `+0900 +09`, with the same offset.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    format!("{} {}", at.format(TIMESTAMP_FORMAT), zone_abbreviation(at.offset()))
}

/// `UTC` for a zero offset, otherwise the numeric form Go prints for unnamed zones (`+09`, `+0530`).
fn zone_abbreviation(offset: &FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    if secs == 0 {
        return "UTC".to_string();
    }
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    let (hours, minutes) = (secs / 3600, (secs % 3600) / 60);
    if minutes == 0 {
        format!("{}{:02}", sign, hours)
    } else {
        format!("{}{:02}{:02}", sign, hours, minutes)
    }
}

impl VisitHistory {
    pub fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            visits: HashMap::new(),
        }
    }

    /// Load the history at `path`, dropping visits older than the window.
    ///
    /// A missing file is an empty history (first run).
    pub fn restore(
        category: &str,
        path: &Path,
        validity_minutes: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<Self, SelectError> {
        if validity_minutes <= 0 {
            return Err(SelectError::Precondition(format!(
                "validity_minutes must be positive, got {}",
                validity_minutes
            )));
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    category,
                    path = %path.display(),
                    "Visit history not found, starting empty"
                );
                return Ok(Self::new(category));
            }
            Err(e) => return Err(SelectError::io(path, e)),
        };

        let (history, read, dropped) = Self::from_reader(category, path, file, validity_minutes, now)?;
        info!(
            category,
            path = %path.display(),
            read,
            expired = dropped,
            kept = history.len(),
            validity_minutes,
            "Restored visit history"
        );
        Ok(history)
    }

    fn from_reader<R: Read>(
        category: &str,
        path: &Path,
        reader: R,
        validity_minutes: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<(Self, usize, usize), SelectError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut history = Self::new(category);
        let mut read = 0;
        let mut dropped = 0;
        for result in rdr.records() {
            let record = result.map_err(|e| SelectError::from_csv(path, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            if record.len() != 2 {
                return Err(SelectError::parse(
                    path,
                    line,
                    format!("expected 2 tab-separated fields, found {}", record.len()),
                ));
            }

            let visited_at = parse_timestamp(&record[0]).map_err(|reason| SelectError::parse(path, line, reason))?;
            let raw_id = record[1].trim();
            let room_id: RoomId = raw_id
                .parse()
                .map_err(|e| SelectError::parse(path, line, format!("invalid room id {:?}: {}", raw_id, e)))?;
            read += 1;

            if is_stale(visited_at, now, validity_minutes) {
                debug!(room_id, visited_at = %visited_at, "Dropping expired visit");
                dropped += 1;
                continue;
            }
            history.record_visit(room_id, visited_at);
        }

        Ok((history, read, dropped))
    }

    /// Upsert a visit, never moving a room's timestamp backwards.
    pub fn record_visit(&mut self, room_id: RoomId, at: DateTime<FixedOffset>) {
        match self.visits.get_mut(&room_id) {
            Some(existing) if *existing >= at => {
                if *existing > at {
                    debug!(room_id, existing = %existing, ignored = %at, "Ignoring older visit timestamp");
                }
            }
            Some(existing) => *existing = at,
            None => {
                self.visits.insert(room_id, at);
            }
        }
    }

    pub fn is_expired(&self, room_id: RoomId, now: DateTime<FixedOffset>, validity_minutes: i64) -> bool {
        match self.visits.get(&room_id) {
            Some(visited_at) => is_stale(*visited_at, now, validity_minutes),
            None => true,
        }
    }

    /// Remove visits older than the window. Returns how many were dropped.
    pub fn prune(&mut self, now: DateTime<FixedOffset>, validity_minutes: i64) -> usize {
        let before = self.visits.len();
        self.visits.retain(|_, visited_at| !is_stale(*visited_at, now, validity_minutes));
        before - self.visits.len()
    }

    pub fn last_visit(&self, room_id: RoomId) -> Option<DateTime<FixedOffset>> {
        self.visits.get(&room_id).copied()
    }

    /// Visits ordered by time, then room id (the order they are saved in).
    pub fn records(&self) -> Vec<VisitRecord> {
        let mut records: Vec<VisitRecord> = self
            .visits
            .iter()
            .map(|(room_id, visited_at)| VisitRecord {
                room_id: *room_id,
                visited_at: *visited_at,
            })
            .collect();
        records.sort_by(|a, b| a.visited_at.cmp(&b.visited_at).then(a.room_id.cmp(&b.room_id)));
        records
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Rewrite `path` with the current visits.
    ///
    /// The file is written beside the target and renamed over it, so a failed
    /// save leaves the previous history intact.
    pub fn save(&self, path: &Path) -> Result<(), SelectError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SelectError::io(parent, e))?;
        }

        let temp_path = temp_path_for(path);
        let written = self
            .write_records(&temp_path)
            .and_then(|()| std::fs::rename(&temp_path, path).map_err(|e| SelectError::io(path, e)));
        if let Err(e) = written {
            if let Err(rm_err) = std::fs::remove_file(&temp_path) {
                if rm_err.kind() != ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %rm_err, "Failed to remove partial history file");
                }
            }
            return Err(e);
        }

        debug!(
            category = %self.category,
            path = %path.display(),
            visits = self.len(),
            "Saved visit history"
        );
        Ok(())
    }

    fn write_records(&self, temp_path: &Path) -> Result<(), SelectError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::NonNumeric)
            .from_path(temp_path)
            .map_err(|e| SelectError::from_csv(temp_path, e))?;

        for record in self.records() {
            wtr.write_record(&[format_timestamp(&record.visited_at), record.room_id.to_string()])
                .map_err(|e| SelectError::from_csv(temp_path, e))?;
        }
        wtr.flush().map_err(|e| SelectError::io(temp_path, e))?;
        Ok(())
    }
}

impl CooldownView for VisitHistory {
    fn is_expired(&self, room_id: RoomId, now: DateTime<FixedOffset>, validity_minutes: i64) -> bool {
        VisitHistory::is_expired(self, room_id, now, validity_minutes)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "visit_history".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
