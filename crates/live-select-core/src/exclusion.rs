use crate::error::SelectError;
use live_select_models::{ExclusionEntry, RoomId};
use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, info};

/// Operator deny-list of rooms for one category, read-only for the run.
///
/// File format: one room per line, `<room_id><TAB><comment>`. The comment is
/// free text and may be absent.
#[derive(Debug, Clone, Default)]
pub struct ExclusionStore {
    category: String,
    entries: HashMap<RoomId, ExclusionEntry>,
}

impl ExclusionStore {
    pub fn empty(category: &str) -> Self {
        Self {
            category: category.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Load the list at `path` on behalf of `category`.
    ///
    /// A missing file yields an empty list.
    pub fn load(category: &str, path: &Path) -> Result<Self, SelectError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    category,
                    path = %path.display(),
                    "Exclusion list not found, continuing with no exclusions"
                );
                return Ok(Self::empty(category));
            }
            Err(e) => return Err(SelectError::io(path, e)),
        };

        let store = Self::from_reader(category, path, file)?;
        info!(
            category,
            path = %path.display(),
            excluded = store.len(),
            "Loaded exclusion list"
        );
        Ok(store)
    }

    fn from_reader<R: Read>(category: &str, path: &Path, reader: R) -> Result<Self, SelectError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut store = Self::empty(category);
        // Byte records: comments are free text in whatever encoding the operator saved
        for result in rdr.byte_records() {
            let record = result.map_err(|e| SelectError::from_csv(path, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if record.iter().all(|f| f.trim_ascii().is_empty()) {
                continue;
            }
            let raw_id = record.get(0).unwrap_or(b"").trim_ascii();
            let room_id: RoomId = std::str::from_utf8(raw_id)
                .map_err(|e| e.to_string())
                .and_then(|id| id.parse::<RoomId>().map_err(|e| e.to_string()))
                .map_err(|reason| {
                    SelectError::parse(
                        path,
                        line,
                        format!("invalid room id {:?}: {}", String::from_utf8_lossy(raw_id), reason),
                    )
                })?;

            // Tabs inside the comment split it into extra fields
            let comment = record
                .iter()
                .skip(1)
                .map(String::from_utf8_lossy)
                .collect::<Vec<_>>()
                .join("\t");

            if store.entries.contains_key(&room_id) {
                debug!(room_id, line, "Duplicate exclusion entry, keeping the later comment");
            }
            store.entries.insert(
                room_id,
                ExclusionEntry {
                    room_id,
                    category: category.to_string(),
                    comment,
                },
            );
        }

        Ok(store)
    }

    pub fn contains(&self, room_id: RoomId) -> bool {
        self.entries.contains_key(&room_id)
    }

    pub fn get(&self, room_id: RoomId) -> Option<&ExclusionEntry> {
        self.entries.get(&room_id)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
