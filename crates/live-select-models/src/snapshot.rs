use crate::room::LiveRoom;
use serde::{Deserialize, Serialize};

/// All rooms broadcasting under one genre at the time of the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenreGroup {
    pub genre_id: i64,
    #[serde(default)]
    pub genre_name: String,
    #[serde(default)]
    pub lives: Vec<LiveRoom>,
}

/// Point-in-time listing of live rooms, grouped by genre in platform order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub onlives: Vec<GenreGroup>,
}

impl Snapshot {
    pub fn new(onlives: Vec<GenreGroup>) -> Self {
        Self { onlives }
    }

    pub fn genre_count(&self) -> usize {
        self.onlives.len()
    }

    /// Total entries across groups, duplicates included.
    pub fn room_count(&self) -> usize {
        self.onlives.iter().map(|g| g.lives.len()).sum()
    }
}
