use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type RoomId = i64;

/// One live broadcast, validated and immutable once produced.
///
/// Field names match the platform's JSON so a candidate list can be
/// serialized as-is when it leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub room_id: RoomId,
    pub genre_id: i64,
    pub genre_name: String,
    pub started_at: i64, // Unix seconds
    pub main_name: String,
}

impl Room {
    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.started_at, 0).single()
    }
}

/// Room as decoded from the live listing, before validation.
///
/// Every field is optional because the listing is not under our control.
/// `genre_id`/`genre_name` fall back to the enclosing group's values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LiveRoom {
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub genre_id: Option<i64>,
    #[serde(default)]
    pub genre_name: Option<String>,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub main_name: Option<String>,
}

/// Required room field absent from a listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    RoomId,
    StartedAt,
    MainName,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::RoomId => "room_id",
            MissingField::StartedAt => "started_at",
            MissingField::MainName => "main_name",
        };
        write!(f, "{}", name)
    }
}

impl LiveRoom {
    pub fn new(room_id: RoomId, started_at: i64, main_name: impl Into<String>) -> Self {
        Self {
            room_id: Some(room_id),
            genre_id: None,
            genre_name: None,
            started_at: Some(started_at),
            main_name: Some(main_name.into()),
        }
    }

    /// Validate into a [`Room`], inheriting genre fields from the group.
    pub fn to_room(&self, group_genre_id: i64, group_genre_name: &str) -> Result<Room, MissingField> {
        let room_id = self.room_id.ok_or(MissingField::RoomId)?;
        let started_at = self.started_at.ok_or(MissingField::StartedAt)?;
        let main_name = self.main_name.clone().ok_or(MissingField::MainName)?;

        Ok(Room {
            room_id,
            genre_id: self.genre_id.unwrap_or(group_genre_id),
            genre_name: self
                .genre_name
                .clone()
                .unwrap_or_else(|| group_genre_name.to_string()),
            started_at,
            main_name,
        })
    }
}
