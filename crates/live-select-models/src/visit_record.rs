use crate::room::RoomId;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Last time a room was visited for collection.
///
/// The offset is kept so a saved history reads in the zone it was written in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisitRecord {
    pub room_id: RoomId,
    pub visited_at: DateTime<FixedOffset>,
}
