use crate::room::RoomId;
use serde::{Deserialize, Serialize};

/// Operator-maintained deny-list entry. The comment is informational only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExclusionEntry {
    pub room_id: RoomId,
    pub category: String,
    pub comment: String,
}
