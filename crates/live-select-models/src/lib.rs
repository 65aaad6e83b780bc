pub mod room;
pub mod snapshot;
pub mod exclusion_entry;
pub mod visit_record;

pub use room::{LiveRoom, MissingField, Room, RoomId};
pub use snapshot::{GenreGroup, Snapshot};
pub use exclusion_entry::ExclusionEntry;
pub use visit_record::VisitRecord;
