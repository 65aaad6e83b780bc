pub mod error;
pub mod exclusion;
pub mod visit_history;
pub mod selector;
pub mod guard;
pub mod collector;
pub mod pipeline;

pub use error::SelectError;
pub use exclusion::ExclusionStore;
pub use visit_history::{format_timestamp, parse_timestamp, CooldownView, VisitHistory};
pub use selector::{select, select_with_report, SelectionPolicy, SelectionReport};
pub use guard::HistoryGuard;
pub use collector::{Collector, HandoffCollector};
pub use pipeline::{run_once, RunOutcome, RunSettings};
