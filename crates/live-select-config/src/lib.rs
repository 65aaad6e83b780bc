pub mod config;
pub mod paths;

pub use config::{ApiConfig, CandidateOrder, Config, ConfigError, ExclusionScope, LoggingConfig, SchedulerConfig, default_scheduler_config};
pub use paths::{CATEGORY_PLACEHOLDER, PathManager, container_base_path, resolve_category_path};
