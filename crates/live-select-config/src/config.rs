use crate::paths::{resolve_category_path, CATEGORY_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Category the run selects for ("Official", "Free", ...)
    pub category: String,
    /// Cooldown after a visit, in minutes
    pub validity_minutes: i64,
    /// Upper bound on the candidate list
    pub max_candidates: i64,
    pub exclusion_file: PathBuf,
    pub visit_history_file: PathBuf,
    #[serde(default)]
    pub exclusion_scope: ExclusionScope,
    #[serde(default)]
    pub order: CandidateOrder,
    /// Genre ids applicable to each category. A category with no entry accepts every genre.
    #[serde(default)]
    pub categories: HashMap<String, Vec<i64>>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory relative list paths are anchored at (the config file's directory)
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// How the exclusion file relates to categories.
///
/// The list format has no per-line category, so either one file serves
/// every category or each category gets its own file by naming convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionScope {
    /// One file applies to whichever category the run uses
    #[default]
    Shared,
    /// `exclusion_file` contains `{category}`; one file per category
    PerCategory,
}

/// Order in which eligible rooms are taken before the list is cut at `max_candidates`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// Listing order as delivered (genre order, then within-genre order)
    #[default]
    Snapshot,
    /// Most recently started broadcasts first
    NewestFirst,
    /// Longest running broadcasts first
    OldestFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Six-field cron expression (seconds first)
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("category must not be empty")]
    EmptyCategory,
    #[error("validity_minutes must be positive, got {0}")]
    NonPositiveValidity(i64),
    #[error("max_candidates must be positive, got {0}")]
    NonPositiveMaxCandidates(i64),
    #[error("exclusion_scope is per_category but exclusion_file {0:?} has no {{category}} placeholder")]
    MissingCategoryPlaceholder(PathBuf),
    #[error("api.timeout_seconds must be positive")]
    ZeroTimeout,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://www.showroom-live.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("seedpick/{}", env!("CARGO_PKG_VERSION"))
}

fn default_schedule() -> String {
    "0 */30 * * * *".to_string() // Every 30 minutes
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        schedule: default_schedule(),
        run_on_startup: default_true(),
    }
}

impl Config {
    /// Starter configuration written by `config init`.
    pub fn template(exclusion_file: PathBuf, visit_history_file: PathBuf) -> Self {
        Self {
            category: "Official".to_string(),
            validity_minutes: 240,
            max_candidates: 20,
            exclusion_file,
            visit_history_file,
            exclusion_scope: ExclusionScope::Shared,
            order: CandidateOrder::Snapshot,
            categories: HashMap::new(),
            api: ApiConfig::default(),
            scheduler: Some(default_scheduler_config()),
            logging: LoggingConfig::default(),
            base_dir: None,
        }
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.category.trim().is_empty() {
            return Err(ConfigError::EmptyCategory);
        }
        if self.validity_minutes <= 0 {
            return Err(ConfigError::NonPositiveValidity(self.validity_minutes));
        }
        if self.max_candidates <= 0 {
            return Err(ConfigError::NonPositiveMaxCandidates(self.max_candidates));
        }
        if self.exclusion_scope == ExclusionScope::PerCategory
            && !self.exclusion_file.to_string_lossy().contains(CATEGORY_PLACEHOLDER)
        {
            return Err(ConfigError::MissingCategoryPlaceholder(self.exclusion_file.clone()));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Exclusion file for the configured category.
    ///
    /// Under the shared scope a `{category}` in the path is still honoured,
    /// it is just not required.
    pub fn exclusion_path(&self) -> PathBuf {
        resolve_category_path(&self.exclusion_file, &self.category, self.base_dir.as_deref())
    }

    pub fn visit_history_path(&self) -> PathBuf {
        resolve_category_path(&self.visit_history_file, &self.category, self.base_dir.as_deref())
    }

    /// Daily-rotated log file, relative paths anchored at the config file's directory.
    pub fn log_file_path(&self) -> Option<PathBuf> {
        let file = self.logging.file.as_ref()?;
        match self.base_dir.as_deref() {
            Some(base) if file.is_relative() => Some(base.join(file)),
            _ => Some(file.clone()),
        }
    }

    /// Genre ids applicable to the configured category; empty means all genres.
    pub fn category_genres(&self) -> Vec<i64> {
        self.categories.get(&self.category).cloned().unwrap_or_default()
    }
}
