use super::config::load_config;
use crate::output::{candidates_table, Output};
use chrono::{DateTime, FixedOffset, Local};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use live_select_core::{run_once, HandoffCollector, RunSettings};
use live_select_sources::create_supplier;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct SelectOverrides {
    pub category: Option<String>,
    pub max_candidates: Option<i64>,
}

pub async fn run_select(
    config_path: &Path,
    overrides: SelectOverrides,
    snapshot_file: Option<PathBuf>,
    dry_run: bool,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Select command started");

    let mut config = load_config(config_path)?;
    if let Some(category) = overrides.category {
        config.category = category;
    }
    if let Some(max_candidates) = overrides.max_candidates {
        config.max_candidates = max_candidates;
    }
    config.validate().wrap_err("Invalid configuration")?;

    let settings = RunSettings::from_config(&config);
    let supplier = create_supplier(&config, snapshot_file).wrap_err("Failed to create snapshot supplier")?;
    let mut collector = HandoffCollector::new(dry_run);
    let now: DateTime<FixedOffset> = Local::now().into();

    let outcome = run_once(&settings, supplier.as_ref(), &mut collector, now)
        .await
        .wrap_err("Selection run failed")?;

    if output.is_human() {
        if outcome.candidates.is_empty() {
            output.warn(format!("No eligible rooms for {}", config.category));
        } else {
            output.table(&candidates_table(&outcome.candidates, now.offset()));
        }
        if dry_run {
            output.info("Dry-run mode: visits were not recorded");
        }
        output.success(format!(
            "{}: {} candidate(s) selected ({} excluded, {} cooling down), {} visit(s) recorded, history holds {} room(s)",
            config.category,
            outcome.candidates.len(),
            outcome.report.skipped_excluded,
            outcome.report.skipped_cooldown,
            outcome.visited,
            outcome.history_size
        ));
    } else {
        output.json(&json!({
            "success": true,
            "category": config.category,
            "dry_run": dry_run,
            "candidates": outcome.candidates,
            "visited": outcome.visited,
            "history_size": outcome.history_size,
            "report": {
                "considered": outcome.report.considered,
                "skipped_excluded": outcome.report.skipped_excluded,
                "skipped_cooldown": outcome.report.skipped_cooldown,
                "skipped_duplicate": outcome.report.skipped_duplicate,
                "skipped_genre": outcome.report.skipped_genre,
                "truncated": outcome.report.truncated,
            },
            "duration_seconds": outcome.duration.as_secs_f64(),
        }));
    }

    Ok(())
}
