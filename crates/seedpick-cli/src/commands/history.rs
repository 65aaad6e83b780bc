use super::config::load_config;
use crate::output::{new_table, Output};
use chrono::{DateTime, Duration, FixedOffset, Local};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use comfy_table::Cell;
use live_select_config::Config;
use live_select_core::{format_timestamp, VisitHistory};
use serde_json::json;
use std::path::Path;

pub fn run_history(cmd: crate::HistoryCommands, config_path: &Path, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate().wrap_err("Invalid configuration")?;

    match cmd {
        crate::HistoryCommands::Show => show_history(&config, Local::now().into(), output),
        crate::HistoryCommands::Clear => clear_history(&config, output),
    }
}

/// Rooms still cooling down at `now`; read-only, the file is not rewritten.
fn show_history(config: &Config, now: DateTime<FixedOffset>, output: &Output) -> Result<()> {
    let path = config.visit_history_path();
    let history = VisitHistory::restore(&config.category, &path, config.validity_minutes, now)
        .wrap_err_with(|| format!("Failed to read visit history {}", path.display()))?;
    let window = Duration::try_minutes(config.validity_minutes).unwrap_or(Duration::MAX);
    let records = history.records();

    if output.is_human() {
        if records.is_empty() {
            output.info(format!("No rooms cooling down ({})", path.display()));
            return Ok(());
        }

        let mut table = new_table(vec!["Room ID", "Last visit", "Cooldown ends"]);
        for record in &records {
            let ends = record
                .visited_at
                .checked_add_signed(window)
                .map(|t| t.format("%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                Cell::new(record.room_id),
                Cell::new(format_timestamp(&record.visited_at)),
                Cell::new(ends),
            ]);
        }
        output.table(&table);
        output.success(format!(
            "{} room(s) cooling down for {} ({}-minute window)",
            records.len(),
            config.category,
            config.validity_minutes
        ));
    } else {
        output.json(&json!({
            "category": config.category,
            "path": path,
            "validity_minutes": config.validity_minutes,
            "visits": records,
        }));
    }

    Ok(())
}

fn clear_history(config: &Config, output: &Output) -> Result<()> {
    let path = config.visit_history_path();
    let existed = path.exists();
    if existed {
        std::fs::remove_file(&path).wrap_err_with(|| format!("Failed to remove {}", path.display()))?;
        tracing::info!(path = %path.display(), "Visit history cleared");
    }

    if output.is_human() {
        if existed {
            output.success(format!("Cleared visit history {}", path.display()));
        } else {
            output.info(format!("No visit history at {}", path.display()));
        }
    } else {
        output.json(&json!({
            "success": true,
            "path": path,
            "removed": existed,
        }));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use live_select_core::parse_timestamp;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::template(PathBuf::from("excl.txt"), PathBuf::from("rvl.txt"));
        config.base_dir = Some(dir.path().to_path_buf());
        config.validity_minutes = 60;
        config
    }

    #[test]
    fn test_show_does_not_rewrite_history() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let original = "\"2022/08/11 09:00:00 +0900 JST\"\t555\n\"2022/08/11 12:30:00 +0900 JST\"\t556\n";
        std::fs::write(config.visit_history_path(), original).unwrap();

        let now = parse_timestamp("2022/08/11 13:00:00 +0900 JST").unwrap();
        show_history(&config, now, &Output::new(OutputFormat::Human, true)).unwrap();

        assert_eq!(std::fs::read_to_string(config.visit_history_path()).unwrap(), original);
    }

    #[test]
    fn test_clear_removes_file_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::write(config.visit_history_path(), "\"2022/08/11 09:00:00 +0900 JST\"\t555\n").unwrap();
        let output = Output::new(OutputFormat::Human, true);

        clear_history(&config, &output).unwrap();
        assert!(!config.visit_history_path().exists());

        clear_history(&config, &output).unwrap();
    }
}
