use crate::output::{new_table, Output};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use comfy_table::Cell;
use live_select_config::{default_scheduler_config, Config, PathManager};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Load the configuration at `path`, pointing at `config init` when it is missing.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(eyre!(
            "Configuration file not found at {}. Run 'seedpick config init' to create one.",
            path.display()
        ));
    }

    Config::load_from_file(path)
        .map_err(|e| eyre!("Failed to load config from {}: {}", path.display(), e))
}

pub fn run_config(cmd: crate::ConfigCommands, config_path: &Path, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show => show_config(config_path, output),
        crate::ConfigCommands::Init { force } => init_config(config_path, force, output),
    }
}

fn show_config(config_path: &Path, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;
    let validation = config.validate();
    let scheduler = config.scheduler.clone().unwrap_or_else(default_scheduler_config);
    let genres = config.category_genres();
    let genres_display = if genres.is_empty() {
        "all".to_string()
    } else {
        genres.iter().map(|g| g.to_string()).collect::<Vec<_>>().join(", ")
    };

    if output.is_human() {
        let mut table = new_table(vec!["Setting", "Value"]);
        let rows: Vec<(&str, String)> = vec![
            ("Config file", config_path.display().to_string()),
            ("Category", config.category.clone()),
            ("Validity (minutes)", config.validity_minutes.to_string()),
            ("Max candidates", config.max_candidates.to_string()),
            ("Order", format!("{:?}", config.order)),
            ("Exclusion scope", format!("{:?}", config.exclusion_scope)),
            ("Exclusion file", config.exclusion_path().display().to_string()),
            ("Visit history file", config.visit_history_path().display().to_string()),
            ("Category genres", genres_display),
            ("API base URL", config.api.base_url.clone()),
            ("API timeout (s)", config.api.timeout_seconds.to_string()),
            ("Schedule", scheduler.schedule.clone()),
            ("Run on startup", scheduler.run_on_startup.to_string()),
        ];
        for (name, value) in rows {
            table.add_row(vec![Cell::new(name), Cell::new(value)]);
        }
        output.table(&table);

        if let Some(warning) = genre_filter_warning(&config) {
            output.warn(warning);
        }
        match validation {
            Ok(()) => output.success("Configuration is valid"),
            Err(e) => output.warn(format!("Configuration is invalid: {}", e)),
        }
    } else {
        output.json(&json!({
            "config_file": config_path,
            "category": config.category,
            "validity_minutes": config.validity_minutes,
            "max_candidates": config.max_candidates,
            "order": config.order,
            "exclusion_scope": config.exclusion_scope,
            "exclusion_file": config.exclusion_path(),
            "visit_history_file": config.visit_history_path(),
            "category_genres": genres,
            "api": config.api,
            "scheduler": scheduler,
            "genre_filter_warning": genre_filter_warning(&config),
            "valid": validation.is_ok(),
            "error": validation.err().map(|e| e.to_string()),
        }));
    }

    Ok(())
}

/// Set when the category has no `[categories]` entry, so rooms of every genre are eligible.
fn genre_filter_warning(config: &Config) -> Option<String> {
    if config.categories.contains_key(&config.category) {
        return None;
    }
    Some(format!(
        "No [categories] entry for '{}': rooms of every genre are eligible. Add e.g. {} = [101, 102] to restrict it.",
        config.category, config.category
    ))
}

fn init_config(config_path: &Path, force: bool, output: &Output) -> Result<()> {
    if config_path.exists() && !force {
        return Err(eyre!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }

    let path_manager = PathManager::default();
    let (exclusion_file, visit_history_file) = if config_path == path_manager.config_file() {
        path_manager
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create seedpick directories: {}", e))?;
        (
            path_manager.default_exclusion_file(),
            path_manager.default_visit_history_file(),
        )
    } else {
        // Custom location: list files live beside the config and resolve relative to it
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        (PathBuf::from("excl.txt"), PathBuf::from("rvl.txt"))
    };

    let config = Config::template(exclusion_file, visit_history_file);
    config
        .save_to_file(config_path)
        .map_err(|e| eyre!("Failed to write config to {}: {}", config_path.display(), e))?;

    if output.is_human() {
        output.success(format!("Configuration written to {}", config_path.display()));
        output.info("Edit category, validity_minutes and max_candidates before the first run.");
        if let Some(warning) = genre_filter_warning(&config) {
            output.warn(warning);
        }
    } else {
        output.json(&json!({
            "success": true,
            "config_file": config_path,
        }));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let output = Output::new(OutputFormat::Human, true);

        init_config(&path, false, &output).unwrap();
        let config = load_config(&path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.exclusion_path(), dir.path().join("nested").join("excl.txt"));
        assert_eq!(config.visit_history_path(), dir.path().join("nested").join("rvl.txt"));
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "category = \"keep\"\n").unwrap();
        let output = Output::new(OutputFormat::Human, true);

        assert!(init_config(&path, false, &output).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "category = \"keep\"\n");

        init_config(&path, true, &output).unwrap();
        assert!(load_config(&path).is_ok());
    }

    #[test]
    fn test_genre_filter_warning_until_category_is_mapped() {
        let mut config = Config::template(PathBuf::from("excl.txt"), PathBuf::from("rvl.txt"));
        let warning = genre_filter_warning(&config).unwrap();
        assert!(warning.contains("Official"));

        config.categories.insert("Official".to_string(), vec![101]);
        assert!(genre_filter_warning(&config).is_none());
    }

    #[test]
    fn test_load_missing_config_mentions_init() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("seedpick config init"));
    }
}
