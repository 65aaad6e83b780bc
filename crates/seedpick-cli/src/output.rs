use chrono::{FixedOffset, TimeZone};
use clap::ValueEnum;
use comfy_table::{presets, Cell, Table};
use live_select_models::Room;
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message("success", "✓".green().to_string(), msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message("info", String::new(), msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message("warning", "⚠".yellow().to_string(), msg.as_ref());
    }

    fn message(&self, kind: &str, marker: String, msg: &str) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human if marker.is_empty() => println!("{}", msg),
            OutputFormat::Human => println!("{} {}", marker, msg),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({
                    "type": kind,
                    "message": msg
                }));
            }
        }
    }

    /// Print a table in human mode; other formats carry the data in their JSON payload.
    pub fn table(&self, table: &Table) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("{}", table);
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }

        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(data).unwrap_or_default());
            }
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Human => {
                println!("{}", data);
            }
        }
    }
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(
        header
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(comfy_table::Attribute::Bold)),
    );
    table
}

/// Candidate rooms with start times shown in `offset`.
pub fn candidates_table(rooms: &[Room], offset: &FixedOffset) -> Table {
    let mut table = new_table(vec!["#", "Room ID", "Started", "Genre", "Name"]);
    for (i, room) in rooms.iter().enumerate() {
        let started = offset
            .timestamp_opt(room.started_at, 0)
            .single()
            .map(|t| t.format("%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(room.room_id),
            Cell::new(started),
            Cell::new(&room.genre_name),
            Cell::new(&room.main_name),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_table_formats_start_in_offset() {
        let rooms = vec![Room {
            room_id: 111111,
            genre_id: 102,
            genre_name: "Idol".to_string(),
            started_at: 1_660_183_264, // 2022-08-11 02:01:04 UTC
            main_name: "room a".to_string(),
        }];
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();

        let rendered = candidates_table(&rooms, &jst).to_string();
        assert!(rendered.contains("111111"));
        assert!(rendered.contains("08-11 11:01:04"));
        assert!(rendered.contains("room a"));
    }
}
