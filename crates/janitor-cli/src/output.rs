use clap::ValueEnum;
use comfy_table::{Cell, Color, Table};
use janitor_core::RunReport;
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

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message("success", msg.as_ref(), |m| println!("{} {}", "✓".green(), m));
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message("info", msg.as_ref(), |m| println!("{}", m));
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        // Errors should always be shown, even in quiet mode
        match self.format {
            OutputFormat::Human => eprintln!("{} {}", "✗".red(), msg.as_ref()),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": "error", "message": msg.as_ref() }));
            }
        }
    }

    fn message(&self, kind: &str, msg: &str, human: impl FnOnce(&str)) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => human(msg),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": kind, "message": msg }));
            }
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }
        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(data).unwrap_or_default()),
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default())
            }
            OutputFormat::Human => println!("{}", data),
        }
    }

    /// Summary of one pass: a table for humans, the report itself otherwise.
    pub fn report(&self, report: &RunReport) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => {
                println!();
                if report.dry_run {
                    println!("{}", "Dry run: nothing was changed in Radarr".yellow().bold());
                }
                println!("{}", summary_table(report));
                if !report.deleted.is_empty() {
                    println!("{}", deleted_table(report));
                }
                for warning in &report.warnings {
                    println!("{} {}", "⚠".yellow(), warning);
                }
            }
            OutputFormat::Json | OutputFormat::JsonPretty => match serde_json::to_value(report) {
                Ok(value) => self.print_json(&json!({
                    "type": "report",
                    "duration_ms": report.duration.as_millis() as u64,
                    "report": value,
                })),
                Err(e) => self.error(format!("Failed to serialize run report: {}", e)),
            },
        }
    }
}

fn styled(table: &mut Table) {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
}

fn summary_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Run Summary")
            .fg(Color::Cyan)
            .add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    let rows = [
        ("Movies in Radarr", report.catalog_size),
        ("Watched titles", report.watched_titles),
        ("Protected titles", report.protected_titles),
        ("Unmonitored", report.unmonitored.len()),
        ("Deleted", report.deleted.len()),
        ("Skipped (protected)", report.skipped.len()),
        ("Kept", report.kept),
    ];
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(count)]);
    }
    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format!("{:.1}s", report.duration.as_secs_f64())),
    ]);
    styled(&mut table);
    table
}

fn deleted_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Id").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Deleted").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Reason").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for movie in &report.deleted {
        table.add_row(vec![
            Cell::new(movie.id),
            Cell::new(&movie.title),
            Cell::new(movie.reason.to_string()),
        ]);
    }
    styled(&mut table);
    table
}
