use super::run::load_config;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use janitor_config::{Config, PathManager};
use janitor_sources::{PlexAccount, PlexServer, RadarrClient};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { config } => show_config(&load_config(config, false)?, output),
        ConfigCommands::Check { config } => check_config(&load_config(config, false)?, output).await,
    }
}

fn on_off(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn section(title: &str, rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(title)
        .fg(Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn show_config(config: &Config, output: &Output) -> Result<()> {
    let masked = config.masked();
    let log_file = PathManager::with_log_dir(config.logging.dir.as_deref()).log_file();

    if output.format() != OutputFormat::Human {
        output.json(&json!({
            "config": serde_json::to_value(&masked)?,
            "log_file": log_file.display().to_string(),
        }));
        return Ok(());
    }

    let unset = || "-".bright_black().to_string();

    println!(
        "{}",
        section(
            "Radarr",
            vec![("URL", masked.radarr.url.clone()), ("API Key", masked.radarr.api_key.clone())],
        )
    );
    println!(
        "{}",
        section(
            "Plex",
            vec![
                ("URL", masked.plex.url.clone()),
                ("Server Token", masked.plex.token.clone()),
                ("Library", masked.plex.library.clone()),
                ("User Token", masked.plex.user_token.clone().unwrap_or_else(unset)),
                ("Username", masked.plex.username.clone().unwrap_or_else(unset)),
                ("Password", masked.plex.password.clone().unwrap_or_else(unset)),
            ],
        )
    );
    let languages = if masked.policy.accepted_languages.is_empty() {
        unset()
    } else {
        masked.policy.accepted_languages.join(", ")
    };
    println!(
        "{}",
        section(
            "Policy",
            vec![
                ("Dry Run", on_off(masked.policy.dry_run)),
                ("Language Filter", on_off(masked.policy.language_filter)),
                ("Accepted Languages", languages),
                ("Protected Collection", masked.policy.collection_name.clone().unwrap_or_else(unset)),
            ],
        )
    );
    println!("{}", section("Logging", vec![("Log File", log_file.display().to_string())]));
    Ok(())
}

/// Touch every configured service once, without retries, and report each.
async fn check_config(config: &Config, output: &Output) -> Result<()> {
    output.success("Configuration is valid");
    let mut failures = 0;

    let radarr = RadarrClient::new(&config.radarr.url, &config.radarr.api_key)
        .map_err(|e| eyre!("Failed to create Radarr client: {}", e))?;
    match radarr.ping().await {
        Ok(version) => output.success(format!("Radarr reachable (version {})", version)),
        Err(e) => {
            failures += 1;
            output.error(format!("Radarr check failed: {}", e));
        }
    }

    match PlexServer::connect(&config.plex.url, &config.plex.token, &config.plex.library).await {
        Ok(server) => output.success(format!(
            "Plex server '{}' reachable, library '{}' found",
            server.friendly_name(),
            server.section().title
        )),
        Err(e) => {
            failures += 1;
            output.error(format!("Plex server check failed: {}", e));
        }
    }

    if let Some(token) = &config.plex.user_token {
        match PlexAccount::connect(token).await {
            Ok(account) => output.success(format!("Plex account '{}' authorized", account.username())),
            Err(e) => {
                failures += 1;
                output.error(format!("Plex account check failed: {}", e));
            }
        }
    } else if config.plex.credentials().is_some() {
        output.info("Plex account credentials set; a sign-in happens at the start of each run");
    }

    if failures > 0 {
        return Err(eyre!("{} service check(s) failed", failures));
    }
    Ok(())
}
