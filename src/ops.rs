use anyhow::{Context, Result, anyhow};
use colored::*;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use sqlsnap::config::settings::Settings;
use sqlsnap::drivers::selector::open_target;
use sqlsnap::{BackupOptions, RestoreOptions, Snapshotter, TableSelection, ValueStyle};

/// Settings from the config file with command-line overrides applied.
pub struct Resolved {
    pub settings: Settings,
}

impl Resolved {
    pub fn load(config: Option<&Path>, database: Option<String>, folder: Option<PathBuf>) -> Result<Self> {
        let mut settings = Settings::load(config).context("failed to read settings")?;
        if database.is_some() {
            settings.database = database;
        }
        if let Some(folder) = folder {
            settings.backup_folder = folder;
        }
        Ok(Self { settings })
    }

    fn database(&self) -> Result<&str> {
        self.settings
            .database
            .as_deref()
            .ok_or_else(|| anyhow!("no database given; pass --database or set it in sqlsnap.json"))
    }
}

pub fn do_backup(
    resolved: &Resolved,
    tables: Vec<String>,
    no_data: bool,
    archive: bool,
    typed_values: bool,
) -> Result<()> {
    let target = resolved.database()?;
    let conn = open_target(target).with_context(|| format!("cannot open '{}'", target))?;
    let snap = Snapshotter::new(&*conn, &resolved.settings.backup_folder)?;

    let selection = if tables.is_empty() {
        TableSelection::All
    } else {
        TableSelection::only(tables)
    };
    let options = BackupOptions {
        include_data: resolved.settings.include_data && !no_data,
        archive: resolved.settings.archive || archive,
        value_style: if typed_values { ValueStyle::Typed } else { ValueStyle::Quoted },
        compression_level: resolved.settings.compression_level,
    };

    let bar = create_progress_bar("Creating backup");
    let result = match snap.backup(&selection, &options) {
        Ok(r) => r,
        Err(e) => {
            bar.finish_and_clear();
            return Err(anyhow::Error::new(e).context("backup failed"));
        }
    };
    bar.finish_with_message("Backup created");

    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Backed up {} table(s) to {}", result.tables.len(), result.path.display()).green()
    );
    println!(
        "  {} bytes, sha256 {}, {:.2}s",
        result.size_bytes,
        &result.checksum[..12],
        result.duration.as_secs_f64()
    );
    Ok(())
}

pub fn do_restore(resolved: &Resolved, path: &Path, keep_tables: bool, yes: bool) -> Result<()> {
    let target = resolved.database()?;
    if !path.exists() {
        return Err(anyhow!("backup '{}' not found", path.display()));
    }

    let drop_existing_tables = resolved.settings.drop_existing_tables && !keep_tables;
    if drop_existing_tables
        && !yes
        && !prompt_confirm(&format!(
            "Restore '{}' into '{}', dropping the tables it contains? [y/N] ",
            path.display(),
            target
        ))?
    {
        println!("Aborted.");
        return Ok(());
    }

    let conn = open_target(target).with_context(|| format!("cannot open '{}'", target))?;
    let snap = Snapshotter::new(&*conn, &resolved.settings.backup_folder)?;

    let bar = create_progress_bar("Restoring backup");
    let report = match snap.restore(path, &RestoreOptions { drop_existing_tables }) {
        Ok(r) => r,
        Err(e) => {
            bar.finish_and_clear();
            return Err(anyhow::Error::new(e).context("restore failed; no changes were applied"));
        }
    };
    bar.finish_with_message("Restore complete");

    println!(
        "{} {}",
        "✔".green().bold(),
        format!(
            "Restored {} ({} statement(s), {} table(s) dropped first)",
            path.display(),
            report.statements_executed,
            report.tables_dropped.len()
        )
        .green()
    );
    Ok(())
}

pub fn do_list(resolved: &Resolved) -> Result<()> {
    let folder = &resolved.settings.backup_folder;
    if !folder.exists() {
        println!("{} {}", "i".yellow().bold(), "No backups found".yellow());
        return Ok(());
    }
    let entries = sqlsnap::storage::list_backups(folder)?;

    if entries.is_empty() {
        println!("{} {}", "i".yellow().bold(), "No backups found".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Modified").add_attribute(Attribute::Bold),
            Cell::new("Archived").add_attribute(Attribute::Bold),
        ]);

    for e in &entries {
        table.add_row(vec![
            Cell::new(&e.file_name),
            Cell::new(e.size_bytes),
            Cell::new(e.modified.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(if e.archived { "yes" } else { "no" }),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn do_version() {
    println!("{} {}", "sqlsnap".bold(), env!("CARGO_PKG_VERSION").cyan());
}

fn create_progress_bar(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    bar.set_message(prefix.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    bar
}

fn prompt_confirm(message: &str) -> Result<bool> {
    use std::io::{self, IsTerminal, Write};
    if !io::stdin().is_terminal() {
        return Err(anyhow!("refusing to drop tables without confirmation; pass --yes"));
    }
    print!("{} {}", "?".cyan().bold(), message.cyan());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let ans = input.trim().to_lowercase();
    Ok(ans == "y" || ans == "yes")
}
