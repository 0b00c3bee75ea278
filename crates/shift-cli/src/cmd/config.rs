use crate::output::{join_or_dash, print_json};
use anyhow::{bail, Context};
use clap::Subcommand;
use shift_core::config::{Config, WarnLevel};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a config file with every default spelled out
    Init {
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config_path: Option<&Path>, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(config_path, json),
        ConfigSubcommand::Validate => validate(config_path, json),
        ConfigSubcommand::Init { path, force } => init(&path, force, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    if json {
        return print_json(&config);
    }

    let s = &config.schedule;
    println!("Roster:");
    println!("  default work days:  {}", config.roster.default_work_days);
    println!("  seed one per tier:  {}", config.roster.seed_one_per_tier);
    println!("Schedule defaults:");
    println!("  staff on normal:    {}", s.required_staff_count_on_normal);
    println!("  staff on busy:      {}", s.required_staff_count_on_busy);
    println!(
        "  attendance tiers:   {}",
        join_or_dash(s.required_attendance_tiers.iter())
    );
    println!("  attendance count:   {}", s.required_attendance_tier_count);
    println!("Calendar:");
    println!("  weekends busy:      {}", config.calendar.weekends_restricted);
    println!(
        "  holidays:           {}",
        join_or_dash(config.calendar.holidays.iter())
    );
    println!("Optimizer:");
    println!("  url:                {}", config.optimizer.url);
    println!("  timeout:            {}s", config.optimizer.timeout_secs);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(path: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({ "path": path }))?;
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
