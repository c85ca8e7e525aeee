use crate::output::print_json;
use crate::settings::{self, Overrides};
use anyhow::{bail, Context};
use clap::Subcommand;
use pancho_core::config::WarnLevel;
use pancho_core::ClientConfig;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a config file populated with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective config (file plus command-line overrides)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    path: &Path,
    overrides: &Overrides,
    subcmd: ConfigSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init { force } => init(path, overrides, force, json),
        ConfigSubcommand::Show => show(path, overrides, json),
        ConfigSubcommand::Validate => validate(path, overrides, json),
    }
}

fn init(path: &Path, overrides: &Overrides, force: bool, json: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let mut config = ClientConfig::default();
    overrides.apply(&mut config);
    config
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({ "path": path, "config": config }))?;
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn show(path: &Path, overrides: &Overrides, json: bool) -> anyhow::Result<()> {
    let config = settings::resolve(path, overrides)?;
    if json {
        print_json(&config)?;
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(path: &Path, overrides: &Overrides, json: bool) -> anyhow::Result<()> {
    let config = settings::resolve(path, overrides)?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
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

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        bail!("config validation found errors");
    }

    Ok(())
}
