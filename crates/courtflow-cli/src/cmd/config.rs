use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use courtflow_core::config::{Config, StoreBackend, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the loaded configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config.redacted());
    }
    let store = match &config.store {
        StoreBackend::Local { path } => format!("local ({})", path.display()),
        StoreBackend::Remote {
            url, timeout_secs, ..
        } => format!("remote ({url}, timeout {timeout_secs}s)"),
        StoreBackend::Memory => "memory".to_string(),
    };
    print_table(
        &["SETTING", "VALUE"],
        vec![
            vec!["organization_name".to_string(), config.organization_name.clone()],
            vec!["store".to_string(), store],
        ],
    );
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let findings = config.validate();
    let errors = findings
        .iter()
        .filter(|w| w.level == WarnLevel::Error)
        .count();

    if json {
        print_json(&serde_json::json!({ "errors": errors, "warnings": findings }))?;
    } else if findings.is_empty() {
        println!("config.yaml OK");
    } else {
        for w in &findings {
            println!("[{}] {}", w.level.as_str(), w.message);
        }
    }

    if errors > 0 {
        anyhow::bail!("config.yaml has {errors} error(s)");
    }
    Ok(())
}
