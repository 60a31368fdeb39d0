use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use courtflow_core::scouting::{ReportField, ScoutingReport};
use std::path::Path;

use super::context::{block_on, print_removed, remove, set_field, Workspace};

#[derive(Subcommand)]
pub enum ScoutSubcommand {
    /// List scouting reports, newest game first
    List,
    /// Start a report on an opponent
    Add {
        #[arg(required = true)]
        opponent: Vec<String>,
        /// Game date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show a full report
    Show { id: String },
    /// Edit one field (opponent, date, personnel, offense_notes, defense_notes, special_notes)
    Set {
        id: String,
        field: String,
        value: String,
    },
    /// Remove a report
    Rm { id: String },
}

pub fn run(root: &Path, subcmd: ScoutSubcommand, json: bool) -> anyhow::Result<()> {
    block_on(dispatch(root, subcmd, json))
}

async fn dispatch(root: &Path, subcmd: ScoutSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root).await?;
    match subcmd {
        ScoutSubcommand::List => {
            let reports = ws.records::<ScoutingReport>().await?;
            if json {
                return print_json(&reports.items());
            }
            if reports.items().is_empty() {
                println!("No scouting reports.");
                return Ok(());
            }
            let rows = reports
                .items()
                .iter()
                .map(|r| vec![r.date.to_string(), r.opponent.clone(), r.id.clone()])
                .collect();
            print_table(&["DATE", "OPPONENT", "ID"], rows);
            Ok(())
        }
        ScoutSubcommand::Add { opponent, date } => {
            let opponent = opponent.join(" ");
            let mut fields = vec![(ReportField::Opponent, opponent.as_str())];
            if let Some(d) = date.as_deref() {
                fields.push((ReportField::Date, d));
            }
            let mut reports = ws.records::<ScoutingReport>().await?;
            let report = reports
                .create(&fields)
                .await
                .context("failed to add scouting report")?;
            if json {
                print_json(&report)?;
            } else {
                println!(
                    "Added report on {} for {} [{}]",
                    report.opponent, report.date, report.id
                );
            }
            Ok(())
        }
        ScoutSubcommand::Show { id } => {
            let reports = ws.records::<ScoutingReport>().await?;
            let r = reports
                .get(&id)
                .with_context(|| format!("scouting report '{id}' not found"))?;
            if json {
                return print_json(r);
            }
            println!("{} on {}", r.opponent, r.date);
            for (title, body) in [
                ("Personnel", &r.personnel),
                ("Offense", &r.offense_notes),
                ("Defense", &r.defense_notes),
                ("Special situations", &r.special_notes),
            ] {
                if !body.is_empty() {
                    println!("\n{title}:\n{body}");
                }
            }
            Ok(())
        }
        ScoutSubcommand::Set { id, field, value } => {
            let report = set_field::<ScoutingReport>(&ws, &id, &field, &value).await?;
            if json {
                print_json(&report)?;
            } else {
                println!("Updated report on {}", report.opponent);
            }
            Ok(())
        }
        ScoutSubcommand::Rm { id } => {
            let removed = remove::<ScoutingReport>(&ws, &id).await?;
            print_removed("scouting report", &id, removed, json)
        }
    }
}
