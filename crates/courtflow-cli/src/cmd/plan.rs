use crate::output::{print_json, print_table, render_table};
use anyhow::Context;
use clap::Subcommand;
use courtflow_core::{
    plan::{PlanField, PlanSheet},
    record::FieldSpec,
    types::{format_clock, parse_date},
};
use std::path::Path;

use super::context::{block_on, print_removed, Workspace};

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// List practice plans, newest first
    List,
    /// Create a plan with the standard opening activities
    New {
        /// Practice date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show a plan and its activities
    Show { id: String },
    /// Edit one field (date, start_time, team1_roster, team2_roster, notes)
    Set {
        id: String,
        field: String,
        value: String,
    },
    /// Delete a plan and all of its activities
    Rm { id: String },
    /// Render the printable practice sheet
    Print { id: String },
}

pub fn run(root: &Path, subcmd: PlanSubcommand, json: bool) -> anyhow::Result<()> {
    block_on(dispatch(root, subcmd, json))
}

async fn dispatch(root: &Path, subcmd: PlanSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root).await?;
    let mut plans = ws.plans().await?;
    match subcmd {
        PlanSubcommand::List => {
            let sheets = plans.list().await.context("failed to load activities")?;
            if json {
                return print_json(&sheets);
            }
            if sheets.is_empty() {
                println!("No practice plans.");
                return Ok(());
            }
            let rows = sheets
                .iter()
                .map(|s| {
                    vec![
                        s.plan.date.to_string(),
                        format_clock(s.plan.start_time),
                        s.activities.len().to_string(),
                        s.plan.id.clone(),
                    ]
                })
                .collect();
            print_table(&["DATE", "START", "ACTIVITIES", "ID"], rows);
            Ok(())
        }
        PlanSubcommand::New { date } => {
            let date = date
                .as_deref()
                .map(|d| parse_date("date", d))
                .transpose()?;
            let sheet = plans.create(date).await.context("failed to create plan")?;
            if json {
                print_json(&sheet)?;
            } else {
                println!("Created plan for {} [{}]", sheet.plan.date, sheet.plan.id);
                print_activities(&sheet);
            }
            Ok(())
        }
        PlanSubcommand::Show { id } => {
            let sheet = plans.sheet(&id).await?;
            if json {
                return print_json(&sheet);
            }
            println!(
                "{} starting {} [{}]",
                sheet.plan.date,
                format_clock(sheet.plan.start_time),
                sheet.plan.id
            );
            println!();
            print_activities(&sheet);
            Ok(())
        }
        PlanSubcommand::Set { id, field, value } => {
            let field = PlanField::parse(&field).with_context(|| {
                let names: Vec<&str> = PlanField::all().iter().map(|f| f.column()).collect();
                format!("fields are: {}", names.join(", "))
            })?;
            let plan = plans
                .patch(&id, field, &value)
                .await
                .with_context(|| format!("failed to update plan '{id}'"))?;
            if json {
                print_json(&plan)?;
            } else {
                println!("Updated plan for {}", plan.date);
            }
            Ok(())
        }
        PlanSubcommand::Rm { id } => {
            let removed = plans
                .delete(&id)
                .await
                .with_context(|| format!("failed to delete plan '{id}'"))?;
            print_removed("plan", &id, removed, json)
        }
        PlanSubcommand::Print { id } => {
            let sheet = plans.sheet(&id).await?;
            if json {
                return print_json(&sheet);
            }
            print!("{}", render_sheet(&sheet));
            Ok(())
        }
    }
}

fn print_activities(sheet: &PlanSheet) {
    if sheet.activities.is_empty() {
        println!("No activities.");
        return;
    }
    let rows = sheet
        .activities
        .iter()
        .map(|a| {
            vec![
                a.order_index.to_string(),
                a.start_clock.format("%H:%M").to_string(),
                a.end_clock.format("%H:%M").to_string(),
                a.duration_minutes().to_string(),
                a.activity_text.clone(),
                a.cue_text.clone(),
                a.id.clone(),
            ]
        })
        .collect();
    print_table(&["#", "START", "END", "MIN", "ACTIVITY", "CUES", "ID"], rows);
}

/// The printable practice sheet: header, timed activity table, the two
/// scrimmage groups, and the notes.
fn render_sheet(sheet: &PlanSheet) -> String {
    let plan = &sheet.plan;
    let mut out = String::new();
    out.push_str(&format!("PRACTICE PLAN: {}\n", plan.date.format("%A, %B %-d, %Y")));
    out.push_str(&format!("Start: {}\n\n", format_clock(plan.start_time)));

    let rows: Vec<Vec<String>> = sheet
        .activities
        .iter()
        .map(|a| {
            vec![
                format!("{} - {}", format_clock(a.start_clock), format_clock(a.end_clock)),
                a.activity_text.clone(),
                a.cue_text.clone(),
            ]
        })
        .collect();
    out.push_str(&render_table(&["TIME", "ACTIVITY", "COACHING POINTS"], &rows));
    let total: i64 = sheet.activities.iter().map(|a| a.duration_minutes()).sum();
    out.push_str(&format!("Total: {total} min\n"));

    let blank = |v: &Option<String>| v.clone().unwrap_or_default();
    out.push_str(&format!("\nTeam 1: {}\n", blank(&plan.team1_roster)));
    out.push_str(&format!("Team 2: {}\n", blank(&plan.team2_roster)));
    out.push_str(&format!("\nNotes:\n{}\n", blank(&plan.notes)));
    out
}
