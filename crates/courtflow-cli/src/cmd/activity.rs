use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use courtflow_core::{
    activity::{ActivityDraft, ActivityField},
    record::FieldSpec,
    sequencer::ActivitySequencer,
};
use std::path::Path;

use super::context::{block_on, print_removed, Workspace};

#[derive(Subcommand)]
pub enum ActivitySubcommand {
    /// Add an activity to a plan
    Add {
        plan: String,
        /// Insert after this position (0-based); default appends
        #[arg(long)]
        after: Option<usize>,
        /// Start clock (HH:MM)
        #[arg(long)]
        start: Option<String>,
        /// End clock (HH:MM)
        #[arg(long)]
        end: Option<String>,
        /// Coaching points
        #[arg(long)]
        cue: Option<String>,
        /// Activity description
        text: Vec<String>,
    },
    /// Edit one field (start_clock, end_clock, activity_text, cue_text)
    Set {
        plan: String,
        id: String,
        field: String,
        value: String,
    },
    /// Remove an activity
    Rm { plan: String, id: String },
    /// Put every activity of the plan in the given order
    Reorder {
        plan: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move one activity to a position (0-based, clamped to the end)
    Move { plan: String, id: String, to: usize },
}

pub fn run(root: &Path, subcmd: ActivitySubcommand, json: bool) -> anyhow::Result<()> {
    block_on(dispatch(root, subcmd, json))
}

async fn open_plan(ws: &Workspace, plan_id: &str) -> anyhow::Result<ActivitySequencer> {
    let plans = ws.plans().await?;
    plans
        .sequencer(plan_id)
        .await
        .with_context(|| format!("failed to open plan '{plan_id}'"))
}

async fn dispatch(root: &Path, subcmd: ActivitySubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root).await?;
    match subcmd {
        ActivitySubcommand::Add {
            plan,
            after,
            start,
            end,
            cue,
            text,
        } => {
            let mut draft = ActivityDraft::titled(text.join(" "));
            for (field, value) in [
                (ActivityField::StartClock, start),
                (ActivityField::EndClock, end),
                (ActivityField::CueText, cue),
            ] {
                if let Some(v) = value {
                    draft.set(field, &v)?;
                }
            }
            let mut seq = open_plan(&ws, &plan).await?;
            let activity = seq
                .insert_after(after, draft)
                .await
                .context("failed to add activity")?;
            if json {
                print_json(&activity)?;
            } else {
                println!(
                    "Added activity at position {} [{}]",
                    activity.order_index, activity.id
                );
            }
            Ok(())
        }
        ActivitySubcommand::Set {
            plan,
            id,
            field,
            value,
        } => {
            let field = ActivityField::parse(&field).with_context(|| {
                let names: Vec<&str> = ActivityField::all().iter().map(|f| f.column()).collect();
                format!("fields are: {}", names.join(", "))
            })?;
            let mut seq = open_plan(&ws, &plan).await?;
            let activity = seq
                .update_field(&id, field, &value)
                .await
                .with_context(|| format!("failed to update activity '{id}'"))?;
            if json {
                print_json(&activity)?;
            } else {
                println!("Updated activity {}", activity.id);
            }
            Ok(())
        }
        ActivitySubcommand::Rm { plan, id } => {
            let mut seq = open_plan(&ws, &plan).await?;
            let removed = seq
                .delete(&id)
                .await
                .with_context(|| format!("failed to delete activity '{id}'"))?;
            print_removed("activity", &id, removed, json)
        }
        ActivitySubcommand::Reorder { plan, ids } => {
            let mut seq = open_plan(&ws, &plan).await?;
            let ordered: Vec<&str> = ids.iter().map(String::as_str).collect();
            seq.reindex(&ordered).await.context("failed to reorder activities")?;
            print_order(&seq, json)
        }
        ActivitySubcommand::Move { plan, id, to } => {
            let mut seq = open_plan(&ws, &plan).await?;
            let landed = seq
                .move_to(&id, to)
                .await
                .with_context(|| format!("failed to move activity '{id}'"))?;
            if !json {
                println!("Moved activity {id} to position {landed}");
            }
            print_order(&seq, json)
        }
    }
}

fn print_order(seq: &ActivitySequencer, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&seq.activities());
    }
    for a in seq.activities() {
        println!("{:>2}  {}  {}", a.order_index, a.activity_text, a.id);
    }
    Ok(())
}
