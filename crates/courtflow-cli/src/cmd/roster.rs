use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use courtflow_core::roster::{Player, PlayerField};
use std::path::Path;

use super::context::{block_on, print_removed, remove, set_field, Workspace};

#[derive(Subcommand)]
pub enum RosterSubcommand {
    /// List players by name
    List,
    /// Add a player
    Add {
        #[arg(required = true)]
        name: Vec<String>,
        /// Jersey number
        #[arg(long, short = 'n')]
        number: Option<String>,
    },
    /// Edit one field of a player (name, number)
    Set {
        id: String,
        field: String,
        value: String,
    },
    /// Remove a player
    Rm { id: String },
}

pub fn run(root: &Path, subcmd: RosterSubcommand, json: bool) -> anyhow::Result<()> {
    block_on(dispatch(root, subcmd, json))
}

async fn dispatch(root: &Path, subcmd: RosterSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root).await?;
    match subcmd {
        RosterSubcommand::List => list(&ws, json).await,
        RosterSubcommand::Add { name, number } => {
            add(&ws, &name.join(" "), number.as_deref(), json).await
        }
        RosterSubcommand::Set { id, field, value } => {
            let player = set_field::<Player>(&ws, &id, &field, &value).await?;
            if json {
                print_json(&player)?;
            } else {
                println!("Updated {}", player.label());
            }
            Ok(())
        }
        RosterSubcommand::Rm { id } => {
            let removed = remove::<Player>(&ws, &id).await?;
            print_removed("player", &id, removed, json)
        }
    }
}

async fn list(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let roster = ws.records::<Player>().await?;
    if json {
        return print_json(&roster.items());
    }
    if roster.items().is_empty() {
        println!("No players on the roster.");
        return Ok(());
    }
    let rows = roster
        .items()
        .iter()
        .map(|p| vec![p.number.clone(), p.name.clone(), p.id.clone()])
        .collect();
    print_table(&["#", "NAME", "ID"], rows);
    Ok(())
}

async fn add(ws: &Workspace, name: &str, number: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut roster = ws.records::<Player>().await?;
    let mut fields = vec![(PlayerField::Name, name)];
    if let Some(n) = number {
        fields.push((PlayerField::Number, n));
    }
    let player = roster.create(&fields).await.context("failed to add player")?;
    if json {
        print_json(&player)?;
    } else {
        println!("Added {} [{}]", player.label(), player.id);
    }
    Ok(())
}
