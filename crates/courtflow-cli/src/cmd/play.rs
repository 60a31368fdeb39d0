use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use courtflow_core::play::{Play, PlayField};
use std::path::Path;

use super::context::{block_on, print_removed, remove, set_field, Workspace};

#[derive(Subcommand)]
pub enum PlaySubcommand {
    /// List the playbook by name
    List,
    /// Add a play
    Add {
        #[arg(required = true)]
        name: Vec<String>,
        /// Offense, Defense, Special
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Link to a diagram image
        #[arg(long)]
        diagram: Option<String>,
    },
    /// Edit one field (name, category, description, diagram_url)
    Set {
        id: String,
        field: String,
        value: String,
    },
    /// Remove a play
    Rm { id: String },
}

pub fn run(root: &Path, subcmd: PlaySubcommand, json: bool) -> anyhow::Result<()> {
    block_on(dispatch(root, subcmd, json))
}

async fn dispatch(root: &Path, subcmd: PlaySubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root).await?;
    match subcmd {
        PlaySubcommand::List => {
            let plays = ws.records::<Play>().await?;
            if json {
                return print_json(&plays.items());
            }
            if plays.items().is_empty() {
                println!("Playbook is empty.");
                return Ok(());
            }
            let rows = plays
                .items()
                .iter()
                .map(|p| vec![p.name.clone(), p.category.to_string(), p.id.clone()])
                .collect();
            print_table(&["NAME", "CATEGORY", "ID"], rows);
            Ok(())
        }
        PlaySubcommand::Add {
            name,
            category,
            description,
            diagram,
        } => {
            let name = name.join(" ");
            let mut fields = vec![(PlayField::Name, name.as_str())];
            if let Some(c) = category.as_deref() {
                fields.push((PlayField::Category, c));
            }
            if let Some(d) = description.as_deref() {
                fields.push((PlayField::Description, d));
            }
            if let Some(d) = diagram.as_deref() {
                fields.push((PlayField::DiagramUrl, d));
            }
            let mut plays = ws.records::<Play>().await?;
            let play = plays.create(&fields).await.context("failed to add play")?;
            if json {
                print_json(&play)?;
            } else {
                println!("Added play '{}' ({}) [{}]", play.name, play.category, play.id);
            }
            Ok(())
        }
        PlaySubcommand::Set { id, field, value } => {
            let play = set_field::<Play>(&ws, &id, &field, &value).await?;
            if json {
                print_json(&play)?;
            } else {
                println!("Updated play '{}'", play.name);
            }
            Ok(())
        }
        PlaySubcommand::Rm { id } => {
            let removed = remove::<Play>(&ws, &id).await?;
            print_removed("play", &id, removed, json)
        }
    }
}
