use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use courtflow_core::{
    drill::{Drill, DrillField},
    types::DrillCategory,
};
use std::path::Path;

use super::context::{block_on, print_removed, remove, set_field, Workspace};

#[derive(Subcommand)]
pub enum DrillSubcommand {
    /// List drills by name
    List {
        /// Only drills in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Add a drill to the library
    Add {
        #[arg(required = true)]
        name: Vec<String>,
        /// Skill, Conditioning, Team Defense, Team Offense, Special Situations
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        focus: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Video link (YouTube links get an embeddable player URL)
        #[arg(long)]
        video: Option<String>,
    },
    /// Edit one field (name, category, focus, description, video_link)
    Set {
        id: String,
        field: String,
        value: String,
    },
    /// Show a drill with its embed link
    Show { id: String },
    /// Remove a drill
    Rm { id: String },
}

pub fn run(root: &Path, subcmd: DrillSubcommand, json: bool) -> anyhow::Result<()> {
    block_on(dispatch(root, subcmd, json))
}

async fn dispatch(root: &Path, subcmd: DrillSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root).await?;
    match subcmd {
        DrillSubcommand::List { category } => list(&ws, category.as_deref(), json).await,
        DrillSubcommand::Add {
            name,
            category,
            focus,
            description,
            video,
        } => {
            let name = name.join(" ");
            let mut fields = vec![(DrillField::Name, name.as_str())];
            let optional = [
                (DrillField::Category, category.as_deref()),
                (DrillField::Focus, focus.as_deref()),
                (DrillField::Description, description.as_deref()),
                (DrillField::VideoLink, video.as_deref()),
            ];
            fields.extend(optional.into_iter().filter_map(|(f, v)| v.map(|v| (f, v))));
            let mut drills = ws.records::<Drill>().await?;
            let drill = drills.create(&fields).await.context("failed to add drill")?;
            if json {
                print_json(&drill)?;
            } else {
                println!("Added drill '{}' [{}]", drill.name, drill.id);
            }
            Ok(())
        }
        DrillSubcommand::Set { id, field, value } => {
            let drill = set_field::<Drill>(&ws, &id, &field, &value).await?;
            if json {
                print_json(&drill)?;
            } else {
                println!("Updated drill '{}'", drill.name);
            }
            Ok(())
        }
        DrillSubcommand::Show { id } => show(&ws, &id, json).await,
        DrillSubcommand::Rm { id } => {
            let removed = remove::<Drill>(&ws, &id).await?;
            print_removed("drill", &id, removed, json)
        }
    }
}

async fn list(ws: &Workspace, category: Option<&str>, json: bool) -> anyhow::Result<()> {
    let wanted: Option<DrillCategory> = category
        .map(str::parse::<DrillCategory>)
        .transpose()
        .context("unknown drill category")?;
    let drills = ws.records::<Drill>().await?;
    let shown: Vec<&Drill> = drills
        .items()
        .iter()
        .filter(|d| wanted.map_or(true, |c| d.category == c))
        .collect();

    if json {
        return print_json(&shown);
    }
    if shown.is_empty() {
        println!("No drills.");
        return Ok(());
    }
    let rows = shown
        .iter()
        .map(|d| {
            vec![
                d.name.clone(),
                d.category.to_string(),
                d.focus.clone(),
                d.id.clone(),
            ]
        })
        .collect();
    print_table(&["NAME", "CATEGORY", "FOCUS", "ID"], rows);
    Ok(())
}

async fn show(ws: &Workspace, id: &str, json: bool) -> anyhow::Result<()> {
    let drills = ws.records::<Drill>().await?;
    let drill = drills
        .get(id)
        .with_context(|| format!("drill '{id}' not found"))?;
    let embed = drill.embed_url();

    if json {
        print_json(&serde_json::json!({ "drill": drill, "embed_url": embed }))?;
        return Ok(());
    }
    println!("{} ({})", drill.name, drill.category);
    if !drill.focus.is_empty() {
        println!("Focus: {}", drill.focus);
    }
    if !drill.description.is_empty() {
        println!("\n{}", drill.description);
    }
    if let Some(link) = &drill.video_link {
        println!("\nVideo: {link}");
    }
    if let Some(embed) = embed {
        println!("Embed: {embed}");
    }
    Ok(())
}
