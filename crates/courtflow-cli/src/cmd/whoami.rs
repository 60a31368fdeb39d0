use crate::output::print_json;
use anyhow::Context;
use courtflow_core::session;
use std::path::Path;

use super::context::{block_on, Workspace};

pub fn run(root: &Path, rename: Option<&str>, json: bool) -> anyhow::Result<()> {
    block_on(show(root, rename, json))
}

async fn show(root: &Path, rename: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root).await?;
    let org = match rename {
        Some(name) => session::rename_organization(&*ws.store, &ws.org, name)
            .await
            .context("failed to rename organization")?,
        None => session::load_organization(&*ws.store, &ws.org)
            .await
            .context("failed to load organization")?,
    };
    let profile = session::load_profile(&*ws.store, &ws.session.user_id)
        .await
        .context("failed to load profile")?;
    let full_name = profile
        .as_ref()
        .and_then(|p| p.full_name.clone())
        .unwrap_or_else(|| session::DEFAULT_FULL_NAME.to_string());

    if json {
        print_json(&serde_json::json!({
            "user_id": ws.session.user_id,
            "full_name": full_name,
            "email": profile.as_ref().and_then(|p| p.email.clone()),
            "organization": org,
        }))?;
    } else {
        println!("{full_name} ({})", ws.session.user_id);
        if let Some(email) = profile.as_ref().and_then(|p| p.email.as_deref()) {
            println!("Email:        {email}");
        }
        println!("Organization: {} ({})", org.name, org.id);
    }
    Ok(())
}
