use anyhow::Context;
use courtflow_core::{
    config::{Config, StoreBackend},
    io, paths, session,
    store::open_store,
};
use std::path::Path;

use super::context::block_on;

pub struct InitOptions<'a> {
    pub org_name: Option<&'a str>,
    pub remote_url: Option<&'a str>,
    pub email: Option<&'a str>,
}

pub fn run(root: &Path, opts: InitOptions<'_>) -> anyhow::Result<()> {
    println!("Initializing courtflow in: {}", root.display());

    let dir = paths::courtflow_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let mut cfg = Config::default();
        if let Some(name) = opts.org_name {
            cfg.organization_name = name.to_string();
        }
        if let Some(url) = opts.remote_url {
            cfg.store = StoreBackend::Remote {
                url: url.to_string(),
                api_key: String::new(),
                timeout_secs: 30,
            };
        }
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    for w in config.validate() {
        println!("  [{}] {}", w.level.as_str(), w.message);
    }

    if session::Session::load(root)
        .context("failed to read session")?
        .is_some()
    {
        println!("  exists:  {}", paths::SESSION_FILE);
        return Ok(());
    }

    block_on(async {
        let store = open_store(root, &config.store).context("failed to open record store")?;
        session::sign_in(root, &*store, &config, opts.email)
            .await
            .context("failed to create organization")?;
        println!("  created: {}", paths::SESSION_FILE);
        Ok::<_, anyhow::Error>(())
    })?;

    println!("\ncourtflow initialized for '{}'.", config.organization_name);
    Ok(())
}
