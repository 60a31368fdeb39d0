use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const COURTFLOW_DIR: &str = ".courtflow";
pub const CONFIG_FILE: &str = ".courtflow/config.yaml";
pub const SESSION_FILE: &str = ".courtflow/session.yaml";
pub const DEFAULT_STORE_FILE: &str = ".courtflow/data.redb";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn courtflow_dir(root: &Path) -> PathBuf {
    root.join(COURTFLOW_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn session_path(root: &Path) -> PathBuf {
    root.join(SESSION_FILE)
}
