//! File helpers for the YAML state under `.courtflow/`.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `data` in one rename; readers never see a partial file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// `None` when the file does not exist.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(Some(serde_yaml::from_str(&data)?))
}

pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_yaml::to_string(value)?;
    atomic_write(path, data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".courtflow/nested/session.yaml");
        atomic_write(&path, b"user_id: u1").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "user_id: u1");
    }

    #[test]
    fn yaml_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let got: Option<BTreeMap<String, String>> =
            read_yaml(&dir.path().join("absent.yaml")).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn yaml_overwrite_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.yaml");
        let mut v = BTreeMap::new();
        v.insert("organization_id".to_string(), "o1".to_string());
        write_yaml(&path, &v).unwrap();
        v.insert("organization_id".to_string(), "o2".to_string());
        write_yaml(&path, &v).unwrap();
        let back: BTreeMap<String, String> = read_yaml(&path).unwrap().unwrap();
        assert_eq!(back["organization_id"], "o2");
    }
}
