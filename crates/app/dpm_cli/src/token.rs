//! Access token persisted between invocations.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// `--token-file` / `DPM_TOKEN_FILE`, else `<data dir>/dpm/token`.
pub fn token_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    dirs::data_dir()
        .map(|dir| dir.join("dpm").join("token"))
        .ok_or_else(|| Error::Custom("no data directory; pass --token-file".into()))
}

pub fn load(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(token) => {
            let token = token.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn store(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, token)?;
    log::debug!("token written to {}", path.display());
    Ok(())
}

pub fn remove(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
