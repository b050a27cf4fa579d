use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$TRADELOG_HOME`, else `~/.tradelog`.
pub fn tradelog_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TRADELOG_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tradelog"))
}

pub fn ensure_tradelog_home() -> Result<PathBuf> {
    let dir = tradelog_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
