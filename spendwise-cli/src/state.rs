use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub const HOME_ENV: &str = "SPENDWISE_HOME";

/// `$SPENDWISE_HOME` when set, else `~/.spendwise`.
pub fn spendwise_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".spendwise"))
}

pub fn ensure_spendwise_home() -> Result<PathBuf> {
    let dir = spendwise_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(ensure_spendwise_home()?.join("finance.db"))
}
