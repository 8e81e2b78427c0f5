use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use spendwise_finance::{LlmConfig, PipelineConfig};

use crate::state::{default_db_path, ensure_spendwise_home};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreSection,
    pub llm: LlmSection,
    pub pipeline: PipelineSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreSection {
    /// SQLite file; defaults to finance.db under the spendwise home
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "groq", "openai", any other OpenAI-compatible label, or "none" to
    /// turn advice off
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub store_timeout_ms: u64,
    pub llm_timeout_ms: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        let llm = LlmConfig::default();
        Self {
            provider: "groq".to_string(),
            model: llm.model,
            base_url: llm.base_url,
            temperature: llm.temperature,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        let p = PipelineConfig::default();
        Self {
            store_timeout_ms: millis(p.store_timeout),
            llm_timeout_ms: millis(p.llm_timeout),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl StoreSection {
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(p) => Ok(p.clone()),
            None => default_db_path(),
        }
    }
}

impl LlmSection {
    pub fn is_disabled(&self) -> bool {
        self.provider.eq_ignore_ascii_case("none")
    }

    pub fn to_llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }

    /// Key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

impl PipelineSection {
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            llm_timeout: Duration::from_millis(self.llm_timeout_ms),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_spendwise_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write the default config unless one exists. Returns the path and whether
/// a file was written.
pub fn init_config() -> Result<(PathBuf, bool)> {
    let p = config_path()?;
    if p.exists() {
        return Ok((p, false));
    }
    save_config_to(&p, &Config::default())?;
    Ok((p, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.llm.model, "llama-3.1-8b-instant");
        assert_eq!(cfg.pipeline.store_timeout_ms, 2000);
        assert_eq!(cfg.pipeline.llm_timeout_ms, 15000);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.store.path = Some(dir.path().join("money.db"));
        cfg.llm.provider = "none".to_string();
        cfg.pipeline.llm_timeout_ms = 500;
        save_config_to(&p, &cfg).unwrap();

        let loaded = load_config_from(&p).unwrap();
        assert_eq!(loaded, cfg);
        assert!(loaded.llm.is_disabled());
        assert_eq!(
            loaded.pipeline.to_pipeline_config().llm_timeout,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[llm]\nmodel = \"gpt-4o-mini\"\n").unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(cfg.pipeline, PipelineSection::default());
        assert!(cfg.store.path.is_none());
    }

    #[test]
    fn test_bad_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[pipeline\n").unwrap();
        let err = load_config_from(&p).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    #[test]
    fn test_llm_config_conversion() {
        let llm = LlmSection::default().to_llm_config();
        assert_eq!(llm, LlmConfig::default());
    }
}
