use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tradelog_core::time::parse_tz;
use tradelog_core::{ParseOptions, SessionConfig};

use crate::sink::OutputFormat;
use crate::state::{ensure_tradelog_home, tradelog_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchSection,
    #[serde(default)]
    pub parse: ParseSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Quiet period after the last mutation before a rescan.
    pub debounce_ms: u64,
    /// How often the load-more control is activated.
    pub load_more_interval_ms: u64,
    pub start_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseSection {
    /// IANA zone for page dates that carry no offset.
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub format: OutputFormat,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            load_more_interval_ms: 3000,
            start_enabled: true,
        }
    }
}

impl Default for ParseSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        parse_tz(&self.parse.timezone)
            .with_context(|| format!("invalid timezone in config: {}", self.parse.timezone))
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        Ok(SessionConfig {
            debounce: Duration::from_millis(self.watch.debounce_ms),
            load_more_interval: Duration::from_millis(self.watch.load_more_interval_ms.max(1)),
            start_enabled: self.watch.start_enabled,
            parse: ParseOptions {
                timezone: self.timezone()?,
            },
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(tradelog_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<PathBuf> {
    let p = ensure_tradelog_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let written = save_config(&Config::default())?;
    println!("Wrote {}", written.display());
    Ok(())
}
