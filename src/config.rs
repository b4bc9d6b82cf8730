use crate::storage::JsonStorage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub active: String,
    pub rest: String,
    pub cycles: u32,
    pub tick_interval: String,
    pub clock_skew_tolerance: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active: "30s".into(),
            rest: "10s".into(),
            cycles: 4,
            tick_interval: "1s".into(),
            clock_skew_tolerance: "2s".into(),
        }
    }
}

impl Config {
    pub fn tick_interval(&self) -> Result<std::time::Duration> {
        humantime::parse_duration(&self.tick_interval)
            .with_context(|| format!("invalid tick_interval {:?}", self.tick_interval))
    }

    pub fn clock_skew_tolerance(&self) -> Result<chrono::Duration> {
        parse_duration(&self.clock_skew_tolerance)
    }
}

/// Parses a human duration such as "45s" or "1m 30s".
pub fn parse_duration(value: &str) -> Result<chrono::Duration> {
    let parsed = humantime::parse_duration(value)
        .with_context(|| format!("invalid duration {:?}", value))?;
    chrono::Duration::from_std(parsed).with_context(|| format!("duration {:?} is too large", value))
}

pub fn load_config() -> Result<Config> {
    let path = JsonStorage::base_dir()?.join("config.json");
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(path, data)?;
        return Ok(config);
    }

    let data = fs::read_to_string(path)?;
    let config = serde_json::from_str(&data)
        .with_context(|| format!("could not parse {}", path.display()))?;
    Ok(config)
}
