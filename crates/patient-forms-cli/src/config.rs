use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use patient_forms_core::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

impl ProfileConfig {
    pub fn output_format(&self) -> Option<OutputFormat> {
        match self.format.as_deref()? {
            "json" => Some(OutputFormat::Json),
            "table" => Some(OutputFormat::Table),
            other => {
                tracing::warn!(format = other, "ignoring unknown output format in config");
                None
            }
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => self.server = Some(value.to_string()),
            "format" => match value {
                "json" | "table" => self.format = Some(value.to_string()),
                other => anyhow::bail!("Unknown format: {other}. Valid formats: json, table"),
            },
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: server, format"),
        }
        Ok(())
    }
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".patient-forms");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

fn load_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
}

fn save_to(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_from(path)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_from(&config_path()?)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_to(&config_path()?, profile, config)
}

/// Base URL: `--server` / `PATIENT_FORMS_URL`, then the profile, then the
/// local development default.
pub fn resolve_server(cli_server: &Option<String>, profile: &ProfileConfig) -> String {
    if let Some(s) = cli_server {
        return s.clone();
    }
    if let Some(s) = &profile.server {
        return s.clone();
    }
    DEFAULT_BASE_URL.to_string()
}
