// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Layered `ddform` settings
//!
//! Precedence, lowest first: built-in defaults, the user file, the file given
//! with `--settings`, `DNSDECK_*` environment variables, `--setting` flags.

use anyhow::{bail, Context, Result};
use config_form::{extract, merge, path, FieldPath};
use serde::{Deserialize, Serialize};
use serde_json::Value as J;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "DNSDECK";
const SETTINGS_FILE: &str = "ddform.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Sort object keys when writing documents
    pub sort_keys: bool,
    /// Spaces per indentation level; 0 writes compact JSON
    pub indent: usize,
    /// Validate schema documents before using them
    pub strict_schema: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sort_keys: true,
            indent: 2,
            strict_schema: false,
        }
    }
}

/// Inputs to [`load`] other than the process environment
#[derive(Debug, Clone, Default)]
pub struct SettingsSources<'a> {
    pub user_file: Option<PathBuf>,
    pub settings_file: Option<&'a Path>,
    pub overrides: &'a [String],
}

impl Settings {
    pub fn load(sources: &SettingsSources<'_>) -> Result<Self> {
        let mut layers = vec![serde_json::to_value(Settings::default())?];

        if let Some(user) = sources.user_file.as_deref().filter(|p| p.exists()) {
            layers.push(read_toml_layer(user)?);
        }
        if let Some(file) = sources.settings_file {
            layers.push(read_toml_layer(file)?);
        }
        layers.push(env_overlay()?);
        layers.push(flags_overlay(sources.overrides)?);

        let merged = merge::merge_layers(layers);
        tracing::debug!(settings = %merged, "resolved settings");
        extract::get(&merged).context("invalid settings")
    }
}

/// `$DNSDECK_HOME/ddform.toml`, or `ddform.toml` in the platform config dir
pub fn user_settings_path() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("DNSDECK_HOME") {
        return Some(PathBuf::from(home).join(SETTINGS_FILE));
    }
    dirs::config_dir().map(|dir| dir.join("dnsdeck").join(SETTINGS_FILE))
}

fn read_toml_layer(path: &Path) -> Result<J> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    parse_toml_to_json(&text).with_context(|| format!("invalid settings file {}", path.display()))
}

pub fn parse_toml_to_json(text: &str) -> Result<J> {
    let table: toml::Table = toml::from_str(text)?;
    Ok(serde_json::to_value(table)?)
}

/// `DNSDECK_SORT_KEYS=false` becomes `{"sort-keys": false}`
fn env_overlay() -> Result<J> {
    let built = config::Config::builder()
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .convert_case(config::Case::Kebab)
                .try_parsing(true),
        )
        .build()?;

    Ok(serde_json::to_value(built.try_deserialize::<serde_json::Map<String, J>>()?)?)
}

/// `key=value` pairs; the value is read as JSON, falling back to a string
pub fn flags_overlay(pairs: &[String]) -> Result<J> {
    let mut root = serde_json::json!({});
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{pair}'"))?;
        let key = FieldPath::parse_strict(key.trim())?;
        if !path::set(&mut root, &key, parse_value(raw)) {
            bail!("refusing setting '{pair}': index is too far past the end of the list");
        }
    }
    Ok(root)
}

/// Command-line value: JSON when it parses, otherwise the literal text
pub fn parse_value(raw: &str) -> J {
    serde_json::from_str(raw).unwrap_or_else(|_| J::String(raw.to_string()))
}
