use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::keymap::{self, Keymap, KeymapError};

/// How often the status view re-reads the working tree (ms).
pub const TICK_RATE_MS: u64 = 500;

/// Floor for a configured tick rate (ms).
pub const MIN_TICK_RATE_MS: u64 = 100;

/// How many commits the log view loads.
pub const LOG_LIMIT: usize = 100;

pub const CONFIG_FILE: &str = ".gitdeck.toml";

// ---------------------------------------------------------------------------
// Project config (.gitdeck.toml)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    pub display: Option<DisplayConfig>,
    /// `action = "key"` overrides, applied before command-line ones.
    pub keys: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    pub tick_rate: Option<u64>,
    pub log_limit: Option<usize>,
    pub show_help: Option<bool>,
}

impl ProjectConfig {
    pub fn tick_rate(&self) -> u64 {
        self.display
            .as_ref()
            .and_then(|d| d.tick_rate)
            .unwrap_or(TICK_RATE_MS)
    }

    pub fn log_limit(&self) -> usize {
        self.display
            .as_ref()
            .and_then(|d| d.log_limit)
            .unwrap_or(LOG_LIMIT)
    }

    pub fn show_help(&self) -> bool {
        self.display
            .as_ref()
            .and_then(|d| d.show_help)
            .unwrap_or(true)
    }

    pub fn key_overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .flatten()
            .map(|(action, key)| (action.as_str(), key.as_str()))
    }
}

/// Load project config from `.gitdeck.toml` at the repository root.
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load_project_config(root: &Path) -> ProjectConfig {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return ProjectConfig::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring {}: {}", path.display(), e);
            ProjectConfig::default()
        }
    }
}

/// Effective runtime settings after merging the project file with the
/// command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub tick_rate: Duration,
    pub log_limit: usize,
    pub show_help: bool,
    pub keymap: Keymap,
}

impl Settings {
    pub fn resolve(
        project: &ProjectConfig,
        key_args: &[String],
        hide_help: bool,
    ) -> anyhow::Result<Self> {
        let cli_overrides = key_args
            .iter()
            .map(|arg| keymap::parse_override(arg))
            .collect::<Result<Vec<_>, KeymapError>>()?;

        let keymap = Keymap::with_overrides(project.key_overrides().chain(cli_overrides))
            .context("invalid key bindings")?;

        Ok(Self {
            tick_rate: Duration::from_millis(project.tick_rate().max(MIN_TICK_RATE_MS)),
            log_limit: project.log_limit(),
            show_help: project.show_help() && !hide_help,
            keymap,
        })
    }
}
