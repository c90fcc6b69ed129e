//! File loading and merging for chatwire configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::types::{default_model, Config, ProjectConfig};

impl Config {
    /// Loads the global config from `~/.config/chatwire/config.toml`.
    ///
    /// If no config file exists, writes one with defaults (including an
    /// `{env:VAR}` placeholder for the API key) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        Self::load_or_create(&Self::config_path()?)
    }

    pub(super) fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_toml = format!(
                r#"model = "{}"
api_key = "{{env:OPENROUTER_API_KEY}}"
mode = "standard"

[tools]
enabled = []
"#,
                default_model()
            );
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            debug!(path = %path.display(), "wrote default config");
            return toml::from_str(&default_toml).context("Failed to parse default config");
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Look for chatwire.toml in the current dir, then walk up to the git root.
    pub(super) fn load_project() -> Result<Option<ProjectConfig>> {
        let Some(path) = Self::find_project_file(&std::env::current_dir()?) else {
            return Ok(None);
        };
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read project config {:?}", path))?;
        let project = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse project config {:?}", path))?;
        debug!(path = %path.display(), "loaded project config");
        Ok(Some(project))
    }

    pub(super) fn find_project_file(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                return None;
            }
        }
    }

    /// Merge project config over global config. Project values win when present.
    pub(super) fn merge(global: Config, project: ProjectConfig) -> Config {
        let mut modes = global.modes;
        modes.extend(project.modes);
        Config {
            model: project.model.unwrap_or(global.model),
            api_base_url: project.api_base_url.unwrap_or(global.api_base_url),
            api_key: project.api_key.or(global.api_key),
            mode: project.mode.unwrap_or(global.mode),
            modes,
            tools: project.tools.unwrap_or(global.tools),
            max_tool_rounds: project.max_tool_rounds.unwrap_or(global.max_tool_rounds),
            attribution: project.attribution.unwrap_or(global.attribution),
        }
    }
}
