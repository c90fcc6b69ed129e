//! Configuration types and path resolution for chatwire.
//!
//! chatwire stores its settings as TOML at the platform's XDG config path
//! (e.g. `~/.config/chatwire/config.toml` on Linux) and the persisted chat
//! under the XDG data directory (`~/.local/share/chatwire/`). `CHATWIRE_HOME`
//! moves all of it under one directory.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::Config;

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates the default config file if none exists.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_global()?;
        if let Some(project) = Self::load_project()? {
            config = Self::merge(config, project);
        }

        config.resolve_substitutions();
        Ok(config)
    }

    /// Renders the config as TOML, hiding the API key.
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            shown.api_key = Some("********".to_string());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}
