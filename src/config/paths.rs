//! Where chatwire keeps its files.
//!
//! Each [`Location`] maps to a platform directory (XDG on Linux) with an
//! `chatwire/` subdirectory. Setting `CHATWIRE_HOME` moves all of them under
//! one root, as `config/`, `data/` and `cache/`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use super::types::Config;
use crate::constants::{APP_NAME, CHAT_STORE_FILENAME, CONFIG_FILENAME, HISTORY_FILENAME, HOME_ENV};

/// The kinds of directory chatwire writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// `config.toml`.
    Config,
    /// The persisted chat.
    Data,
    /// Readline history.
    Cache,
}

impl Location {
    fn subdir(self) -> &'static str {
        match self {
            Location::Config => "config",
            Location::Data => "data",
            Location::Cache => "cache",
        }
    }

    fn platform_base(self) -> Option<PathBuf> {
        match self {
            Location::Config => dirs::config_dir(),
            Location::Data => dirs::data_dir(),
            Location::Cache => dirs::cache_dir(),
        }
    }

    /// Resolves the directory, preferring `home` when one is given.
    fn resolve(self, home: Option<&Path>) -> Result<PathBuf> {
        if let Some(home) = home {
            return Ok(home.join(self.subdir()));
        }
        self.platform_base()
            .map(|base| base.join(APP_NAME))
            .ok_or_else(|| anyhow!("Could not determine {} directory", self.subdir()))
    }
}

impl Config {
    /// Returns the directory for `location`, honoring `CHATWIRE_HOME`.
    pub fn dir(location: Location) -> Result<PathBuf> {
        let home = std::env::var_os(HOME_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        location.resolve(home.as_deref())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::dir(Location::Config)?.join(CONFIG_FILENAME))
    }

    /// The JSON file holding the saved conversation.
    pub fn chat_store_path() -> Result<PathBuf> {
        Ok(Self::dir(Location::Data)?.join(CHAT_STORE_FILENAME))
    }

    pub fn readline_history_path() -> Result<PathBuf> {
        Ok(Self::dir(Location::Cache)?.join(HISTORY_FILENAME))
    }
}
