//! Environment variable substitution, API key and mode resolution.

use super::types::Config;

use crate::constants::{API_KEY_ENV_VARS, BUILTIN_MODES};

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        self.api_base_url = Self::resolve_str(&self.api_base_url);
        if let Some(ref mut key) = self.api_key {
            *key = Self::resolve_str(key);
        }
        for prompt in self.modes.values_mut() {
            *prompt = Self::resolve_str(prompt);
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    pub(super) fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        while let Some(start) = result.find("{env:") {
            let Some(end) = result[start..].find('}') else {
                break;
            };
            let var_name = &result[start + 5..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        }
        result
    }

    /// Resolve the API key: environment variables first, then config value.
    ///
    /// Empty values count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .chain(self.api_key.clone())
            .find(|key| !key.trim().is_empty())
    }

    /// Names of every known mode: built-ins first, then configured extras.
    pub fn mode_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_MODES.iter().map(|(n, _)| n.to_string()).collect();
        for name in self.modes.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// System prompt for a mode. Configured prompts override built-ins.
    pub fn system_prompt_for(&self, mode: &str) -> Option<String> {
        self.modes.get(mode).cloned().or_else(|| {
            BUILTIN_MODES
                .iter()
                .find(|(name, _)| *name == mode)
                .map(|(_, prompt)| prompt.to_string())
        })
    }

    /// Model to use: the CLI override when given, else the configured one.
    pub fn resolve_model(&self, cli_model: Option<&str>) -> String {
        cli_model
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.model.clone())
    }
}
