// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::banner::SnapshotStore;
use crate::constants::MAX_AVATAR_TIMEOUT_SECS;

pub mod guild;
pub mod render;

pub use guild::GuildConfig;
pub use render::RenderConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub guilds: Vec<GuildConfig>,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut substituted = String::with_capacity(yaml.len());
        for line in yaml.lines() {
            // Comment lines are passed through untouched
            if line.trim_start().starts_with('#') {
                substituted.push_str(line);
                substituted.push('\n');
                continue;
            }

            // Check that every referenced environment variable exists
            for caps in re.captures_iter(line) {
                let var_name = &caps[1];
                std::env::var(var_name).map_err(|_| {
                    format!(
                        "Environment variable '{}' is referenced but not set",
                        var_name
                    )
                })?;
            }

            substituted.push_str(&re.replace_all(line, |caps: &regex::Captures| {
                std::env::var(&caps[1]).unwrap_or_default()
            }));
            substituted.push('\n');
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        let timeout = self.render.avatar_timeout_secs;
        if timeout == 0 || timeout > MAX_AVATAR_TIMEOUT_SECS {
            return Err(format!(
                "render.avatar_timeout_secs must be between 1 and {}, got {}",
                MAX_AVATAR_TIMEOUT_SECS, timeout
            ));
        }

        if self.render.queue_capacity == 0 {
            return Err("render.queue_capacity must be at least 1".to_string());
        }

        if self.render.background_dir.as_os_str().is_empty() {
            return Err("render.background_dir cannot be empty".to_string());
        }

        let mut seen_guilds = HashSet::new();
        for guild in &self.guilds {
            if guild.guild_id == 0 {
                return Err("Guild id cannot be 0".to_string());
            }

            // Check for duplicate guild ids
            if !seen_guilds.insert(guild.guild_id) {
                return Err(format!("Duplicate guild_id {} found", guild.guild_id));
            }

            if guild.welcome_channel_id == Some(0) {
                return Err(format!(
                    "Guild {} has welcome_channel_id 0",
                    guild.guild_id
                ));
            }
        }

        Ok(())
    }

    /// In-memory store holding a snapshot of every configured guild.
    pub fn banner_store(&self) -> SnapshotStore {
        let store = SnapshotStore::new(&self.render.background_dir);
        for guild in &self.guilds {
            store.upsert(guild.to_banner_config());
        }
        store
    }

}
