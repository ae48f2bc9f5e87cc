//! Guild banner configuration snapshots.
//!
//! The renderer never reaches into global state. It is handed a
//! [`GuildBannerConfigStore`] and reads one immutable [`BannerConfig`]
//! snapshot at the start of each render. Updates from the configuration
//! path swap whole snapshots, so an in-flight render keeps the view it
//! started with.

use super::BannerError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Immutable per-guild banner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerConfig {
    pub guild_id: u64,
    pub enabled: bool,
    pub has_custom_background: bool,
    /// Greeting with the literal `user` and `server` tokens
    pub greeting_template: String,
    pub welcome_channel_id: Option<u64>,
}

impl BannerConfig {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            enabled: false,
            has_custom_background: false,
            greeting_template: String::new(),
            welcome_channel_id: None,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_custom_background(mut self, has_custom_background: bool) -> Self {
        self.has_custom_background = has_custom_background;
        self
    }

    pub fn with_greeting(mut self, template: impl Into<String>) -> Self {
        self.greeting_template = template.into();
        self
    }

    pub fn with_welcome_channel(mut self, channel_id: u64) -> Self {
        self.welcome_channel_id = Some(channel_id);
        self
    }
}

/// Read contract the banner core consumes.
///
/// Implementations must be cheap: they are consulted on every join event.
pub trait GuildBannerConfigStore: Send + Sync {
    /// Current snapshot for the guild.
    fn snapshot(&self, guild_id: u64) -> Result<Arc<BannerConfig>, BannerError>;

    /// Directory holding `<guild_id>.png` custom backgrounds.
    fn background_dir(&self) -> &Path;

    fn is_enabled(&self, guild_id: u64) -> bool {
        self.snapshot(guild_id)
            .map(|config| config.enabled)
            .unwrap_or(false)
    }

    fn greeting_template(&self, guild_id: u64) -> Option<String> {
        self.snapshot(guild_id)
            .ok()
            .map(|config| config.greeting_template.clone())
    }

    fn custom_background_path(&self, guild_id: u64) -> Option<PathBuf> {
        let config = self.snapshot(guild_id).ok()?;
        config
            .has_custom_background
            .then(|| custom_background_path(self.background_dir(), guild_id))
    }
}

/// Path of a guild's custom background inside `dir`.
pub fn custom_background_path(dir: &Path, guild_id: u64) -> PathBuf {
    dir.join(format!("{guild_id}.png"))
}

/// In-memory store of guild snapshots.
#[derive(Debug)]
pub struct SnapshotStore {
    background_dir: PathBuf,
    guilds: RwLock<HashMap<u64, Arc<BannerConfig>>>,
}

impl SnapshotStore {
    pub fn new(background_dir: impl Into<PathBuf>) -> Self {
        Self {
            background_dir: background_dir.into(),
            guilds: RwLock::new(HashMap::new()),
        }
    }

    /// Replace (or add) a guild's snapshot.
    pub fn upsert(&self, config: BannerConfig) {
        self.guilds
            .write()
            .insert(config.guild_id, Arc::new(config));
    }

    pub fn remove(&self, guild_id: u64) -> Option<Arc<BannerConfig>> {
        self.guilds.write().remove(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.guilds.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.read().is_empty()
    }
}

impl GuildBannerConfigStore for SnapshotStore {
    fn snapshot(&self, guild_id: u64) -> Result<Arc<BannerConfig>, BannerError> {
        self.guilds
            .read()
            .get(&guild_id)
            .cloned()
            .ok_or(BannerError::ConfigUnavailable { guild_id })
    }

    fn background_dir(&self) -> &Path {
        &self.background_dir
    }
}
