//! Per-guild welcome configuration.

use serde::{Deserialize, Serialize};

use crate::banner::BannerConfig;

/// Welcome settings for one guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: u64,
    /// Render image banners (default: false, caption only)
    #[serde(default)]
    pub enabled: bool,
    /// `<background_dir>/<guild_id>.png` has been uploaded
    #[serde(default)]
    pub has_custom_background: bool,
    /// Greeting with `user` and `server` tokens
    #[serde(default)]
    pub greeting_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_channel_id: Option<u64>,
}

impl GuildConfig {
    /// Snapshot consumed by the banner renderer
    pub fn to_banner_config(&self) -> BannerConfig {
        BannerConfig {
            guild_id: self.guild_id,
            enabled: self.enabled,
            has_custom_background: self.has_custom_background,
            greeting_template: self.greeting_template.clone(),
            welcome_channel_id: self.welcome_channel_id,
        }
    }
}
