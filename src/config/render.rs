//! Render configuration types.
//!
//! Settings shared by every guild: avatar fetch timeout, where custom
//! backgrounds live, the default template, and the font face.
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::banner::{
    AvatarFetcher, BannerError, BannerRenderer, GuildBannerConfigStore, TextLayoutEngine,
    WelcomeDispatcher, WelcomeSink,
};
use crate::constants::{
    DEFAULT_AVATAR_TIMEOUT_SECS, DEFAULT_BACKGROUND_DIR, DEFAULT_BACKGROUND_PATH,
    DEFAULT_QUEUE_CAPACITY,
};

fn default_avatar_timeout() -> u64 {
    DEFAULT_AVATAR_TIMEOUT_SECS
}

fn default_background_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BACKGROUND_DIR)
}

fn default_background() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_BACKGROUND_PATH))
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

/// Banner rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Avatar download timeout in seconds (default: 20)
    #[serde(default = "default_avatar_timeout")]
    pub avatar_timeout_secs: u64,
    /// Directory holding `<guild_id>.png` custom backgrounds
    #[serde(default = "default_background_dir")]
    pub background_dir: PathBuf,
    /// Template used when a guild has no usable custom background.
    /// Defaults to the bundled transparent template; `null` means an
    /// in-memory transparent canvas.
    #[serde(default = "default_background")]
    pub default_background: Option<PathBuf>,
    /// TTF/OTF face; the embedded face is used when unset
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Where to keep a copy of the last rendered banner
    #[serde(default)]
    pub scratch_path: Option<PathBuf>,
    /// Join events buffered between the dispatch path and render workers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            avatar_timeout_secs: default_avatar_timeout(),
            background_dir: default_background_dir(),
            default_background: default_background(),
            font_path: None,
            scratch_path: None,
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl RenderConfig {
    pub fn avatar_timeout(&self) -> Duration {
        Duration::from_secs(self.avatar_timeout_secs)
    }

    /// Default template to load. A configured file that does not exist
    /// yields `None`, and the resolver uses a transparent canvas instead.
    pub fn default_background_path(&self) -> Option<PathBuf> {
        let path = self.default_background.as_ref()?;
        if path.is_file() {
            Some(path.clone())
        } else {
            warn!(
                path = %path.display(),
                "Default background not found, using a transparent canvas"
            );
            None
        }
    }

    /// Renderer wired with this configuration's font, default template and
    /// avatar timeout.
    pub fn renderer(
        &self,
        store: Arc<dyn GuildBannerConfigStore>,
        fetcher: Arc<dyn AvatarFetcher>,
    ) -> Result<BannerRenderer, BannerError> {
        Ok(BannerRenderer::new(store, fetcher, self.text_engine()?)
            .with_default_background(self.default_background_path())
            .with_avatar_timeout(self.avatar_timeout()))
    }

    /// Start a dispatcher whose queue holds `queue_capacity` join events.
    pub fn start_dispatcher(
        &self,
        renderer: Arc<BannerRenderer>,
        sink: Arc<dyn WelcomeSink>,
    ) -> WelcomeDispatcher {
        WelcomeDispatcher::start(renderer, sink, self.queue_capacity)
    }

    /// Text engine for the configured face.
    pub fn text_engine(&self) -> Result<TextLayoutEngine, BannerError> {
        match &self.font_path {
            Some(path) => TextLayoutEngine::from_file(path),
            None => TextLayoutEngine::embedded(),
        }
    }
}
