//! Join-event → welcome message pipeline.
//!
//! `BannerRenderer::render` walks a fixed sequence of stages:
//!
//! ```text
//! snapshot ─┬─ disabled ─────────────────────────────────────► Text
//!           └─ enabled ─► ResolveBackground ─► FetchAvatar ─► Composite
//!                         ─► LayoutText ─► Encode ───────────► Image
//!                    (any stage error) ──────────────────────► Text
//! ```
//!
//! Filesystem and raster work run on the blocking pool; only the avatar
//! download is awaited on the async worker. A render never returns a partial
//! image: either every stage succeeds or the result is caption-only.

use super::avatar::AvatarFetcher;
use super::background::{write_atomic, BackgroundResolver};
use super::canvas::{encode_png, CanvasLayer};
use super::mask::{AvatarPlacement, MaskCompositor};
use super::store::GuildBannerConfigStore;
use super::template::caption_for;
use super::text::{PixelRect, TextLayout, TextLayoutEngine};
use super::BannerError;
use crate::constants::DEFAULT_AVATAR_TIMEOUT_SECS;
use crate::metrics::BannerMetrics;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A "member joined" notification from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberJoinEvent {
    pub guild_id: u64,
    pub member_id: u64,
    pub avatar_url: String,
    pub username: String,
    pub discriminator: String,
    pub guild_name: String,
    pub joined_at: DateTime<Utc>,
}

impl MemberJoinEvent {
    pub fn new(
        guild_id: u64,
        member_id: u64,
        avatar_url: impl Into<String>,
        username: impl Into<String>,
        discriminator: impl Into<String>,
        guild_name: impl Into<String>,
    ) -> Self {
        Self {
            guild_id,
            member_id,
            avatar_url: avatar_url.into(),
            username: username.into(),
            discriminator: discriminator.into(),
            guild_name: guild_name.into(),
            joined_at: Utc::now(),
        }
    }
}

/// What gets delivered for a join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerOutput {
    /// Encoded 500×150 PNG plus caption
    Image { png: Vec<u8>, caption: String },
    /// Caption only
    Text { caption: String },
}

impl BannerOutput {
    pub fn caption(&self) -> &str {
        match self {
            Self::Image { caption, .. } | Self::Text { caption } => caption,
        }
    }

    pub fn image(&self) -> Option<&[u8]> {
        match self {
            Self::Image { png, .. } => Some(png),
            Self::Text { .. } => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }

    /// Atomically write the PNG to `path`. Returns `false` for caption-only
    /// output, which has nothing to write.
    pub fn persist(&self, path: &Path) -> Result<bool, BannerError> {
        match self.image() {
            Some(png) => write_atomic(path, png).map(|_| true),
            None => Ok(false),
        }
    }
}

/// Pipeline stages of an enabled render, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    ResolveBackground,
    FetchAvatar,
    Composite,
    LayoutText,
    Encode,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveBackground => "resolve_background",
            Self::FetchAvatar => "fetch_avatar",
            Self::Composite => "composite",
            Self::LayoutText => "layout_text",
            Self::Encode => "encode",
        }
    }
}

/// Terminal state of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Banners are off (or the guild is unknown); no image work was done
    Disabled,
    Success,
    Failure {
        stage: RenderStage,
        reason: &'static str,
    },
}

/// Render result addressed to the guild's welcome channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeMessage {
    pub guild_id: u64,
    pub member_id: u64,
    /// `None` when the guild has no welcome channel configured
    pub channel_id: Option<u64>,
    pub output: BannerOutput,
    pub outcome: RenderOutcome,
}

/// A composited canvas and where its foreground layers landed.
#[derive(Debug, Clone)]
pub struct ComposedBanner {
    pub canvas: CanvasLayer,
    pub avatar: AvatarPlacement,
    pub text_regions: Vec<PixelRect>,
}

impl ComposedBanner {
    /// Whether `(x, y)` shows only the background layer.
    pub fn is_background_pixel(&self, x: u32, y: u32) -> bool {
        !self.avatar.covers(x, y) && !self.text_regions.iter().any(|r| r.contains(x, y))
    }
}

/// Produces welcome messages for join events.
#[derive(Clone)]
pub struct BannerRenderer {
    store: Arc<dyn GuildBannerConfigStore>,
    fetcher: Arc<dyn AvatarFetcher>,
    resolver: BackgroundResolver,
    masks: Arc<MaskCompositor>,
    text: TextLayoutEngine,
    metrics: Arc<BannerMetrics>,
    avatar_timeout: Duration,
}

impl std::fmt::Debug for BannerRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BannerRenderer")
            .field("resolver", &self.resolver)
            .field("text", &self.text)
            .field("avatar_timeout", &self.avatar_timeout)
            .finish()
    }
}

impl BannerRenderer {
    pub fn new(
        store: Arc<dyn GuildBannerConfigStore>,
        fetcher: Arc<dyn AvatarFetcher>,
        text: TextLayoutEngine,
    ) -> Self {
        Self {
            resolver: BackgroundResolver::new(store.clone(), None),
            store,
            fetcher,
            masks: Arc::new(MaskCompositor::default()),
            text,
            metrics: Arc::new(BannerMetrics::new()),
            avatar_timeout: Duration::from_secs(DEFAULT_AVATAR_TIMEOUT_SECS),
        }
    }

    /// Use the template at `path` instead of a transparent canvas.
    pub fn with_default_background(mut self, path: Option<PathBuf>) -> Self {
        self.resolver = BackgroundResolver::new(self.store.clone(), path);
        self
    }

    pub fn with_avatar_timeout(mut self, timeout: Duration) -> Self {
        self.avatar_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<BannerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<BannerMetrics> {
        &self.metrics
    }

    pub fn resolver(&self) -> &BackgroundResolver {
        &self.resolver
    }

    pub fn avatar_timeout(&self) -> Duration {
        self.avatar_timeout
    }

    /// Render on a fresh task so the caller never waits on I/O or rasterizing.
    pub fn spawn_render(self: &Arc<Self>, event: MemberJoinEvent) -> JoinHandle<WelcomeMessage> {
        let renderer = Arc::clone(self);
        tokio::spawn(async move { renderer.render(&event).await })
    }

    /// Produce the welcome message for one join. Never fails: every error
    /// degrades to a caption-only message.
    pub async fn render(&self, event: &MemberJoinEvent) -> WelcomeMessage {
        self.metrics.increment_join_events();
        let started = Instant::now();

        // One snapshot per render; later config updates don't affect it.
        let snapshot = match self.store.snapshot(event.guild_id) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!(
                    guild_id = event.guild_id,
                    reason = e.reason(),
                    "Treating guild as disabled"
                );
                None
            }
        };

        let caption = caption_for(
            snapshot.as_deref().map(|s| s.greeting_template.as_str()),
            event.member_id,
            &event.username,
            &event.guild_name,
        );
        let channel_id = snapshot.as_deref().and_then(|s| s.welcome_channel_id);
        let message = |output, outcome| WelcomeMessage {
            guild_id: event.guild_id,
            member_id: event.member_id,
            channel_id,
            output,
            outcome,
        };

        if !snapshot.as_deref().map(|s| s.enabled).unwrap_or(false) {
            self.metrics.increment_text_only();
            return message(BannerOutput::Text { caption }, RenderOutcome::Disabled);
        }

        match self.render_image(event).await {
            Ok(png) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.metrics.increment_rendered();
                self.metrics.record_render_duration(elapsed_ms);
                info!(
                    guild_id = event.guild_id,
                    member_id = event.member_id,
                    bytes = png.len(),
                    elapsed_ms,
                    join_age_ms = (Utc::now() - event.joined_at).num_milliseconds(),
                    "Welcome banner rendered"
                );
                message(BannerOutput::Image { png, caption }, RenderOutcome::Success)
            }
            Err((stage, error)) => {
                warn!(
                    guild_id = event.guild_id,
                    member_id = event.member_id,
                    stage = stage.as_str(),
                    reason = error.reason(),
                    error = %error,
                    "Welcome banner failed, sending caption only"
                );
                self.metrics.increment_fallback(error.reason());
                if let BannerError::Fetch(fetch) = &error {
                    self.metrics.increment_fetch_failure(fetch.kind.as_str());
                }
                message(
                    BannerOutput::Text { caption },
                    RenderOutcome::Failure {
                        stage,
                        reason: error.reason(),
                    },
                )
            }
        }
    }

    async fn render_image(
        &self,
        event: &MemberJoinEvent,
    ) -> Result<Vec<u8>, (RenderStage, BannerError)> {
        let resolver = self.resolver.clone();
        let guild_id = event.guild_id;
        let background = tokio::task::spawn_blocking(move || resolver.resolve(guild_id))
            .await
            .map_err(|e| worker_failed(RenderStage::ResolveBackground, e))?
            .map_err(|e| (RenderStage::ResolveBackground, e))?;
        if background.fell_back {
            self.metrics.increment_background_fallback();
        }

        let avatar = self
            .fetcher
            .fetch(&event.avatar_url, self.avatar_timeout)
            .await
            .map_err(|e| (RenderStage::FetchAvatar, BannerError::from(e)))?;

        let renderer = self.clone();
        let layout = TextLayout::new(&event.username, &event.discriminator, &event.guild_name);
        tokio::task::spawn_blocking(move || {
            let composed = renderer
                .compose(background.layer, &avatar.image, &layout)
                .map_err(|e| (RenderStage::Composite, e))?;
            encode_png(&composed.canvas).map_err(|e| (RenderStage::Encode, e))
        })
        .await
        .map_err(|e| worker_failed(RenderStage::Composite, e))?
    }

    /// Layer ring, avatar and text over `background`.
    pub fn compose(
        &self,
        background: CanvasLayer,
        avatar: &DynamicImage,
        layout: &TextLayout,
    ) -> Result<ComposedBanner, BannerError> {
        let mut canvas = background;
        let placement = self.masks.composite(&mut canvas, avatar)?;
        let text_regions = self.text.draw(&mut canvas, layout);

        Ok(ComposedBanner {
            canvas,
            avatar: placement,
            text_regions,
        })
    }
}

fn worker_failed(stage: RenderStage, error: tokio::task::JoinError) -> (RenderStage, BannerError) {
    (stage, BannerError::Render(format!("render worker failed: {error}")))
}
