//! Welcome banner compositor.
//!
//! On a member join the renderer builds a 500×150 PNG: the guild's background,
//! a translucent ring, the member's avatar cut into an anti-aliased circle,
//! and outlined "Welcome / name#0001 / Welcome to <guild>!" text. Any failure
//! degrades to a caption-only greeting.
//!
//! # Layer order
//!
//! background → ring → avatar → text
//!
//! # Configuration Example
//!
//! ```yaml
//! render:
//!   avatar_timeout_secs: 20
//!   background_dir: "data/imgwelcome"
//! guilds:
//!   - guild_id: 1
//!     enabled: true
//!     greeting_template: "Welcome user to server!"
//!     welcome_channel_id: 42
//! ```

pub mod avatar;
pub mod background;
pub mod canvas;
pub mod compositor;
pub mod dispatcher;
pub mod error;
pub mod mask;
pub mod renderer;
pub mod store;
pub mod template;
pub mod text;

// Re-export main types for convenience
pub use avatar::{AvatarFetcher, AvatarImage, HttpAvatarFetcher};
pub use background::{
    is_supported_background_extension, BackgroundResolver, BackgroundSource, ResolvedBackground,
};
pub use canvas::{decode_image, encode_png, fit_crop, CanvasLayer, Centering};
pub use compositor::{blend_pixels, Compositor, Layer, Placement};
pub use dispatcher::{DispatchError, WelcomeDispatcher, WelcomeSink};
pub use error::{BannerError, FetchError, FetchErrorKind};
pub use mask::{AvatarPlacement, MaskCompositor};
pub use renderer::{
    BannerOutput, BannerRenderer, ComposedBanner, MemberJoinEvent, RenderOutcome, RenderStage,
    WelcomeMessage,
};
pub use store::{BannerConfig, GuildBannerConfigStore, SnapshotStore};
pub use template::{caption_for, default_greeting, mention, render_greeting};
pub use text::{select_tier, wrap_text, FontTier, PixelRect, TextLayout, TextLayoutEngine};
