// Constants module - centralized geometry and default values
//
// Banner geometry is fixed: every render produces the same canvas size with
// the avatar, ring and text anchored at the same offsets. Configuration
// defaults live here too so the config layer and the renderer agree.

// =============================================================================
// Canvas geometry
// =============================================================================

/// Output banner width in pixels
pub const CANVAS_WIDTH: u32 = 500;

/// Output banner height in pixels
pub const CANVAS_HEIGHT: u32 = 150;

/// Side length of the supersampled mask used for circle anti-aliasing
pub const MASK_SUPERSAMPLE_SIZE: u32 = 512;

/// Side length of the avatar square before masking
pub const AVATAR_SIZE: u32 = 128;

/// Extra diameter of the decorative ring around the avatar
pub const RING_GROWTH: u32 = 8;

/// Nominal ring side used to derive the placement offsets
pub const RING_REFERENCE_SIZE: u32 = 136;

/// Top-left offset of the ring when it has the reference size
pub const RING_OFFSET: i64 = 7;

/// Top-left offset of the avatar when the ring has the reference size
pub const AVATAR_OFFSET: i64 = 11;

/// Ring fill alpha (~70% white)
pub const RING_FILL_ALPHA: u8 = 180;

/// Ring outline alpha
pub const RING_OUTLINE_ALPHA: u8 = 250;

/// Ring outline width at supersample resolution (~1px after downsampling)
pub const RING_OUTLINE_WIDTH: f32 = 4.0;

// =============================================================================
// Text layout
// =============================================================================

/// Heading text drawn on every banner
pub const HEADING_TEXT: &str = "Welcome";

/// Heading font size in pixels
pub const HEADING_FONT_SIZE: f32 = 50.0;

/// Heading origin (top-left of the glyph run)
pub const HEADING_ORIGIN: (i32, i32) = (150, 16);

/// Server line font size in pixels
pub const SERVER_LINE_FONT_SIZE: f32 = 22.0;

/// Server line origin (top-left of the first line)
pub const SERVER_LINE_ORIGIN: (i32, i32) = (152, 100);

/// Soft wrap width for the server line, in characters
pub const SERVER_LINE_WRAP_WIDTH: usize = 25;

/// Extra vertical spacing between wrapped lines in pixels
pub const LINE_SPACING: f32 = 4.0;

/// Alpha of the text fill drawn over the outline
pub const TEXT_FILL_ALPHA: u8 = 230;

/// Outline displacement in pixels
pub const OUTLINE_DISPLACEMENT: i32 = 1;

// =============================================================================
// Avatar fetch defaults
// =============================================================================

/// Default avatar fetch timeout in seconds
pub const DEFAULT_AVATAR_TIMEOUT_SECS: u64 = 20;

/// Upper bound accepted for the avatar fetch timeout in seconds
pub const MAX_AVATAR_TIMEOUT_SECS: u64 = 120;

/// Maximum accepted avatar body size (8 MB)
pub const MAX_AVATAR_BYTES: usize = 8 * 1024 * 1024;

// =============================================================================
// Filesystem defaults
// =============================================================================

/// Default directory holding per-guild custom backgrounds
pub const DEFAULT_BACKGROUND_DIR: &str = "data/imgwelcome";

/// Default bundled transparent template
pub const DEFAULT_BACKGROUND_PATH: &str = "assets/imgwelcome/transparent.png";

// =============================================================================
// Dispatcher defaults
// =============================================================================

/// Default capacity of the join-event queue between dispatcher and workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

// =============================================================================
// Metrics
// =============================================================================

/// Render-duration samples kept for percentile export (oldest evicted first)
pub const MAX_RENDER_DURATION_SAMPLES: usize = 1024;
