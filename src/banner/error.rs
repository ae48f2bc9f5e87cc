//! Banner error types.
//!
//! Every failure in the banner pipeline maps to one of these variants. None of
//! them escape the renderer: they are logged, counted and turned into a
//! caption-only result.

use thiserror::Error;

/// Category of an avatar fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The request did not complete within the configured timeout
    Timeout,
    /// Transport failure or non-2xx response
    Http,
    /// The body was not a decodable image
    Decode,
}

impl FetchErrorKind {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Http => "http",
            Self::Decode => "decode",
        }
    }
}

/// Typed failure returned by an avatar fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("avatar fetch failed ({}): {message}", .kind.as_str())]
pub struct FetchError {
    pub kind: FetchErrorKind,
    /// HTTP status when the server answered with a non-2xx code
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Timeout,
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Http,
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Decode,
            status: None,
            message: message.into(),
        }
    }
}

/// Errors that can occur while producing a welcome banner.
#[derive(Debug, Error)]
pub enum BannerError {
    /// No configuration snapshot exists for the guild
    #[error("banner configuration unavailable for guild {guild_id}")]
    ConfigUnavailable { guild_id: u64 },

    /// Avatar could not be fetched or decoded
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Custom background could not be decoded
    #[error("failed to decode background: {0}")]
    BackgroundDecode(String),

    /// Raster work (resize, mask, font) failed
    #[error("failed to render banner: {0}")]
    Render(String),

    /// PNG encoding failed
    #[error("failed to encode banner: {0}")]
    Encode(String),

    /// Writing an image to disk failed
    #[error("failed to persist image: {0}")]
    Persist(String),

    /// The welcome sink rejected a message
    #[error("failed to deliver welcome message: {0}")]
    Delivery(String),
}

impl BannerError {
    /// Short label for logs and the fallback-reason metric.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ConfigUnavailable { .. } => "config_unavailable",
            Self::Fetch(e) => match e.kind {
                FetchErrorKind::Timeout => "fetch_timeout",
                FetchErrorKind::Http => "fetch_http_error",
                FetchErrorKind::Decode => "fetch_decode_error",
            },
            Self::BackgroundDecode(_) => "background_decode_error",
            Self::Render(_) => "render_error",
            Self::Encode(_) => "encode_error",
            Self::Persist(_) => "persist_error",
            Self::Delivery(_) => "delivery_error",
        }
    }
}
