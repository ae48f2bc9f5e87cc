//! Background resolution and custom background storage.
//!
//! A guild with a custom background gets `<background_dir>/<guild>.png`,
//! fit-cropped around its center to the canvas size. Everyone else, and any
//! guild whose file is missing or unreadable, gets the default template.

use super::canvas::{decode_image, encode_png, fit_crop, CanvasLayer, Centering};
use super::store::{custom_background_path, GuildBannerConfigStore};
use super::BannerError;
use crate::constants::{CANVAS_HEIGHT, CANVAS_WIDTH};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Attachment extensions accepted for custom backgrounds.
const SUPPORTED_BACKGROUND_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Whether a file name carries an accepted background extension.
pub fn is_supported_background_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_BACKGROUND_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Where a resolved background came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSource {
    Custom,
    Default,
}

/// A canvas-sized background plus its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedBackground {
    pub layer: CanvasLayer,
    pub source: BackgroundSource,
    /// A custom background was configured but could not be used
    pub fell_back: bool,
}

/// Resolves the bottom layer of a banner.
#[derive(Clone)]
pub struct BackgroundResolver {
    store: Arc<dyn GuildBannerConfigStore>,
    /// `None` uses a fully transparent canvas
    default_path: Option<PathBuf>,
}

impl std::fmt::Debug for BackgroundResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundResolver")
            .field("background_dir", &self.store.background_dir())
            .field("default_path", &self.default_path)
            .finish()
    }
}

impl BackgroundResolver {
    pub fn new(store: Arc<dyn GuildBannerConfigStore>, default_path: Option<PathBuf>) -> Self {
        Self {
            store,
            default_path,
        }
    }

    /// Background for `guild_id`.
    ///
    /// Custom background failures are logged and replaced by the default. Only
    /// a configured default template that cannot be decoded is an error.
    pub fn resolve(&self, guild_id: u64) -> Result<ResolvedBackground, BannerError> {
        let mut fell_back = false;

        if let Some(path) = self.store.custom_background_path(guild_id) {
            match load_fitted(&path) {
                Ok(layer) => {
                    debug!(guild_id, path = %path.display(), "Using custom background");
                    return Ok(ResolvedBackground {
                        layer,
                        source: BackgroundSource::Custom,
                        fell_back,
                    });
                }
                Err(e) => {
                    warn!(
                        guild_id,
                        path = %path.display(),
                        error = %e,
                        "Custom background unusable, falling back to default"
                    );
                    fell_back = true;
                }
            }
        }

        Ok(ResolvedBackground {
            layer: self.default_layer()?,
            source: BackgroundSource::Default,
            fell_back,
        })
    }

    /// The default template, fitted to the canvas.
    pub fn default_layer(&self) -> Result<CanvasLayer, BannerError> {
        match &self.default_path {
            Some(path) => load_fitted(path),
            None => Ok(CanvasLayer::new(CANVAS_WIDTH, CANVAS_HEIGHT)),
        }
    }

    /// Normalize `data` to a canvas-sized PNG and store it as the guild's
    /// custom background. Readers see either the previous file or the new
    /// one, never a partial write.
    pub fn install_custom_background(
        &self,
        guild_id: u64,
        data: &[u8],
    ) -> Result<PathBuf, BannerError> {
        let image = decode_image(data).map_err(|e| BannerError::BackgroundDecode(e.to_string()))?;
        let fitted = fit_crop(&image, CANVAS_WIDTH, CANVAS_HEIGHT, Centering::CENTER)?;
        let png = encode_png(&fitted)?;

        let dir = self.store.background_dir();
        std::fs::create_dir_all(dir).map_err(|e| {
            BannerError::Persist(format!("failed to create {}: {e}", dir.display()))
        })?;

        let path = custom_background_path(dir, guild_id);
        write_atomic(&path, &png)?;
        debug!(guild_id, path = %path.display(), "Installed custom background");
        Ok(path)
    }

    /// Delete the guild's custom background. Returns whether a file existed.
    pub fn reset_custom_background(&self, guild_id: u64) -> Result<bool, BannerError> {
        let path = custom_background_path(self.store.background_dir(), guild_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BannerError::Persist(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

fn load_fitted(path: &Path) -> Result<CanvasLayer, BannerError> {
    let data = std::fs::read(path).map_err(|e| {
        BannerError::BackgroundDecode(format!("failed to read {}: {e}", path.display()))
    })?;
    let image = decode_image(&data).map_err(|e| {
        BannerError::BackgroundDecode(format!("failed to decode {}: {e}", path.display()))
    })?;
    fit_crop(&image, CANVAS_WIDTH, CANVAS_HEIGHT, Centering::CENTER)
}

/// Write `data` to a temp file beside `path`, then rename it over `path`.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<(), BannerError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| BannerError::Persist(format!("failed to create temp file: {e}")))?;
    file.write_all(data)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| BannerError::Persist(format!("failed to write temp file: {e}")))?;
    file.persist(path).map_err(|e| {
        BannerError::Persist(format!("failed to persist {}: {}", path.display(), e.error))
    })?;
    Ok(())
}
