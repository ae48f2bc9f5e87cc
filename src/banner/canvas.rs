//! Raster helpers shared by the banner stages.
//!
//! Decode → fit-crop → resize → encode. Resizing goes through
//! `fast_image_resize` with a Lanczos3 filter, which is also what gives the
//! supersampled masks their anti-aliased edges when they are scaled down.

use super::BannerError;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GrayImage, RgbaImage};
use std::io::Cursor;
use std::num::NonZeroU32;

/// An RGBA layer with explicit dimensions.
pub type CanvasLayer = RgbaImage;

/// Relative anchor of a fit-crop window: `(0.0, 0.0)` keeps the top-left
/// region, `(0.5, 0.5)` keeps the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centering {
    pub x: f32,
    pub y: f32,
}

impl Centering {
    pub const CENTER: Centering = Centering { x: 0.5, y: 0.5 };
    pub const TOP_LEFT: Centering = Centering { x: 0.0, y: 0.0 };
}

/// Crop window `(left, top, width, height)` for fitting `src` into the
/// aspect ratio of `dst`. `None` when any dimension is zero.
pub(crate) fn fit_crop_window(
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    centering: Centering,
) -> Option<(u32, u32, u32, u32)> {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return None;
    }

    let src_ratio = src_w as f64 / src_h as f64;
    let dst_ratio = dst_w as f64 / dst_h as f64;

    let (crop_w, crop_h) = if src_ratio > dst_ratio {
        // Source is wider: keep full height, trim width
        let w = (src_h as f64 * dst_ratio).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller (or equal): keep full width, trim height
        let h = (src_w as f64 / dst_ratio).round() as u32;
        (src_w, h.clamp(1, src_h))
    };

    let cx = centering.x.clamp(0.0, 1.0) as f64;
    let cy = centering.y.clamp(0.0, 1.0) as f64;
    let left = ((src_w - crop_w) as f64 * cx).round() as u32;
    let top = ((src_h - crop_h) as f64 * cy).round() as u32;

    Some((left, top, crop_w, crop_h))
}

/// Resize-and-crop `img` to exactly `width`×`height`, preserving aspect
/// ratio and anchoring the crop at `centering`.
pub fn fit_crop(
    img: &DynamicImage,
    width: u32,
    height: u32,
    centering: Centering,
) -> Result<RgbaImage, BannerError> {
    let (left, top, crop_w, crop_h) =
        fit_crop_window(img.width(), img.height(), width, height, centering).ok_or_else(|| {
            BannerError::Render(format!(
                "cannot fit {}x{} into {}x{}",
                img.width(),
                img.height(),
                width,
                height
            ))
        })?;
    let cropped = img.crop_imm(left, top, crop_w, crop_h).to_rgba8();

    if cropped.width() == width && cropped.height() == height {
        return Ok(cropped);
    }
    resize_rgba(&cropped, width, height)
}

fn non_zero(value: u32, what: &str) -> Result<NonZeroU32, BannerError> {
    NonZeroU32::new(value).ok_or_else(|| BannerError::Render(format!("{what} is 0")))
}

/// Resize an RGBA image with Lanczos3.
pub fn resize_rgba(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, BannerError> {
    let src_image = Image::from_vec_u8(
        non_zero(img.width(), "Source width")?,
        non_zero(img.height(), "Source height")?,
        img.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| BannerError::Render(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(
        non_zero(width, "Target width")?,
        non_zero(height, "Target height")?,
        PixelType::U8x4,
    );

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| BannerError::Render(format!("Resize operation failed: {:?}", e)))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| BannerError::Render("Failed to create output image buffer".to_string()))
}

/// Resize a single-channel mask with Lanczos3.
pub fn resize_luma(img: &GrayImage, width: u32, height: u32) -> Result<GrayImage, BannerError> {
    let src_image = Image::from_vec_u8(
        non_zero(img.width(), "Mask width")?,
        non_zero(img.height(), "Mask height")?,
        img.as_raw().clone(),
        PixelType::U8,
    )
    .map_err(|e| BannerError::Render(format!("Failed to create mask image: {:?}", e)))?;

    let mut dst_image = Image::new(
        non_zero(width, "Target width")?,
        non_zero(height, "Target height")?,
        PixelType::U8,
    );

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| BannerError::Render(format!("Mask resize failed: {:?}", e)))?;

    GrayImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| BannerError::Render("Failed to create mask buffer".to_string()))
}

/// Decode image bytes, guessing the format from the content.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, image::ImageError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()
}

/// Encode an RGBA canvas as PNG.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, BannerError> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder as _;

    let mut output = Cursor::new(Vec::new());
    PngEncoder::new(&mut output)
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| BannerError::Encode(e.to_string()))?;

    Ok(output.into_inner())
}
