//! Circular avatar masking and the decorative ring.
//!
//! Circles are drawn hard-edged on a 512×512 supersample canvas and then
//! downsampled with Lanczos3 to their final size; the filter turns the hard
//! edge into a smooth alpha ramp. Drawing the circle directly at 128px leaves
//! a stair-stepped rim, so every circle here goes through the supersample.

use super::canvas::{fit_crop, resize_luma, resize_rgba, Centering};
use super::compositor::{Compositor, Layer, Placement};
use super::BannerError;
use crate::constants::{
    AVATAR_OFFSET, AVATAR_SIZE, MASK_SUPERSAMPLE_SIZE, RING_FILL_ALPHA, RING_GROWTH,
    RING_OFFSET, RING_OUTLINE_ALPHA, RING_OUTLINE_WIDTH, RING_REFERENCE_SIZE,
};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

/// Side of the ring drawn around an avatar of `avatar_size`.
pub fn ring_size(avatar_size: u32) -> u32 {
    avatar_size + RING_GROWTH
}

/// Top-left offset (both axes) of a ring of `ring_size`.
pub fn ring_offset(ring_size: u32) -> i32 {
    (RING_OFFSET + (RING_REFERENCE_SIZE as i64 - ring_size as i64) / 2) as i32
}

/// Top-left offset (both axes) of the avatar inside a ring of `ring_size`.
pub fn avatar_offset(ring_size: u32) -> i32 {
    (AVATAR_OFFSET + (RING_REFERENCE_SIZE as i64 - ring_size as i64) / 2) as i32
}

/// Distance of a pixel center from the center of a `size` square.
fn center_distance(x: u32, y: u32, size: u32) -> f32 {
    let c = size as f32 / 2.0;
    let dx = x as f32 + 0.5 - c;
    let dy = y as f32 + 0.5 - c;
    (dx * dx + dy * dy).sqrt()
}

/// Hard-edged filled circle inscribed in a `size`×`size` square.
fn supersampled_circle(size: u32) -> GrayImage {
    let radius = size as f32 / 2.0;
    GrayImage::from_fn(size, size, |x, y| {
        if center_distance(x, y, size) <= radius {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Where the masked avatar and ring ended up on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarPlacement {
    pub ring_origin: Placement,
    pub ring_size: u32,
    pub avatar_origin: Placement,
    pub avatar_size: u32,
}

impl AvatarPlacement {
    /// Whether `(x, y)` falls inside the ring's bounding square.
    pub fn covers(&self, x: u32, y: u32) -> bool {
        let (x, y) = (x as i32, y as i32);
        let r = self.ring_size as i32;
        x >= self.ring_origin.x
            && y >= self.ring_origin.y
            && x < self.ring_origin.x + r
            && y < self.ring_origin.y + r
    }
}

/// Builds circular masks and composites avatar + ring onto a canvas.
#[derive(Debug, Clone)]
pub struct MaskCompositor {
    avatar_size: u32,
    mask: GrayImage,
}

impl Default for MaskCompositor {
    fn default() -> Self {
        Self::new(AVATAR_SIZE)
    }
}

impl MaskCompositor {
    pub fn new(avatar_size: u32) -> Self {
        Self {
            avatar_size,
            mask: supersampled_circle(MASK_SUPERSAMPLE_SIZE),
        }
    }

    /// The 512×512 supersample mask.
    pub fn supersampled_mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Anti-aliased circle mask of `size`×`size`.
    pub fn mask(&self, size: u32) -> Result<GrayImage, BannerError> {
        resize_luma(&self.mask, size, size)
    }

    /// Force the avatar into an `avatar_size` square (crop anchored top-left)
    /// and cut it into a circle.
    ///
    /// The mask is multiplied into the avatar's existing alpha rather than
    /// replacing it, so transparent avatar pixels stay transparent inside
    /// the circle.
    pub fn clip_avatar(&self, avatar: &DynamicImage) -> Result<RgbaImage, BannerError> {
        let mut square = fit_crop(avatar, self.avatar_size, self.avatar_size, Centering::TOP_LEFT)?;
        let mask = self.mask(self.avatar_size)?;
        apply_mask(&mut square, &mask);
        Ok(square)
    }

    /// Translucent white disc with a brighter rim, `avatar_size + 8` wide.
    pub fn ring(&self) -> Result<RgbaImage, BannerError> {
        let size = MASK_SUPERSAMPLE_SIZE;
        let radius = size as f32 / 2.0;
        // Transparent pixels stay white so the filter doesn't pull in black.
        let disc = RgbaImage::from_fn(size, size, |x, y| {
            let d = center_distance(x, y, size);
            if d > radius {
                Rgba([255, 255, 255, 0])
            } else if d > radius - RING_OUTLINE_WIDTH {
                Rgba([255, 255, 255, RING_OUTLINE_ALPHA])
            } else {
                Rgba([255, 255, 255, RING_FILL_ALPHA])
            }
        });

        let target = ring_size(self.avatar_size);
        let mut ring = resize_rgba(&disc, target, target)?;
        let mask = self.mask(target)?;
        apply_mask(&mut ring, &mask);
        Ok(ring)
    }

    /// Composite ring then avatar onto `canvas` at the fixed offsets.
    pub fn composite(
        &self,
        canvas: &mut RgbaImage,
        avatar: &DynamicImage,
    ) -> Result<AvatarPlacement, BannerError> {
        let ring = self.ring()?;
        let clipped = self.clip_avatar(avatar)?;

        let size = ring.width();
        let placement = AvatarPlacement {
            ring_origin: Placement::new(ring_offset(size), ring_offset(size)),
            ring_size: size,
            avatar_origin: Placement::new(avatar_offset(size), avatar_offset(size)),
            avatar_size: clipped.width(),
        };

        let mut stack = Compositor::new();
        stack.add_layer(Layer::new(ring, placement.ring_origin));
        stack.add_layer(Layer::new(clipped, placement.avatar_origin));
        stack.apply(canvas);

        Ok(placement)
    }
}

/// Multiply each pixel's alpha by the mask value.
fn apply_mask(image: &mut RgbaImage, mask: &GrayImage) {
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let m = mask.get_pixel(x, y)[0] as u16;
        pixel[3] = ((pixel[3] as u16 * m + 127) / 255) as u8;
    }
}
