//! Layer compositor for the banner canvas.
//!
//! Layers are blended onto the background with the Porter-Duff "over"
//! operator in the order they were added, which fixes the banner's z-order:
//! background, ring, avatar, then text.

use image::{Rgba, RgbaImage};

/// Top-left placement of a layer on the canvas. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

impl Placement {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An RGBA layer placed on the canvas.
#[derive(Clone)]
pub struct Layer {
    pub image: RgbaImage,
    pub position: Placement,
}

impl Layer {
    pub fn new(image: RgbaImage, position: Placement) -> Self {
        Self { image, position }
    }

    /// Blend onto `target`, skipping the parts that fall outside it.
    fn blend_onto(&self, target: &mut RgbaImage) {
        let Placement { x: left, y: top } = self.position;
        let x_range = left.max(0)..(left + self.image.width() as i32).min(target.width() as i32);
        let y_range = top.max(0)..(top + self.image.height() as i32).min(target.height() as i32);

        for ty in y_range {
            for tx in x_range.clone() {
                let fg = *self.image.get_pixel((tx - left) as u32, (ty - top) as u32);
                if fg[3] == 0 {
                    continue;
                }
                let pixel = target.get_pixel_mut(tx as u32, ty as u32);
                *pixel = blend_pixels(*pixel, fg);
            }
        }
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("dimensions", &self.image.dimensions())
            .field("position", &self.position)
            .finish()
    }
}

/// Ordered stack of layers.
#[derive(Debug, Default)]
pub struct Compositor {
    layers: Vec<Layer>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Blend every layer onto `target`, first added at the bottom.
    pub fn apply(&self, target: &mut RgbaImage) {
        for layer in &self.layers {
            layer.blend_onto(target);
        }
    }
}

/// Porter-Duff "over" of `foreground` onto `background`.
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_weight = background[3] as f32 / 255.0 * (1.0 - fg_alpha);
    let out_alpha = fg_alpha + bg_weight;

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for channel in 0..3 {
        let value =
            (foreground[channel] as f32 * fg_alpha + background[channel] as f32 * bg_weight) / out_alpha;
        out[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round() as u8;
    Rgba(out)
}
