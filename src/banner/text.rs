//! Banner text layout and outlined glyph drawing.
//!
//! Three text elements are drawn on every banner: the "Welcome" heading, the
//! `name#discriminator` key in a size picked from [`FONT_TIERS`], and the
//! wrapped "Welcome to <guild>!" line. Each element gets a 1px black outline
//! (the run drawn at the four axis-aligned 1px offsets) under a near-opaque
//! white fill.
//!
//! Glyphs are rasterized with `ab_glyph`. The default face is embedded in the
//! binary; a different TTF/OTF can be loaded from disk.

use super::compositor::blend_pixels;
use super::BannerError;
use crate::constants::{
    HEADING_FONT_SIZE, HEADING_ORIGIN, HEADING_TEXT, LINE_SPACING, OUTLINE_DISPLACEMENT,
    SERVER_LINE_FONT_SIZE, SERVER_LINE_ORIGIN, SERVER_LINE_WRAP_WIDTH, TEXT_FILL_ALPHA,
};
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Embedded default face (DejaVu Sans Bold).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// One row of the username font table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontTier {
    /// Longest username key (in characters) this tier accepts
    pub max_name_length: usize,
    pub font_size: f32,
    pub origin: (i32, i32),
}

/// Username tiers, ordered by `max_name_length`. The last row is open-ended.
pub static FONT_TIERS: [FontTier; 4] = [
    FontTier {
        max_name_length: 17,
        font_size: 30.0,
        origin: (152, 63),
    },
    FontTier {
        max_name_length: 23,
        font_size: 22.0,
        origin: (152, 66),
    },
    FontTier {
        max_name_length: 32,
        font_size: 18.0,
        origin: (152, 70),
    },
    FontTier {
        max_name_length: usize::MAX,
        font_size: 12.0,
        origin: (152, 73),
    },
];

/// Tier for a username key of `length` characters.
pub fn select_tier(length: usize) -> &'static FontTier {
    FONT_TIERS
        .iter()
        .find(|tier| length <= tier.max_name_length)
        .unwrap_or(&FONT_TIERS[FONT_TIERS.len() - 1])
}

/// `name#discriminator`
pub fn username_key(name: &str, discriminator: &str) -> String {
    format!("{name}#{discriminator}")
}

fn is_wrap_space(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0b' | '\x0c' | '\r' | ' ')
}

fn is_letter(word: &[char], i: usize) -> bool {
    word.get(i).map_or(false, |&c| c.is_alphabetic() || c == '_')
}

/// Split a word after each hyphen joining two letter runs, so that
/// `Super-Duper` can wrap as `Super-` / `Duper`.
fn hyphen_chunks(mut word: Vec<char>) -> Vec<Vec<char>> {
    let breaks: Vec<usize> = (0..word.len())
        .filter(|&i| word[i] == '-')
        .filter(|&i| {
            let before = (i >= 2 && is_letter(&word, i - 2) && is_letter(&word, i - 1))
                || (i >= 3
                    && is_letter(&word, i - 3)
                    && word[i - 2] == '-'
                    && is_letter(&word, i - 1));
            let after = is_letter(&word, i + 1)
                && (is_letter(&word, i + 2)
                    || (word.get(i + 2) == Some(&'-') && is_letter(&word, i + 3)));
            before && after
        })
        .map(|i| i + 1)
        .collect();

    let mut chunks = Vec::with_capacity(breaks.len() + 1);
    for at in breaks.into_iter().rev() {
        chunks.push(word.split_off(at));
    }
    chunks.push(word);
    chunks.reverse();
    chunks
}

fn push_run(chunks: &mut Vec<Vec<char>>, run: Vec<char>, space: bool) {
    if space {
        chunks.push(run);
    } else {
        chunks.extend(hyphen_chunks(run));
    }
}

/// Whitespace runs (as spaces) and hyphen-split words, in order.
fn split_chunks(text: &str) -> Vec<Vec<char>> {
    let mut chunks = Vec::new();
    let mut run = Vec::new();
    let mut in_space = false;

    for c in text.chars() {
        let space = is_wrap_space(c);
        if space != in_space && !run.is_empty() {
            push_run(&mut chunks, std::mem::take(&mut run), in_space);
        }
        in_space = space;
        run.push(if space { ' ' } else { c });
    }
    if !run.is_empty() {
        push_run(&mut chunks, run, in_space);
    }
    chunks
}

fn is_space_chunk(chunk: &[char]) -> bool {
    chunk.iter().all(|&c| c == ' ')
}

/// Where to cut an over-long chunk given `space_left` columns: after the
/// last hyphen that fits, otherwise at the column limit.
fn long_chunk_break(chunk: &[char], space_left: usize) -> usize {
    let head = &chunk[..space_left.min(chunk.len())];
    match head.iter().rposition(|&c| c == '-') {
        Some(hyphen) if hyphen > 0 && chunk[..hyphen].iter().any(|&c| c != '-') => hyphen + 1,
        _ => space_left,
    }
}

/// Greedy word wrap at `width` characters, breaking after hyphens inside
/// words. Chunks longer than `width` are split, filling the rest of the
/// current line first. Whitespace at line ends is dropped, as is whitespace
/// starting any line but the first.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = split_chunks(text);
    chunks.reverse();
    let mut lines: Vec<String> = Vec::new();

    while !chunks.is_empty() {
        let mut line: Vec<Vec<char>> = Vec::new();
        let mut line_len = 0usize;

        if !lines.is_empty() && chunks.last().map_or(false, |c| is_space_chunk(c)) {
            chunks.pop();
        }

        while let Some(chunk) = chunks.last() {
            if line_len + chunk.len() > width {
                break;
            }
            line_len += chunk.len();
            line.extend(chunks.pop());
        }

        if let Some(chunk) = chunks.last_mut() {
            if chunk.len() > width {
                let end = long_chunk_break(chunk, width - line_len);
                let rest = chunk.split_off(end);
                line.push(std::mem::replace(chunk, rest));
            }
        }

        if line.last().map_or(false, |c| is_space_chunk(c)) {
            line.pop();
        }
        if !line.is_empty() {
            lines.push(line.concat().into_iter().collect());
        }
    }
    lines
}

/// A block of text lines drawn at one size from one origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub lines: Vec<String>,
    pub font_size: f32,
    /// Top-left of the first line
    pub origin: (i32, i32),
}

impl TextElement {
    pub fn single(text: impl Into<String>, font_size: f32, origin: (i32, i32)) -> Self {
        Self {
            lines: vec![text.into()],
            font_size,
            origin,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// The three text elements of a banner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub heading: TextElement,
    pub name: TextElement,
    pub server_line: TextElement,
    pub tier: &'static FontTier,
}

impl TextLayout {
    pub fn new(name: &str, discriminator: &str, guild_name: &str) -> Self {
        let key = username_key(name, discriminator);
        let tier = select_tier(key.chars().count());
        let server_text = format!("Welcome to {guild_name}!");

        Self {
            heading: TextElement::single(HEADING_TEXT, HEADING_FONT_SIZE, HEADING_ORIGIN),
            name: TextElement::single(key, tier.font_size, tier.origin),
            server_line: TextElement {
                lines: wrap_text(&server_text, SERVER_LINE_WRAP_WIDTH),
                font_size: SERVER_LINE_FONT_SIZE,
                origin: SERVER_LINE_ORIGIN,
            },
            tier,
        }
    }

    /// Elements in draw order.
    pub fn elements(&self) -> [&TextElement; 3] {
        [&self.heading, &self.name, &self.server_line]
    }
}

/// Pixel rectangle, `x0..x1` × `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    fn include(rect: Option<PixelRect>, x: u32, y: u32) -> PixelRect {
        match rect {
            None => PixelRect {
                x0: x,
                y0: y,
                x1: x + 1,
                y1: y + 1,
            },
            Some(r) => PixelRect {
                x0: r.x0.min(x),
                y0: r.y0.min(y),
                x1: r.x1.max(x + 1),
                y1: r.y1.max(y + 1),
            },
        }
    }

    fn union(a: Option<PixelRect>, b: Option<PixelRect>) -> Option<PixelRect> {
        match (a, b) {
            (None, r) | (r, None) => r,
            (Some(a), Some(b)) => Some(PixelRect {
                x0: a.x0.min(b.x0),
                y0: a.y0.min(b.y0),
                x1: a.x1.max(b.x1),
                y1: a.y1.max(b.y1),
            }),
        }
    }
}

const OUTLINE_OFFSETS: [(i32, i32); 4] = [
    (-OUTLINE_DISPLACEMENT, 0),
    (OUTLINE_DISPLACEMENT, 0),
    (0, -OUTLINE_DISPLACEMENT),
    (0, OUTLINE_DISPLACEMENT),
];

/// Draws [`TextLayout`]s onto a canvas with a single font face.
#[derive(Clone)]
pub struct TextLayoutEngine {
    font: FontArc,
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl TextLayoutEngine {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Engine using the embedded face.
    pub fn embedded() -> Result<Self, BannerError> {
        let font = FontArc::try_from_slice(EMBEDDED_FONT_DATA)
            .map_err(|e| BannerError::Render(format!("embedded font is invalid: {e}")))?;
        Ok(Self::new(font))
    }

    /// Engine using a TTF/OTF file.
    pub fn from_file(path: &Path) -> Result<Self, BannerError> {
        let data = std::fs::read(path).map_err(|e| {
            BannerError::Render(format!("failed to read font {}: {e}", path.display()))
        })?;
        let font = FontArc::try_from_vec(data).map_err(|e| {
            BannerError::Render(format!("invalid font {}: {e}", path.display()))
        })?;
        Ok(Self::new(font))
    }

    /// Width and height in pixels of a single line.
    pub fn measure(&self, text: &str, font_size: f32) -> (u32, u32) {
        let scaled = self.font.as_scaled(PxScale::from(font_size));

        let mut width = 0.0f32;
        let mut prev: Option<ab_glyph::GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }

        (width.ceil() as u32, scaled.height().ceil() as u32)
    }

    /// Draw every element of `layout`, returning the touched regions.
    pub fn draw(&self, canvas: &mut RgbaImage, layout: &TextLayout) -> Vec<PixelRect> {
        layout
            .elements()
            .into_iter()
            .filter_map(|element| self.draw_outlined(canvas, element))
            .collect()
    }

    /// Black outline at the four 1px offsets, then the white fill at the origin.
    pub fn draw_outlined(&self, canvas: &mut RgbaImage, element: &TextElement) -> Option<PixelRect> {
        let (ox, oy) = element.origin;
        let mut region = None;

        for (dx, dy) in OUTLINE_OFFSETS {
            let touched = self.draw_run(
                canvas,
                element,
                (ox + dx, oy + dy),
                Rgba([0, 0, 0, 255]),
            );
            region = PixelRect::union(region, touched);
        }

        let touched = self.draw_run(
            canvas,
            element,
            (ox, oy),
            Rgba([255, 255, 255, TEXT_FILL_ALPHA]),
        );
        PixelRect::union(region, touched)
    }

    /// Rasterize the element's lines at `origin` in `color`.
    fn draw_run(
        &self,
        canvas: &mut RgbaImage,
        element: &TextElement,
        origin: (i32, i32),
        color: Rgba<u8>,
    ) -> Option<PixelRect> {
        let scale = PxScale::from(element.font_size);
        let scaled = self.font.as_scaled(scale);
        let line_height = scaled.height() + LINE_SPACING;
        let (canvas_w, canvas_h) = (canvas.width() as i32, canvas.height() as i32);
        let mut region = None;

        for (index, line) in element.lines.iter().enumerate() {
            let baseline_y = origin.1 as f32 + scaled.ascent() + index as f32 * line_height;
            let mut cursor_x = origin.0 as f32;
            let mut prev: Option<ab_glyph::GlyphId> = None;

            for c in line.chars() {
                let id = scaled.glyph_id(c);
                if let Some(p) = prev {
                    cursor_x += scaled.kern(p, id);
                }

                let glyph = id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
                if let Some(outlined) = self.font.outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    outlined.draw(|px, py, coverage| {
                        let x = bounds.min.x as i32 + px as i32;
                        let y = bounds.min.y as i32 + py as i32;
                        if x < 0 || y < 0 || x >= canvas_w || y >= canvas_h {
                            return;
                        }
                        let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32) as u8;
                        if alpha == 0 {
                            return;
                        }
                        let (x, y) = (x as u32, y as u32);
                        let existing = *canvas.get_pixel(x, y);
                        let fg = Rgba([color[0], color[1], color[2], alpha]);
                        canvas.put_pixel(x, y, blend_pixels(existing, fg));
                        region = Some(PixelRect::include(region, x, y));
                    });
                }

                cursor_x += scaled.h_advance(id);
                prev = Some(id);
            }
        }

        region
    }
}
