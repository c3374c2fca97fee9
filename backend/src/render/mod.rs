//! Raster drawing primitives shared by table images and histograms.
//!
//! [`Canvas`] wraps an `image::RgbImage` and adds rectangles, lines,
//! alpha-blended fills and text drawn from the `font8x8` bitmap glyphs
//! (no system fonts needed, so output is identical on every machine).

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use palette::{Hsl, IntoColor, Srgb};

/// Width and height of one glyph at scale 1.
pub const GLYPH_SIZE: u32 = 8;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const LIGHT_GRAY: Rgb<u8> = Rgb([232, 232, 232]);
pub const GRID_GRAY: Rgb<u8> = Rgb([200, 200, 200]);

/// Horizontal text placement inside a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// An RGB drawing surface.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// A canvas filled with white.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgb<u8>, alpha: f32) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            let px = self.image.get_pixel_mut(x as u32, y as u32);
            for i in 0..3 {
                let mixed = px.0[i] as f32 * (1.0 - alpha) + color.0[i] as f32 * alpha;
                px.0[i] = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Solid rectangle; parts outside the canvas are clipped.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>) {
        for dy in 0..h as i64 {
            for dx in 0..w as i64 {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    /// Translucent rectangle, `alpha` in `0.0..=1.0`.
    pub fn blend_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        for dy in 0..h as i64 {
            for dx in 0..w as i64 {
                self.blend(x + dx, y + dy, color, alpha);
            }
        }
    }

    /// One-pixel rectangle outline.
    pub fn stroke_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>) {
        if w == 0 || h == 0 {
            return;
        }
        self.hline(x, y, w, color);
        self.hline(x, y + h as i64 - 1, w, color);
        self.vline(x, y, h, color);
        self.vline(x + w as i64 - 1, y, h, color);
    }

    pub fn hline(&mut self, x: i64, y: i64, len: u32, color: Rgb<u8>) {
        self.fill_rect(x, y, len, 1, color);
    }

    pub fn vline(&mut self, x: i64, y: i64, len: u32, color: Rgb<u8>) {
        self.fill_rect(x, y, 1, len, color);
    }

    /// Draw `text` with its top-left corner at (`x`, `y`).
    pub fn draw_text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let scale = scale.max(1);
        let advance = (GLYPH_SIZE * scale) as i64;
        for (i, ch) in text.chars().enumerate() {
            let glyph = glyph(ch);
            let origin_x = x + i as i64 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for bit in 0..GLYPH_SIZE {
                    if bits & (1 << bit) != 0 {
                        let px = origin_x + (bit * scale) as i64;
                        let py = y + (row as u32 * scale) as i64;
                        self.fill_rect(px, py, scale, scale, color);
                    }
                }
            }
        }
    }

    /// Draw `text` vertically centred in a box, shortened to fit its width.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text_in_box(
        &mut self,
        x: i64,
        y: i64,
        w: u32,
        h: u32,
        text: &str,
        scale: u32,
        align: Align,
        color: Rgb<u8>,
    ) {
        let padding = 4;
        let max_chars = (w.saturating_sub(2 * padding) / (GLYPH_SIZE * scale.max(1))) as usize;
        let text = fit_text(text, max_chars);
        let text_w = text_width(&text, scale) as i64;
        let text_x = match align {
            Align::Left => x + padding as i64,
            Align::Center => x + (w as i64 - text_w) / 2,
            Align::Right => x + w as i64 - padding as i64 - text_w,
        };
        let text_y = y + (h as i64 - (GLYPH_SIZE * scale.max(1)) as i64) / 2;
        self.draw_text(text_x, text_y, &text, scale, color);
    }
}

/// Pixel width of `text` at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale.max(1)
}

/// Shorten `text` to at most `max_chars` characters, marking the cut with `..`.
pub fn fit_text(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    if max_chars <= 2 {
        return text.chars().take(max_chars).collect();
    }
    let mut shortened: String = text.chars().take(max_chars - 2).collect();
    shortened.push_str("..");
    shortened
}

fn glyph(ch: char) -> [u8; 8] {
    let ch = match ch {
        '\n' | '\r' | '\t' => ' ',
        c => c,
    };
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

// ---------------------------------------------------------------------------
// Colour palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb<u8>> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0 + 210.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Rgb([
                (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
                (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
                (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
            ])
        })
        .collect()
}
