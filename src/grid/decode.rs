//! Canvas decoding.
//!
//! Browsers upload the drawing canvas as PNG (or whatever `toBlob` was asked
//! for). Transparent regions are flattened onto white so that an unfilled
//! canvas background reads as paper, not ink.

use image::{Rgba, RgbaImage};

use crate::error::{Result, SketchError};

/// Decodes image bytes (PNG/JPEG/BMP/GIF) into an opaque RGBA canvas.
pub fn decode_canvas(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|e| SketchError::InvalidCanvas(e.to_string()))?;
    let mut rgba = img.to_rgba8();
    flatten_onto_white(&mut rgba);
    Ok(rgba)
}

/// Source-over composite of every pixel onto an opaque white background.
pub fn flatten_onto_white(canvas: &mut RgbaImage) {
    for Rgba([r, g, b, a]) in canvas.pixels_mut() {
        let alpha = *a as f32 / 255.0;
        let over = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        *r = over(*r);
        *g = over(*g);
        *b = over(*b);
        *a = 255;
    }
}
