//! Rasterize shape lists onto RGBA surfaces.

use crate::entity::Entity;
use crate::error::GatewayError;
use crate::gateway::ContentPart;
use crate::shape::{round_half_up, Shape, ShapeKind};
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Pixel, Rgba, RgbaImage};
use std::path::Path;

#[cfg(test)]
mod tests;

/// Drawn in place of colors that fail to parse
pub const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`
pub fn parse_hex_color(hex: &str) -> Option<Rgba<u8>> {
    let hex = hex.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.is_ascii() {
        return None;
    }

    let short = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Rgba([short(0)?, short(1)?, short(2)?, 255])),
        4 => Some(Rgba([short(0)?, short(1)?, short(2)?, short(3)?])),
        6 => Some(Rgba([long(0)?, long(2)?, long(4)?, 255])),
        8 => Some(Rgba([long(0)?, long(2)?, long(4)?, long(6)?])),
        _ => None,
    }
}

/// Draw shapes onto a surface of any pixel size.
///
/// Clears the surface, then draws in ascending z-index order (ties keep list
/// order), scaling grid coordinates to surface pixels. Rectangles fill their
/// box; ellipses fill the ellipse inscribed in their box.
pub fn render_shapes(
    surface: &mut RgbaImage,
    shapes: &[Shape],
    grid_size: u32,
    background: Option<Rgba<u8>>,
) {
    let clear = background.unwrap_or(TRANSPARENT);
    for pixel in surface.pixels_mut() {
        *pixel = clear;
    }
    if grid_size == 0 {
        return;
    }

    let scale_x = surface.width() as f64 / grid_size as f64;
    let scale_y = surface.height() as f64 / grid_size as f64;

    let mut ordered: Vec<&Shape> = shapes.iter().collect();
    ordered.sort_by_key(|shape| shape.z_index);

    for shape in ordered {
        let color = parse_hex_color(&shape.color).unwrap_or(MAGENTA);
        let x = round_half_up(shape.x as f64 * scale_x) as i64;
        let y = round_half_up(shape.y as f64 * scale_y) as i64;
        let width = round_half_up(shape.width as f64 * scale_x) as i64;
        let height = round_half_up(shape.height as f64 * scale_y) as i64;

        match shape.kind {
            ShapeKind::Rectangle => fill_rect(surface, x, y, width, height, color),
            ShapeKind::Ellipse => fill_ellipse(surface, x, y, width, height, color),
        }
    }
}

fn clipped_span(start: i64, len: i64, limit: u32) -> (u32, u32) {
    let from = start.clamp(0, limit as i64) as u32;
    let to = (start + len).clamp(0, limit as i64) as u32;
    (from, to.max(from))
}

fn fill_rect(surface: &mut RgbaImage, x: i64, y: i64, width: i64, height: i64, color: Rgba<u8>) {
    let (x0, x1) = clipped_span(x, width, surface.width());
    let (y0, y1) = clipped_span(y, height, surface.height());
    for py in y0..y1 {
        for px in x0..x1 {
            surface.get_pixel_mut(px, py).blend(&color);
        }
    }
}

fn fill_ellipse(surface: &mut RgbaImage, x: i64, y: i64, width: i64, height: i64, color: Rgba<u8>) {
    if width <= 0 || height <= 0 {
        return;
    }
    let rx = width as f64 / 2.0;
    let ry = height as f64 / 2.0;
    let cx = x as f64 + rx;
    let cy = y as f64 + ry;

    let (x0, x1) = clipped_span(x, width, surface.width());
    let (y0, y1) = clipped_span(y, height, surface.height());
    for py in y0..y1 {
        let dy = (py as f64 + 0.5 - cy) / ry;
        for px in x0..x1 {
            let dx = (px as f64 + 0.5 - cx) / rx;
            if dx * dx + dy * dy <= 1.0 {
                surface.get_pixel_mut(px, py).blend(&color);
            }
        }
    }
}

/// Render an entity onto a fresh square surface
pub fn render_entity<E: Entity + ?Sized>(
    entity: &E,
    size: u32,
    background: Option<Rgba<u8>>,
) -> RgbaImage {
    let mut surface = RgbaImage::new(size, size);
    render_shapes(&mut surface, entity.shapes(), entity.grid_size(), background);
    surface
}

/// Encode as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Encode as base64 PNG, the form image attachments travel in
pub fn png_base64(image: &RgbaImage) -> Result<String, image::ImageError> {
    Ok(STANDARD.encode(encode_png(image)?))
}

/// Render an entity at one pixel per grid cell as an image attachment
pub fn png_attachment<E: Entity + ?Sized>(entity: &E) -> Result<ContentPart, GatewayError> {
    let image = render_entity(entity, entity.grid_size(), None);
    png_base64(&image)
        .map(ContentPart::ImagePng)
        .map_err(|e| GatewayError::Attachment(e.to_string()))
}

/// Write a PNG file, creating parent directories as needed
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    let bytes = encode_png(image).context("Failed to encode PNG")?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
