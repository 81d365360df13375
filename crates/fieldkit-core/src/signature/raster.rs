//! Signature rasterizer.
//!
//! Renders point paths as black anti-aliased strokes with round caps and
//! joins on a white canvas and encodes the result as PNG. Pure and
//! deterministic: identical input yields identical bytes.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Largest accepted canvas edge in pixels.
pub const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignaturePath {
    #[serde(default)]
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self { width: 3.0 }
    }
}

/// Render `paths` onto a `width`×`height` canvas and return PNG bytes.
///
/// Paths with fewer than two points draw nothing.
pub fn rasterize(paths: &[SignaturePath], width: u32, height: u32, style: StrokeStyle) -> Result<Vec<u8>> {
    check_dimension("width", width)?;
    check_dimension("height", height)?;
    if !(style.width.is_finite() && style.width > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "strokeWidth",
            message: format!("must be positive, got {}", style.width),
        }
        .into());
    }

    let mut coverage = vec![0.0f32; (width * height) as usize];
    let radius = style.width / 2.0;
    let mut drawn = 0usize;
    for path in paths.iter().filter(|p| p.points.len() >= 2) {
        for segment in path.points.windows(2) {
            stamp_segment(&mut coverage, width, height, segment[0], segment[1], radius);
        }
        drawn += 1;
    }
    tracing::debug!(paths = paths.len(), drawn, width, height, "rasterized signature");

    let image = RgbaImage::from_fn(width, height, |x, y| {
        let ink = coverage[(y * width + x) as usize];
        let level = (255.0 * (1.0 - ink)).round() as u8;
        Rgba([level, level, level, 255])
    });

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn check_dimension(field: &'static str, value: u32) -> Result<()> {
    if value == 0 || value > MAX_DIMENSION {
        return Err(ValidationError::InvalidValue {
            field,
            message: format!("must be between 1 and {MAX_DIMENSION}, got {value}"),
        }
        .into());
    }
    Ok(())
}

/// Accumulate coverage for a capsule around segment `a`–`b`.
///
/// Coverage per pixel is the max over all segments, so overlapping joins do
/// not darken. The one-pixel ramp at the edge is the anti-aliasing.
fn stamp_segment(coverage: &mut [f32], width: u32, height: u32, a: Point, b: Point, radius: f32) {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return;
    }
    let reach = radius + 1.0;
    let min_x = (a.x.min(b.x) - reach).floor().max(0.0) as u32;
    let min_y = (a.y.min(b.y) - reach).floor().max(0.0) as u32;
    let max_x = (a.x.max(b.x) + reach).ceil().min(width as f32 - 1.0);
    let max_y = (a.y.max(b.y) + reach).ceil().min(height as f32 - 1.0);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }
    let (max_x, max_y) = (max_x as u32, max_y as u32);

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            let center = Point {
                x: px as f32 + 0.5,
                y: py as f32 + 0.5,
            };
            let distance = distance_to_segment(center, a, b);
            let ink = (radius + 0.5 - distance).clamp(0.0, 1.0);
            let cell = &mut coverage[(py * width + px) as usize];
            if ink > *cell {
                *cell = ink;
            }
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn path(points: &[(f32, f32)]) -> SignaturePath {
        SignaturePath {
            points: points.iter().map(|&(x, y)| Point { x, y }).collect(),
        }
    }

    fn decode(png: &[u8]) -> RgbaImage {
        image::load_from_memory_with_format(png, ImageFormat::Png)
            .unwrap()
            .to_rgba8()
    }

    #[test]
    fn empty_input_is_blank_white_canvas() {
        let png = rasterize(&[], 40, 20, StrokeStyle::default()).unwrap();
        let image = decode(&png);
        assert_eq!(image.dimensions(), (40, 20));
        assert!(image.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn single_point_paths_are_skipped() {
        let blank = rasterize(&[], 40, 20, StrokeStyle::default()).unwrap();
        let skipped = rasterize(&[path(&[(10.0, 10.0)]), path(&[])], 40, 20, StrokeStyle::default()).unwrap();
        assert_eq!(blank, skipped);
    }

    #[test]
    fn stroke_inks_pixels_along_segment() {
        let png = rasterize(&[path(&[(5.0, 10.0), (35.0, 10.0)])], 40, 20, StrokeStyle::default()).unwrap();
        let image = decode(&png);
        assert_eq!(*image.get_pixel(20, 9), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(20, 1), Rgba([255, 255, 255, 255]));
        // Round cap reaches past the end point but not far.
        assert_ne!(*image.get_pixel(35, 9), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(39, 9), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn output_is_deterministic() {
        let paths = vec![path(&[(1.0, 1.0), (30.0, 15.0), (12.5, 3.25)])];
        let a = rasterize(&paths, 64, 32, StrokeStyle::default()).unwrap();
        let b = rasterize(&paths, 64, 32, StrokeStyle::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn off_canvas_points_are_clipped() {
        let png = rasterize(&[path(&[(-50.0, -50.0), (500.0, 500.0)])], 30, 30, StrokeStyle::default()).unwrap();
        let image = decode(&png);
        assert_eq!(*image.get_pixel(15, 15), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            rasterize(&[], 0, 10, StrokeStyle::default()),
            Err(CoreError::Validation(ValidationError::InvalidValue { field: "width", .. }))
        ));
        assert!(matches!(
            rasterize(&[], 10, MAX_DIMENSION + 1, StrokeStyle::default()),
            Err(CoreError::Validation(ValidationError::InvalidValue { field: "height", .. }))
        ));
    }
}
