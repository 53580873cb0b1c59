//! Procedural test page generation.
//!
//! Draws a simple coloring page (a house with a roof, a door, two windows and
//! a sun) as black outlines on white, so a fresh install has something to
//! list and color in.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use image::{GrayImage, Luma};

/// Default canvas width in pixels.
pub const DEFAULT_WIDTH: u32 = 800;

/// Default canvas height in pixels.
pub const DEFAULT_HEIGHT: u32 = 600;

/// File name used when no output path is given.
pub const DEFAULT_FILE_NAME: &str = "test-page.png";

const INK: Luma<u8> = Luma([0u8]);
const PAPER: Luma<u8> = Luma([255u8]);
const STROKE: f32 = 3.0;

/// Maps the 800x600 reference layout onto an arbitrary canvas.
struct Canvas {
    img: GrayImage,
    sx: f32,
    sy: f32,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            img: GrayImage::from_pixel(width, height, PAPER),
            sx: width as f32 / DEFAULT_WIDTH as f32,
            sy: height as f32 / DEFAULT_HEIGHT as f32,
        }
    }

    fn stamp(&mut self, x: f32, y: f32) {
        let half = (STROKE * self.sx.min(self.sy)).max(1.0) / 2.0;
        let (w, h) = self.img.dimensions();
        if x + half < 0.0 || y + half < 0.0 {
            return;
        }

        let x0 = (x - half).floor().max(0.0) as u32;
        let y0 = (y - half).floor().max(0.0) as u32;
        let x1 = (x + half).ceil().min(w as f32 - 1.0).max(0.0) as u32;
        let y1 = (y + half).ceil().min(h as f32 - 1.0).max(0.0) as u32;

        for py in y0..=y1 {
            for px in x0..=x1 {
                if px < w && py < h {
                    self.img.put_pixel(px, py, INK);
                }
            }
        }
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32)) {
        let (x0, y0) = (from.0 * self.sx, from.1 * self.sy);
        let (x1, y1) = (to.0 * self.sx, to.1 * self.sy);

        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
        }
    }

    fn polygon(&mut self, points: &[(f32, f32)]) {
        for (i, &point) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            self.line(point, next);
        }
    }

    fn rect(&mut self, top_left: (f32, f32), bottom_right: (f32, f32)) {
        let (l, t) = top_left;
        let (r, b) = bottom_right;
        self.polygon(&[(l, t), (r, t), (r, b), (l, b)]);
    }

    fn circle(&mut self, center: (f32, f32), radius: f32) {
        let segments = 180;
        let points: Vec<(f32, f32)> = (0..segments)
            .map(|i| {
                let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
                (
                    center.0 + radius * angle.cos(),
                    center.1 + radius * angle.sin(),
                )
            })
            .collect();
        self.polygon(&points);
    }
}

/// Render the test page at the given size.
pub fn render(width: u32, height: u32) -> GrayImage {
    let mut canvas = Canvas::new(width, height);

    // House body and roof.
    canvas.rect((300.0, 250.0), (500.0, 400.0));
    canvas.polygon(&[(250.0, 250.0), (550.0, 250.0), (400.0, 150.0)]);

    // Door and windows.
    canvas.rect((375.0, 300.0), (425.0, 400.0));
    canvas.rect((325.0, 300.0), (360.0, 335.0));
    canvas.rect((440.0, 300.0), (475.0, 335.0));

    // Sun with eight rays.
    let sun = (100.0, 100.0);
    canvas.circle(sun, 50.0);
    for step in 0..8 {
        let angle = (step as f32 * 45.0).to_radians();
        let (dx, dy) = (angle.cos(), angle.sin());
        canvas.line(
            (sun.0 + 60.0 * dx, sun.1 + 60.0 * dy),
            (sun.0 + 80.0 * dx, sun.1 + 80.0 * dy),
        );
    }

    canvas.img
}

/// Render the test page and save it as PNG, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        anyhow::bail!("image dimensions must be non-zero, got {}x{}", width, height);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    render(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write test image: {}", path.display()))?;

    tracing::info!("Test image created at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_dimensions() {
        let img = render(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        assert_eq!(img.dimensions(), (800, 600));
    }

    #[test]
    fn test_render_outlines() {
        let img = render(DEFAULT_WIDTH, DEFAULT_HEIGHT);

        // Corner of the house body is inked, the middle of the wall is not.
        assert_eq!(*img.get_pixel(300, 250), INK);
        assert_eq!(*img.get_pixel(400, 275), PAPER);
        // Roof apex.
        assert_eq!(*img.get_pixel(400, 150), INK);
        // Far corner stays blank.
        assert_eq!(*img.get_pixel(790, 590), PAPER);
        // Sun outline.
        assert_eq!(*img.get_pixel(150, 100), INK);
    }

    #[test]
    fn test_render_scales() {
        let img = render(400, 300);
        assert_eq!(img.dimensions(), (400, 300));
        assert_eq!(*img.get_pixel(150, 125), INK);
    }

    #[test]
    fn test_write_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(DEFAULT_FILE_NAME);

        write_png(&path, 200, 150).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 200);
        assert_eq!(decoded.height(), 150);
    }

    #[test]
    fn test_write_png_rejects_empty() {
        let temp_dir = TempDir::new().unwrap();
        let result = write_png(&temp_dir.path().join("x.png"), 0, 10);
        assert!(result.is_err());
    }
}
