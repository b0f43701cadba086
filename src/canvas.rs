//! A CPU raster [`Surface`] backed by a `tiny-skia` pixmap.

use std::path::Path;

use glam::Vec2;
use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, LineJoin, Paint, Path as SkPath, PathBuilder, Pixmap, Transform};

use crate::color::Color;
use crate::renderer::{Stroke, Surface};

/// Rasterizes polygons into an anti-aliased RGBA pixmap.
///
/// Fills use the even-odd rule. Outlines are closed loops with bevelled
/// corners; a two-point polygon strokes as a single segment.
pub struct ImageSurface {
    pixmap: Pixmap,
}

impl ImageSurface {
    /// A transparent surface, or `None` if either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Copies the pixmap out with straight (non-premultiplied) alpha.
    pub fn to_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image
    }

    /// Writes the image; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        self.to_image().save(path)
    }
}

impl Surface for ImageSurface {
    fn draw_polygon(&mut self, points: &[Vec2], fill: Option<Color>, stroke: Option<Stroke>) {
        if points.iter().any(|p| !p.is_finite()) {
            log::debug!("non-finite screen coordinates; polygon not rasterized");
            return;
        }
        let Some(path) = outline(points) else {
            return;
        };

        if let Some(color) = fill.filter(|c| c.a > 0.0 && points.len() >= 3) {
            self.pixmap.fill_path(
                &path,
                &paint(color),
                FillRule::EvenOdd,
                Transform::identity(),
                None,
            );
        }
        if let Some(stroke) = stroke.filter(|s| s.width > 0.0 && s.color.a > 0.0) {
            let style = tiny_skia::Stroke {
                width: stroke.width,
                line_join: LineJoin::Bevel,
                ..Default::default()
            };
            self.pixmap.stroke_path(
                &path,
                &paint(stroke.color),
                &style,
                Transform::identity(),
                None,
            );
        }
    }
}

// Closed unless it is a bare segment.
fn outline(points: &[Vec2]) -> Option<SkPath> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for p in rest {
        builder.line_to(p.x, p.y);
    }
    if points.len() > 2 {
        builder.close();
    }
    builder.finish()
}

fn paint(color: Color) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}
