//! Raster surface backing one minimap.
//!
//! Drawing calls take logical coordinates; the surface snaps them to device pixels with its
//! device pixel ratio and rasterizes through a [`tiny_skia::Pixmap`]. The overlay opacity and
//! visibility are properties the host applies when compositing, they are never baked into the
//! pixels.

use crate::color::Color;
use crate::geometry::{Rect, SurfaceSize};
use tiny_skia::{FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

/// An RGBA8 pixmap plus overlay state.
///
/// A surface with a zero pixel dimension has no pixmap; drawing on it is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    size: SurfaceSize,
    pixmap: Option<Pixmap>,
    visible: bool,
    opacity: f32,
}

impl RasterSurface {
    /// Allocate a surface of the given size, cleared to transparent black.
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            pixmap: Pixmap::new(size.pixel_width, size.pixel_height),
            size,
            visible: true,
            opacity: 1.0,
        }
    }

    /// Current size.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Logical width.
    pub fn css_width(&self) -> f32 {
        self.size.css_width
    }

    /// Logical height.
    pub fn css_height(&self) -> f32 {
        self.size.css_height
    }

    /// Device pixel width.
    pub fn pixel_width(&self) -> u32 {
        self.size.pixel_width
    }

    /// Device pixel height.
    pub fn pixel_height(&self) -> u32 {
        self.size.pixel_height
    }

    /// Raw premultiplied RGBA bytes, row-major.
    ///
    /// After [`clear`](Self::clear) every pixel is opaque, so the bytes equal straight RGBA.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.as_ref().map_or(&[], |pixmap| pixmap.data())
    }

    /// Whether the overlay is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the overlay.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Overlay opacity the host should composite with.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the overlay opacity (clamped to `[0, 1]`).
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Adopt a new size. The pixmap is reallocated only when the pixel dimensions change;
    /// returns whether that happened.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        let reallocate = size.pixel_width != self.size.pixel_width
            || size.pixel_height != self.size.pixel_height;
        self.size = size;
        if reallocate {
            self.pixmap = Pixmap::new(size.pixel_width, size.pixel_height);
        }
        reallocate
    }

    /// Color of the device pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let px = self.pixmap.as_ref()?.pixel(x, y)?.demultiply();
        Some(Color::rgba(px.red(), px.green(), px.blue(), px.alpha()))
    }

    /// Fill the whole pixmap with `color` (made opaque).
    pub fn clear(&mut self, color: Color) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 0xFF));
        }
    }

    /// Source-over fill of a logical rectangle.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(area) = self.device_rect(rect) else {
            return;
        };
        if let (Some(pixmap), Some(paint)) = (self.pixmap.as_mut(), solid_paint(color)) {
            pixmap.fill_rect(area, &paint, Transform::identity(), None);
        }
    }

    /// Source-over inner outline of a logical rectangle.
    ///
    /// The line is one logical pixel wide (at least one device pixel) and lies inside `rect`;
    /// corners are painted once. An outline as thick as the rectangle fills it.
    pub fn stroke_rect(&mut self, rect: Rect, color: Color) {
        let Some(area) = self.device_rect(rect) else {
            return;
        };
        let Some(paint) = solid_paint(color) else {
            return;
        };
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };

        let width = self.size.device_pixel_ratio.round().max(1.0);
        let half = width / 2.0;
        let ring = (area.width() > 2.0 * width && area.height() > 2.0 * width)
            .then(|| {
                tiny_skia::Rect::from_ltrb(
                    area.left() + half,
                    area.top() + half,
                    area.right() - half,
                    area.bottom() - half,
                )
            })
            .flatten();

        match ring {
            Some(centerline) => {
                let path = PathBuilder::from_rect(centerline);
                let stroke = Stroke {
                    width,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            None => pixmap.fill_rect(area, &paint, Transform::identity(), None),
        }
    }

    /// A copy with the overlay opacity composited over an opaque `background`.
    ///
    /// This is what the host sees when it blends the overlay onto its view.
    pub fn flattened(&self, background: Color) -> RasterSurface {
        let mut out = RasterSurface::new(self.size);
        out.clear(background);
        if let (Some(target), Some(source)) = (out.pixmap.as_mut(), self.pixmap.as_ref()) {
            let paint = PixmapPaint {
                opacity: self.opacity,
                quality: FilterQuality::Nearest,
                ..PixmapPaint::default()
            };
            target.draw_pixmap(0, 0, source.as_ref(), &paint, Transform::identity(), None);
        }
        out
    }

    /// Snap a logical rectangle to whole device pixels.
    fn device_rect(&self, rect: Rect) -> Option<tiny_skia::Rect> {
        let dpr = self.size.device_pixel_ratio;
        let (x0, x1) = device_span(rect.x, rect.width, dpr)?;
        let (y0, y1) = device_span(rect.y, rect.height, dpr)?;
        tiny_skia::Rect::from_ltrb(x0, y0, x1, y1)
    }
}

fn solid_paint(color: Color) -> Option<Paint<'static>> {
    if color.a == 0 {
        return None;
    }
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    // Marks are snapped to device pixels already.
    paint.anti_alias = false;
    Some(paint)
}

/// Device span of a logical interval; a non-empty interval covers at least one pixel.
fn device_span(start: f32, len: f32, dpr: f32) -> Option<(f32, f32)> {
    if !(len > 0.0) || !start.is_finite() || !len.is_finite() {
        return None;
    }
    let s = (start * dpr).round();
    let e = ((start + len) * dpr).round().max(s + 1.0);
    Some((s, e))
}
