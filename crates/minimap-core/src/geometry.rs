//! Projection geometry.
//!
//! All coordinates here are logical (CSS) pixels on the minimap surface. The
//! [`RasterSurface`](crate::RasterSurface) applies the device pixel ratio when it rasterizes.
//!
//! The vertical mapping is a single factor:
//!
//! ```text
//! scale = surface_height / scroll_height
//! y_on_surface = y_in_document * scale
//! ```
//!
//! and the reverse mapping from a click centers the viewport on the clicked ratio:
//!
//! ```text
//! target = clamp(click_y / surface_height * scroll_height - client_height / 2,
//!                0, scroll_height - client_height)
//! ```

use crate::classify::{LineClass, header_text, leading_whitespace};
use crate::color::Color;
use crate::settings::Settings;
use unicode_width::UnicodeWidthStr;

/// Total horizontal inset; marks start at `INSET / 2`.
pub const INSET: f32 = 10.0;
/// Extra width added to a measured header.
pub const HEADER_PADDING: f32 = 4.0;
/// Minimum header mark height.
pub const MIN_HEADER_HEIGHT: f32 = 3.0;
/// Minimum code fence mark height.
pub const MIN_FENCE_HEIGHT: f32 = 1.5;
/// Width of one table cell.
pub const TABLE_CELL_WIDTH: f32 = 20.0;
/// Width factor of the header estimate used when the host cannot measure text.
pub const HEADER_ESTIMATE_FACTOR: f32 = 1.5;
/// Fill opacity of generic embed marks (their outline is opaque).
pub const EMBED_FILL_OPACITY: f32 = 0.4;
/// Outline opacity of the viewport indicator.
pub const INDICATOR_OUTLINE_OPACITY: f32 = 0.8;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width (non-negative).
    pub width: f32,
    /// Height (non-negative).
    pub height: f32,
}

impl Rect {
    /// Create a rectangle; negative sizes are clamped to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Vertical center.
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Whether the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether `(x, y)` lies inside (left/top inclusive, right/bottom exclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Scroll state of a view's content region, in document pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Offset of the first visible pixel.
    pub scroll_top: f32,
    /// Total scrollable content height.
    pub scroll_height: f32,
    /// Visible viewport height.
    pub client_height: f32,
}

impl ScrollMetrics {
    /// Largest valid `scroll_top`.
    pub fn max_scroll_top(&self) -> f32 {
        (self.scroll_height - self.client_height).max(0.0)
    }
}

/// Logical and device size of the minimap surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    /// Logical width.
    pub css_width: f32,
    /// Logical height.
    pub css_height: f32,
    /// Device pixel ratio the pixel size was computed with.
    pub device_pixel_ratio: f32,
    /// Backing buffer width.
    pub pixel_width: u32,
    /// Backing buffer height.
    pub pixel_height: u32,
}

impl SurfaceSize {
    /// Size for the configured width and the viewport height, both scaled by
    /// `minimapScaling`, then by the device pixel ratio.
    pub fn compute(settings: &Settings, client_height: f32, device_pixel_ratio: f32) -> Self {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let css_width = settings.width * settings.minimap_scaling;
        let css_height = client_height.max(0.0) * settings.minimap_scaling;
        Self {
            css_width,
            css_height,
            device_pixel_ratio: dpr,
            pixel_width: (css_width * dpr).round() as u32,
            pixel_height: (css_height * dpr).round() as u32,
        }
    }
}

/// Document-to-surface vertical mapping for one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Surface px per document px.
    pub scale: f32,
    /// Logical surface width.
    pub surface_width: f32,
    /// Logical surface height.
    pub surface_height: f32,
}

impl Projection {
    /// Build the mapping; `None` when there is no content to project.
    pub fn new(surface_width: f32, surface_height: f32, scroll_height: f32) -> Option<Self> {
        if !(scroll_height > 0.0) || !scroll_height.is_finite() {
            return None;
        }
        Some(Self {
            scale: surface_height / scroll_height,
            surface_width,
            surface_height,
        })
    }

    /// Surface y of a document y.
    pub fn project_y(&self, document_y: f32) -> f32 {
        document_y * self.scale
    }

    /// Whether any part of `rect` lies within the surface's vertical extent.
    pub fn is_visible(&self, rect: &Rect) -> bool {
        rect.bottom() >= 0.0 && rect.y < self.surface_height
    }

    /// The viewport indicator for the given scroll state.
    pub fn viewport_indicator(&self, metrics: &ScrollMetrics) -> Rect {
        Rect::new(
            0.0,
            self.project_y(metrics.scroll_top),
            self.surface_width,
            metrics.client_height * self.scale,
        )
    }
}

/// Scroll offset that centers the viewport on a click at `click_y`.
///
/// Returns `None` when the surface has no height.
pub fn scroll_target(click_y: f32, surface_height: f32, metrics: &ScrollMetrics) -> Option<f32> {
    if !(surface_height > 0.0) || !click_y.is_finite() {
        return None;
    }
    let ratio = click_y / surface_height;
    let target = ratio * metrics.scroll_height - metrics.client_height / 2.0;
    Some(target.clamp(0.0, metrics.max_scroll_top()))
}

/// One painted rectangle with its styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    /// Area to paint.
    pub rect: Rect,
    /// Base color.
    pub color: Color,
    /// Fill opacity; `0` skips the fill.
    pub fill_opacity: f32,
    /// Opacity of a 1px outline, if any.
    pub outline_opacity: Option<f32>,
}

impl Mark {
    fn filled(rect: Rect, color: Color) -> Self {
        Self {
            rect,
            color,
            fill_opacity: 1.0,
            outline_opacity: None,
        }
    }
}

/// Mark for a line of class `class` whose top projects to `y`.
///
/// `measure` is the host's text measurement facility (`text`, font size in px) and may decline
/// by returning `None`. Blank lines and zero-area marks yield `None`.
pub fn line_mark(
    class: LineClass,
    line: &str,
    y: f32,
    surface_width: f32,
    settings: &Settings,
    measure: &dyn Fn(&str, f32) -> Option<f32>,
) -> Option<Mark> {
    let line_height = settings.mark_line_height();
    let x = INSET / 2.0;
    let full_width = surface_width - INSET;

    let mark = match class {
        LineClass::Blank => return None,
        LineClass::ImageEmbed => Mark::filled(
            Rect::new(x, y, full_width, line_height * 1.5),
            settings.image_color,
        ),
        LineClass::GenericEmbed => Mark {
            rect: Rect::new(x, y, full_width, line_height * 2.0),
            color: settings.embed_color,
            fill_opacity: EMBED_FILL_OPACITY,
            outline_opacity: Some(1.0),
        },
        LineClass::Header(level) => {
            let height = (line_height * 1.2).max(MIN_HEADER_HEIGHT);
            let text = header_text(line);
            let text_width = measure(text, height).unwrap_or_else(|| {
                text.width() as f32 * settings.text_density * HEADER_ESTIMATE_FACTOR
            });
            Mark::filled(
                Rect::new(x, y, (text_width + HEADER_PADDING).min(full_width), height),
                settings.header_color_for(level),
            )
        }
        LineClass::CodeFence => Mark::filled(
            Rect::new(x, y, full_width, line_height.max(MIN_FENCE_HEIGHT)),
            settings.code_block_color,
        ),
        LineClass::TableRow { cells } => Mark::filled(
            Rect::new(
                x,
                y,
                (cells as f32 * TABLE_CELL_WIDTH).min(full_width),
                line_height,
            ),
            settings.table_color,
        ),
        LineClass::PlainText => {
            let offset = leading_whitespace(line) as f32 * settings.text_density;
            let content = line.trim().width() as f32 * settings.text_density;
            Mark::filled(
                Rect::new(
                    x + offset,
                    y,
                    content.min(full_width - offset),
                    line_height * 0.8,
                ),
                settings.text_color,
            )
        }
    };

    (!mark.rect.is_empty()).then_some(mark)
}
