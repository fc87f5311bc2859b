//! The per-view projection engine.
//!
//! A [`MinimapEngine`] binds to one [`DocumentView`], owns that view's [`RasterSurface`] and
//! repaints it on demand. It never stores a reference to the view or the settings: every entry
//! point borrows them for the duration of the call, which keeps the engine free of lifetimes
//! and lets the controller hold engines in a plain map.
//!
//! # Frame
//!
//! An update clears the surface to the theme background, paints one mark per non-blank line
//! (culling marks outside the surface) and finishes with the viewport indicator. Every drawing
//! call is mirrored into a display list of [`PaintOp`]s so hosts and tests can see what the
//! last frame contained without decoding pixels.
//!
//! # Events
//!
//! ```text
//! PointerDown ──► dragging = true ──► navigate
//! PointerMove ──► (dragging) ───────► navigate
//! PointerUp   ──► dragging = false
//! Scroll      ──► (not dragging) ───► repaint
//! ContextMenu ──► OpenContextMenu response (the controller owns the menu)
//! ```

use crate::classify::{ClassifyOptions, LineClass, classify_with, image_reference};
use crate::color::Color;
use crate::geometry::{
    INDICATOR_OUTLINE_OPACITY, Mark, Projection, Rect, ScrollMetrics, SurfaceSize, line_mark,
    scroll_target,
};
use crate::host::{DocumentView, EventKind, OverlayAnchor, SubscriptionId, ViewId};
use crate::settings::Settings;
use crate::surface::RasterSurface;
use std::collections::BTreeMap;

/// Lines are fetched from the host in batches of this size.
pub const LINE_BATCH: usize = 512;

/// What a painted rectangle represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    /// A line mark of the given class.
    Line(LineClass),
    /// The viewport indicator.
    ViewportIndicator,
}

/// One recorded drawing call of the last frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintOp {
    /// The surface was cleared to the theme background.
    Clear {
        /// Background color.
        color: Color,
    },
    /// A filled rectangle.
    Fill {
        /// What was painted.
        kind: MarkKind,
        /// Source line, for line marks.
        line: Option<usize>,
        /// Logical rectangle.
        rect: Rect,
        /// Color with its effective opacity.
        color: Color,
    },
    /// A 1px outline.
    Stroke {
        /// What was painted.
        kind: MarkKind,
        /// Source line, for line marks.
        line: Option<usize>,
        /// Logical rectangle.
        rect: Rect,
        /// Color with its effective opacity.
        color: Color,
    },
}

impl PaintOp {
    /// The mark kind of a fill or stroke.
    pub fn kind(&self) -> Option<MarkKind> {
        match self {
            PaintOp::Clear { .. } => None,
            PaintOp::Fill { kind, .. } | PaintOp::Stroke { kind, .. } => Some(*kind),
        }
    }
}

/// Input delivered to an attached engine. Coordinates are logical px relative to the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MinimapEvent {
    /// The view scrolled.
    Scroll,
    /// Primary button pressed on the surface.
    PointerDown {
        /// Vertical position.
        y: f32,
    },
    /// Pointer moved.
    PointerMove {
        /// Vertical position.
        y: f32,
    },
    /// Primary button released.
    PointerUp,
    /// Secondary click on the surface.
    ContextMenu {
        /// Horizontal position.
        x: f32,
        /// Vertical position.
        y: f32,
    },
}

/// What the engine did with an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineResponse {
    /// Nothing changed.
    Ignored,
    /// The surface was repainted.
    Repainted,
    /// The view was scrolled to `scroll_top` and the surface repainted.
    Navigated {
        /// Applied scroll offset.
        scroll_top: f32,
    },
    /// The host should open the context menu at the given position.
    OpenContextMenu {
        /// Horizontal position.
        x: f32,
        /// Vertical position.
        y: f32,
    },
}

/// Counters for one painted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Lines that produced a visible mark.
    pub lines_painted: usize,
    /// Lines whose scaled layout fell outside the surface.
    pub lines_culled: usize,
    /// Whether the viewport indicator was drawn.
    pub indicator: bool,
}

/// Result of [`MinimapEngine::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The engine is not attached to this view.
    Detached,
    /// The minimap is switched off globally or for this document; the surface is hidden.
    Hidden,
    /// The view lost its scrollable region; nothing was touched.
    Skipped,
    /// A frame was painted.
    Painted(FrameStats),
}

/// An event subscription held while attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    /// Subscribed event.
    pub kind: EventKind,
    /// Host handle used to unsubscribe.
    pub id: SubscriptionId,
}

/// Preload result for one image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// The host accepted the preload.
    Ready,
    /// The host could not provide the image.
    Unavailable,
}

/// Projection engine for a single view.
#[derive(Debug, Default)]
pub struct MinimapEngine {
    view: Option<ViewId>,
    document: Option<String>,
    surface: Option<RasterSurface>,
    subscriptions: Vec<Subscription>,
    dragging: bool,
    display_list: Vec<PaintOp>,
    images: BTreeMap<String, ImageStatus>,
}

impl MinimapEngine {
    /// Create a detached engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the engine is bound to a view.
    pub fn is_attached(&self) -> bool {
        self.view.is_some()
    }

    /// The bound view.
    pub fn view_id(&self) -> Option<ViewId> {
        self.view
    }

    /// The document shown by the bound view when it was attached.
    pub fn document_id(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// The raster surface, while attached.
    pub fn surface(&self) -> Option<&RasterSurface> {
        self.surface.as_ref()
    }

    /// Whether the surface exists and is shown.
    pub fn is_visible(&self) -> bool {
        self.surface.as_ref().is_some_and(RasterSurface::is_visible)
    }

    /// Drawing calls of the last frame (empty while hidden).
    pub fn display_list(&self) -> &[PaintOp] {
        &self.display_list
    }

    /// Subscriptions held for the bound view.
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Whether a pointer drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Preload result for `reference` in the current document load.
    pub fn image_status(&self, reference: &str) -> Option<ImageStatus> {
        self.images.get(reference).copied()
    }

    /// Bind to `view`, mount the overlay, subscribe to its events and paint once.
    ///
    /// Returns `false` without side effects when already attached, when the view has no
    /// scrollable region, or when the host cannot mount the overlay.
    pub fn attach<V>(&mut self, view: &mut V, settings: &Settings) -> bool
    where
        V: DocumentView + ?Sized,
    {
        if let Some(bound) = self.view {
            tracing::debug!(view = bound.get(), "minimap already attached");
            return false;
        }
        let Some(metrics) = view.scroll_metrics() else {
            tracing::debug!(view = view.id().get(), "no scrollable region; not attaching");
            return false;
        };

        let size = SurfaceSize::compute(settings, metrics.client_height, view.device_pixel_ratio());
        let surface = RasterSurface::new(size);
        let anchor = OverlayAnchor {
            width: size.css_width,
            height: size.css_height,
        };
        if !view.mount_overlay(anchor) {
            tracing::debug!(view = view.id().get(), "overlay unavailable; not attaching");
            return false;
        }

        self.subscriptions = EventKind::ALL
            .into_iter()
            .map(|kind| Subscription {
                kind,
                id: view.subscribe(kind),
            })
            .collect();
        self.view = Some(view.id());
        self.document = Some(view.document_id().to_owned());
        self.surface = Some(surface);
        self.dragging = false;
        self.images.clear();
        tracing::debug!(
            view = view.id().get(),
            document = view.document_id(),
            "minimap attached"
        );

        self.update(view, settings);
        self.preload_images(view);
        true
    }

    /// Release every subscription, unmount the overlay and drop the surface.
    ///
    /// Safe to call repeatedly; returns whether anything was released.
    pub fn detach<V>(&mut self, view: &mut V) -> bool
    where
        V: DocumentView + ?Sized,
    {
        if self.view != Some(view.id()) {
            return false;
        }
        for subscription in self.subscriptions.drain(..) {
            view.unsubscribe(subscription.id);
        }
        if self.surface.is_some() {
            view.unmount_overlay();
        }
        tracing::debug!(view = view.id().get(), "minimap detached");
        self.forget();
        true
    }

    /// Drop all state without calling into the view (for views that are already gone).
    pub fn forget(&mut self) {
        self.view = None;
        self.document = None;
        self.surface = None;
        self.subscriptions.clear();
        self.dragging = false;
        self.display_list.clear();
        self.images.clear();
    }

    /// Repaint the surface from the view's current state.
    pub fn update<V>(&mut self, view: &V, settings: &Settings) -> UpdateOutcome
    where
        V: DocumentView + ?Sized,
    {
        if self.view != Some(view.id()) {
            return UpdateOutcome::Detached;
        }
        let Some(surface) = self.surface.as_mut() else {
            return UpdateOutcome::Detached;
        };

        if !settings.show_minimap || !settings.is_minimap_enabled_for_file(view.document_id()) {
            surface.set_visible(false);
            self.display_list.clear();
            return UpdateOutcome::Hidden;
        }
        let Some(metrics) = view.scroll_metrics() else {
            tracing::debug!(view = view.id().get(), "scroll metrics unavailable; skipping update");
            return UpdateOutcome::Skipped;
        };

        let size = SurfaceSize::compute(settings, metrics.client_height, view.device_pixel_ratio());
        if surface.resize(size) {
            tracing::trace!(
                width = size.pixel_width,
                height = size.pixel_height,
                "minimap surface reallocated"
            );
        }
        surface.set_visible(true);
        surface.set_opacity(settings.minimap_opacity);

        self.display_list.clear();
        let mut frame = Frame {
            surface,
            ops: &mut self.display_list,
        };
        let stats = frame.paint(view, settings, &metrics);
        tracing::trace!(
            view = view.id().get(),
            painted = stats.lines_painted,
            culled = stats.lines_culled,
            "minimap frame"
        );
        UpdateOutcome::Painted(stats)
    }

    /// Hide the surface when the document is disabled, otherwise show it and repaint.
    pub fn sync_visibility<V>(&mut self, view: &V, settings: &Settings) -> UpdateOutcome
    where
        V: DocumentView + ?Sized,
    {
        if self.view != Some(view.id()) {
            return UpdateOutcome::Detached;
        }
        if !settings.is_minimap_enabled_for_file(view.document_id()) {
            if let Some(surface) = self.surface.as_mut() {
                surface.set_visible(false);
            }
            self.display_list.clear();
            return UpdateOutcome::Hidden;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.set_visible(true);
        }
        self.update(view, settings)
    }

    /// React to a view event.
    pub fn handle_event<V>(
        &mut self,
        view: &mut V,
        settings: &Settings,
        event: MinimapEvent,
    ) -> EngineResponse
    where
        V: DocumentView + ?Sized,
    {
        if self.view != Some(view.id()) {
            return EngineResponse::Ignored;
        }
        match event {
            MinimapEvent::Scroll => {
                if self.dragging {
                    return EngineResponse::Ignored;
                }
                match self.update(view, settings) {
                    UpdateOutcome::Painted(_) => EngineResponse::Repainted,
                    _ => EngineResponse::Ignored,
                }
            }
            MinimapEvent::PointerDown { y } => {
                if !self.is_visible() {
                    return EngineResponse::Ignored;
                }
                self.dragging = true;
                self.navigate_to(view, settings, y)
            }
            MinimapEvent::PointerMove { y } => {
                if !self.dragging {
                    return EngineResponse::Ignored;
                }
                self.navigate_to(view, settings, y)
            }
            MinimapEvent::PointerUp => {
                self.dragging = false;
                EngineResponse::Ignored
            }
            MinimapEvent::ContextMenu { x, y } => {
                if !self.is_visible() {
                    return EngineResponse::Ignored;
                }
                EngineResponse::OpenContextMenu { x, y }
            }
        }
    }

    /// Scroll the view so the viewport centers on surface position `click_y`, then repaint.
    pub fn navigate_to<V>(
        &mut self,
        view: &mut V,
        settings: &Settings,
        click_y: f32,
    ) -> EngineResponse
    where
        V: DocumentView + ?Sized,
    {
        let Some(surface_height) = self.surface.as_ref().map(RasterSurface::css_height) else {
            return EngineResponse::Ignored;
        };
        let Some(metrics) = view.scroll_metrics() else {
            return EngineResponse::Ignored;
        };
        let Some(target) = scroll_target(click_y, surface_height, &metrics) else {
            return EngineResponse::Ignored;
        };
        view.set_scroll_top(target);
        self.update(view, settings);
        EngineResponse::Navigated { scroll_top: target }
    }

    fn preload_images<V>(&mut self, view: &mut V)
    where
        V: DocumentView + ?Sized,
    {
        for line in 0..view.line_count() {
            let Some(text) = view.line_text(line) else {
                continue;
            };
            let Some(reference) = image_reference(&text) else {
                continue;
            };
            if self.images.contains_key(reference) {
                continue;
            }
            let status = match view.preload_image(reference) {
                Ok(()) => ImageStatus::Ready,
                Err(err) => {
                    tracing::debug!(reference, error = %err, "image preload failed");
                    ImageStatus::Unavailable
                }
            };
            self.images.insert(reference.to_owned(), status);
        }
    }
}

struct Frame<'a> {
    surface: &'a mut RasterSurface,
    ops: &'a mut Vec<PaintOp>,
}

impl Frame<'_> {
    fn paint<V>(&mut self, view: &V, settings: &Settings, metrics: &ScrollMetrics) -> FrameStats
    where
        V: DocumentView + ?Sized,
    {
        let background = view.theme();
        self.surface.clear(background);
        self.ops.push(PaintOp::Clear { color: background });

        let mut stats = FrameStats::default();
        let Some(projection) = Projection::new(
            self.surface.css_width(),
            self.surface.css_height(),
            metrics.scroll_height,
        ) else {
            return stats;
        };

        let options = ClassifyOptions::from_settings(settings);
        let measure = |text: &str, font_px: f32| view.measure_text(text, font_px);
        let line_count = view.line_count();
        let mut start = 0;
        while start < line_count {
            let end = (start + LINE_BATCH).min(line_count);
            for line in start..end {
                let (Some(layout), Some(text)) = (view.line_layout(line), view.line_text(line))
                else {
                    continue;
                };
                let y = projection.project_y(layout.top);
                let scaled = Rect::new(
                    0.0,
                    y,
                    projection.surface_width,
                    layout.height * projection.scale,
                );
                if !projection.is_visible(&scaled) {
                    stats.lines_culled += 1;
                    continue;
                }
                let class = classify_with(&text, options);
                let Some(mark) =
                    line_mark(class, &text, y, projection.surface_width, settings, &measure)
                else {
                    continue;
                };
                self.mark(MarkKind::Line(class), Some(line), &mark);
                stats.lines_painted += 1;
            }
            start = end;
        }

        if settings.indicator_opacity > 0.0 {
            let rect = projection.viewport_indicator(metrics);
            if !rect.is_empty() {
                self.mark(
                    MarkKind::ViewportIndicator,
                    None,
                    &Mark {
                        rect,
                        color: settings.indicator_color,
                        fill_opacity: settings.indicator_opacity,
                        // The outline never reads fainter than the fill.
                        outline_opacity: Some(
                            INDICATOR_OUTLINE_OPACITY.max(settings.indicator_opacity),
                        ),
                    },
                );
                stats.indicator = true;
            }
        }
        stats
    }

    fn mark(&mut self, kind: MarkKind, line: Option<usize>, mark: &Mark) {
        if mark.fill_opacity > 0.0 {
            let color = mark.color.with_opacity(mark.fill_opacity);
            self.surface.fill_rect(mark.rect, color);
            self.ops.push(PaintOp::Fill {
                kind,
                line,
                rect: mark.rect,
                color,
            });
        }
        if let Some(opacity) = mark.outline_opacity {
            let color = mark.color.with_opacity(opacity);
            self.surface.stroke_rect(mark.rect, color);
            self.ops.push(PaintOp::Stroke {
                kind,
                line,
                rect: mark.rect,
                color,
            });
        }
    }
}
