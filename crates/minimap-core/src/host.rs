//! Host-side interfaces.
//!
//! The engine never owns documents or widgets. A host (an editor, the TUI demo, the in-memory
//! [`MemoryView`](crate::MemoryView)) exposes each open document view through
//! [`DocumentView`] and the set of views through [`ViewHost`].
//!
//! Optional capabilities (`measure_text`, `preload_image`, a scrollable region, an overlay
//! slot) may be missing; the engine degrades to a no-op for those instead of failing.

use crate::color::Color;
use crate::error::PreloadError;
use crate::geometry::ScrollMetrics;

/// Opaque identifier of a document view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl ViewId {
    /// Wrap a host-allocated id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Handle for one event subscription, returned by [`DocumentView::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a host-allocated id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// View events the engine listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// The content region scrolled.
    Scroll,
    /// Primary pointer pressed on the minimap surface.
    PointerDown,
    /// Pointer moved (delivered while a drag may be active).
    PointerMove,
    /// Primary pointer released anywhere.
    PointerUp,
    /// Secondary click on the minimap surface.
    ContextMenu,
}

impl EventKind {
    /// Every kind, in subscription order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Scroll,
        EventKind::PointerDown,
        EventKind::PointerMove,
        EventKind::PointerUp,
        EventKind::ContextMenu,
    ];
}

/// Placement of the minimap overlay.
///
/// The overlay is pinned to the top-right corner of the view's content region and does not
/// move with document scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayAnchor {
    /// Logical width of the overlay.
    pub width: f32,
    /// Logical height of the overlay.
    pub height: f32,
}

/// Vertical placement of one line in document pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineLayout {
    /// Offset of the line's top edge from the document top.
    pub top: f32,
    /// Rendered line height.
    pub height: f32,
}

/// One open view of a document.
pub trait DocumentView {
    /// Stable id of this view.
    fn id(&self) -> ViewId;

    /// Identifier of the document currently shown (usually its path).
    fn document_id(&self) -> &str;

    /// Scroll state; `None` when the view has no scrollable region.
    fn scroll_metrics(&self) -> Option<ScrollMetrics>;

    /// Scroll the content region. Hosts clamp to their valid range.
    fn set_scroll_top(&mut self, scroll_top: f32);

    /// Number of lines in the document.
    fn line_count(&self) -> usize;

    /// Text of line `line`, without its terminator.
    fn line_text(&self, line: usize) -> Option<String>;

    /// Layout of line `line`; `None` for lines the host cannot place.
    fn line_layout(&self, line: usize) -> Option<LineLayout>;

    /// Device pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Background color of the host theme.
    fn theme(&self) -> Color;

    /// Start delivering events of `kind` to the engine.
    fn subscribe(&mut self, kind: EventKind) -> SubscriptionId;

    /// Stop delivering events for a subscription.
    fn unsubscribe(&mut self, subscription: SubscriptionId);

    /// Mount the minimap overlay; `false` when the view has no place for it.
    fn mount_overlay(&mut self, anchor: OverlayAnchor) -> bool;

    /// Remove the overlay mounted by [`DocumentView::mount_overlay`].
    fn unmount_overlay(&mut self);

    /// Width in logical px of `text` rendered at `font_px`, if the host can measure text.
    fn measure_text(&self, text: &str, font_px: f32) -> Option<f32> {
        let _ = (text, font_px);
        None
    }

    /// Ask the host to resolve and decode an embedded image ahead of use.
    fn preload_image(&mut self, reference: &str) -> Result<(), PreloadError> {
        let _ = reference;
        Err(PreloadError::Unsupported)
    }
}

/// The application side: every open view plus the active document.
pub trait ViewHost {
    /// Concrete view type.
    type View: DocumentView;

    /// Ids of every open view.
    fn view_ids(&self) -> Vec<ViewId>;

    /// Mutable access to a view.
    fn view_mut(&mut self, id: ViewId) -> Option<&mut Self::View>;

    /// Document id of the active view, if any.
    fn active_document(&self) -> Option<String>;
}
