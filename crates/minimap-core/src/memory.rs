//! In-memory reference host.
//!
//! [`MemoryView`] stores its text in a rope and lays lines out at a uniform height, which is
//! enough to drive the engine end to end without a UI toolkit. The TUI demo and the test suite
//! both run on it.

use crate::color::Color;
use crate::error::PreloadError;
use crate::geometry::ScrollMetrics;
use crate::host::{
    DocumentView, EventKind, LineLayout, OverlayAnchor, SubscriptionId, ViewHost, ViewId,
};
use ropey::Rope;
use std::collections::{BTreeMap, BTreeSet};

/// Default line height in document px.
pub const DEFAULT_LINE_HEIGHT: f32 = 20.0;

/// Default theme background.
pub const DEFAULT_BACKGROUND: Color = Color::rgb(0x1E, 0x1E, 0x1E);

/// A text measurement function: `(text, font_px) -> width`.
pub type TextMeasure = fn(&str, f32) -> f32;

/// A document view backed by a rope.
#[derive(Debug, Clone)]
pub struct MemoryView {
    id: ViewId,
    document_id: String,
    text: Rope,
    line_height: f32,
    client_height: f32,
    scrollable: bool,
    scroll_top: f32,
    device_pixel_ratio: f32,
    background: Color,
    subscriptions: BTreeMap<SubscriptionId, EventKind>,
    next_subscription: u64,
    overlay_slot: bool,
    overlay: Option<OverlayAnchor>,
    images: BTreeSet<String>,
    preload_requests: Vec<String>,
    measure: Option<TextMeasure>,
}

impl MemoryView {
    /// Create a view of `text` with a viewport `client_height` px tall.
    pub fn new(
        id: ViewId,
        document_id: impl Into<String>,
        text: &str,
        client_height: f32,
    ) -> Self {
        Self {
            id,
            document_id: document_id.into(),
            text: Rope::from_str(text),
            line_height: DEFAULT_LINE_HEIGHT,
            client_height: client_height.max(0.0),
            scrollable: true,
            scroll_top: 0.0,
            device_pixel_ratio: 1.0,
            background: DEFAULT_BACKGROUND,
            subscriptions: BTreeMap::new(),
            next_subscription: 1,
            overlay_slot: true,
            overlay: None,
            images: BTreeSet::new(),
            preload_requests: Vec::new(),
            measure: None,
        }
    }

    /// Use a different uniform line height.
    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height.max(0.0);
        self
    }

    /// Use a different device pixel ratio.
    pub fn with_device_pixel_ratio(mut self, dpr: f32) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }

    /// Use a different theme background.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Report no scrollable region.
    pub fn without_scroll_region(mut self) -> Self {
        self.scrollable = false;
        self
    }

    /// Refuse overlay mounts.
    pub fn without_overlay_slot(mut self) -> Self {
        self.overlay_slot = false;
        self
    }

    /// Make `reference` resolvable by [`DocumentView::preload_image`].
    pub fn with_image(mut self, reference: impl Into<String>) -> Self {
        self.images.insert(reference.into());
        self
    }

    /// Measure text with `measure` instead of declining.
    pub fn with_text_measure(mut self, measure: TextMeasure) -> Self {
        self.measure = Some(measure);
        self
    }

    /// Replace the text, keeping the scroll offset within range.
    pub fn set_text(&mut self, text: &str) {
        self.text = Rope::from_str(text);
        self.scroll_top = self.scroll_top.min(self.max_scroll_top());
    }

    /// Show a different document in this view.
    pub fn set_document(&mut self, document_id: impl Into<String>, text: &str) {
        self.document_id = document_id.into();
        self.text = Rope::from_str(text);
        self.scroll_top = 0.0;
    }

    /// Resize the viewport.
    pub fn set_client_height(&mut self, client_height: f32) {
        self.client_height = client_height.max(0.0);
        self.scroll_top = self.scroll_top.min(self.max_scroll_top());
    }

    /// The whole text.
    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Current scroll offset.
    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    /// Uniform line height.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Viewport height.
    pub fn client_height(&self) -> f32 {
        self.client_height
    }

    /// Whether some subscription for `kind` is live.
    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.subscriptions.values().any(|k| *k == kind)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// The mounted overlay, if any.
    pub fn overlay(&self) -> Option<OverlayAnchor> {
        self.overlay
    }

    /// Every reference passed to `preload_image`, in call order.
    pub fn preload_requests(&self) -> &[String] {
        &self.preload_requests
    }

    fn content_height(&self) -> f32 {
        self.text.len_lines() as f32 * self.line_height
    }

    fn max_scroll_top(&self) -> f32 {
        (self.content_height().max(self.client_height) - self.client_height).max(0.0)
    }
}

impl DocumentView for MemoryView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn document_id(&self) -> &str {
        &self.document_id
    }

    fn scroll_metrics(&self) -> Option<ScrollMetrics> {
        self.scrollable.then(|| ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_height: self.content_height().max(self.client_height),
            client_height: self.client_height,
        })
    }

    fn set_scroll_top(&mut self, scroll_top: f32) {
        let scroll_top = if scroll_top.is_finite() { scroll_top } else { 0.0 };
        self.scroll_top = scroll_top.clamp(0.0, self.max_scroll_top());
    }

    fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.text.len_lines() {
            return None;
        }
        let mut text = self.text.line(line).to_string();
        while text.ends_with(['\n', '\r']) {
            text.pop();
        }
        Some(text)
    }

    fn line_layout(&self, line: usize) -> Option<LineLayout> {
        (line < self.text.len_lines()).then(|| LineLayout {
            top: line as f32 * self.line_height,
            height: self.line_height,
        })
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    fn theme(&self) -> Color {
        self.background
    }

    fn subscribe(&mut self, kind: EventKind) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.insert(id, kind);
        id
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscriptions.remove(&subscription);
    }

    fn mount_overlay(&mut self, anchor: OverlayAnchor) -> bool {
        if !self.overlay_slot {
            return false;
        }
        self.overlay = Some(anchor);
        true
    }

    fn unmount_overlay(&mut self) {
        self.overlay = None;
    }

    fn measure_text(&self, text: &str, font_px: f32) -> Option<f32> {
        self.measure.map(|measure| measure(text, font_px))
    }

    fn preload_image(&mut self, reference: &str) -> Result<(), PreloadError> {
        self.preload_requests.push(reference.to_owned());
        if self.images.contains(reference) {
            Ok(())
        } else {
            Err(PreloadError::NotFound(reference.to_owned()))
        }
    }
}

/// A set of [`MemoryView`]s with one active view.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    views: BTreeMap<ViewId, MemoryView>,
    active: Option<ViewId>,
    next_view_id: u64,
}

impl MemoryHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new view; the first view opened becomes active.
    pub fn open(
        &mut self,
        document_id: impl Into<String>,
        text: &str,
        client_height: f32,
    ) -> ViewId {
        self.next_view_id += 1;
        let id = ViewId::new(self.next_view_id);
        self.insert(MemoryView::new(id, document_id, text, client_height));
        id
    }

    /// Add a preconfigured view, replacing any view with the same id.
    pub fn insert(&mut self, view: MemoryView) {
        let id = view.id();
        self.next_view_id = self.next_view_id.max(id.get());
        self.views.insert(id, view);
        self.active.get_or_insert(id);
    }

    /// Remove a view. If it was active, the first remaining view becomes active.
    pub fn close(&mut self, id: ViewId) -> Option<MemoryView> {
        let view = self.views.remove(&id)?;
        if self.active == Some(id) {
            self.active = self.views.keys().next().copied();
        }
        Some(view)
    }

    /// Make `id` the active view; returns `false` for unknown ids.
    pub fn set_active(&mut self, id: ViewId) -> bool {
        if !self.views.contains_key(&id) {
            return false;
        }
        self.active = Some(id);
        true
    }

    /// The active view's id.
    pub fn active_view_id(&self) -> Option<ViewId> {
        self.active
    }

    /// Shared access to a view.
    pub fn view(&self, id: ViewId) -> Option<&MemoryView> {
        self.views.get(&id)
    }
}

impl ViewHost for MemoryHost {
    type View = MemoryView;

    fn view_ids(&self) -> Vec<ViewId> {
        self.views.keys().copied().collect()
    }

    fn view_mut(&mut self, id: ViewId) -> Option<&mut MemoryView> {
        self.views.get_mut(&id)
    }

    fn active_document(&self) -> Option<String> {
        self.active
            .and_then(|id| self.views.get(&id))
            .map(|view| view.document_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_laid_out_uniformly() {
        let view = MemoryView::new(ViewId::new(1), "a.md", "one\r\ntwo\nthree", 100.0);
        assert_eq!(view.line_count(), 3);
        assert_eq!(view.line_text(0).as_deref(), Some("one"));
        assert_eq!(view.line_text(2).as_deref(), Some("three"));
        assert_eq!(view.line_text(3), None);
        assert_eq!(
            view.line_layout(1),
            Some(LineLayout {
                top: 20.0,
                height: 20.0
            })
        );
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let text = "x\n".repeat(99);
        let mut view = MemoryView::new(ViewId::new(1), "a.md", &text, 500.0);
        let metrics = view.scroll_metrics().unwrap();
        assert_eq!(metrics.scroll_height, 2000.0);
        view.set_scroll_top(5000.0);
        assert_eq!(view.scroll_top(), 1500.0);
        view.set_scroll_top(-3.0);
        assert_eq!(view.scroll_top(), 0.0);

        let short = MemoryView::new(ViewId::new(2), "b.md", "x", 500.0);
        assert_eq!(short.scroll_metrics().unwrap().scroll_height, 500.0);
    }

    #[test]
    fn subscriptions_are_tracked_per_handle() {
        let mut view = MemoryView::new(ViewId::new(1), "a.md", "", 10.0);
        let scroll = view.subscribe(EventKind::Scroll);
        view.subscribe(EventKind::PointerUp);
        assert!(view.is_subscribed(EventKind::Scroll));
        view.unsubscribe(scroll);
        assert!(!view.is_subscribed(EventKind::Scroll));
        assert_eq!(view.subscription_count(), 1);
    }

    #[test]
    fn host_tracks_the_active_view() {
        let mut host = MemoryHost::new();
        let a = host.open("a.md", "", 10.0);
        let b = host.open("b.md", "", 10.0);
        assert_eq!(host.active_document().as_deref(), Some("a.md"));
        assert!(host.set_active(b));
        assert_eq!(host.active_document().as_deref(), Some("b.md"));
        host.close(b);
        assert_eq!(host.active_view_id(), Some(a));
        assert_eq!(host.view_ids(), vec![a]);
    }
}
