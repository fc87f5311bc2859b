use minimap_core::engine::LINE_BATCH;
use minimap_core::memory::DEFAULT_BACKGROUND;
use minimap_core::{
    Color, DocumentView, EventKind, FrameStats, LineClass, LineLayout, MarkKind, MemoryView,
    MinimapEngine, OverlayAnchor, PaintOp, ScrollMetrics, Settings, SubscriptionId,
    UpdateOutcome, ViewId,
};
use pretty_assertions::assert_eq;

const SCENARIO: &str = "# Title\n\nplain text line\n```\ncode\n```";

fn attached(view: &mut MemoryView, settings: &Settings) -> MinimapEngine {
    let mut engine = MinimapEngine::new();
    assert!(engine.attach(view, settings));
    engine
}

fn line_fills(engine: &MinimapEngine) -> Vec<(LineClass, usize, Color)> {
    engine
        .display_list()
        .iter()
        .filter_map(|op| match *op {
            PaintOp::Fill {
                kind: MarkKind::Line(class),
                line: Some(line),
                color,
                ..
            } => Some((class, line, color)),
            _ => None,
        })
        .collect()
}

fn indicator_ops(engine: &MinimapEngine) -> Vec<PaintOp> {
    engine
        .display_list()
        .iter()
        .filter(|op| op.kind() == Some(MarkKind::ViewportIndicator))
        .copied()
        .collect()
}

#[test]
fn test_scenario_document_paints_one_mark_per_content_line() {
    let settings = Settings::default();
    let mut view = MemoryView::new(ViewId::new(1), "notes/a.md", SCENARIO, 120.0);
    let engine = attached(&mut view, &settings);

    let fills = line_fills(&engine);
    assert_eq!(
        fills,
        vec![
            (LineClass::Header(1), 0, Color::rgb(0xFF, 0x00, 0x00)),
            (LineClass::PlainText, 2, settings.text_color),
            (LineClass::CodeFence, 3, settings.code_block_color),
            (LineClass::PlainText, 4, settings.text_color),
            (LineClass::CodeFence, 5, settings.code_block_color),
        ]
    );
    assert_eq!(
        engine.display_list().first(),
        Some(&PaintOp::Clear {
            color: DEFAULT_BACKGROUND
        })
    );
    assert_eq!(indicator_ops(&engine).len(), 2);
}

#[test]
fn test_marks_follow_document_layout() {
    let settings = Settings::default();
    // 6 lines * 20px = 120px of content in a 60px viewport: scale 0.5
    let mut view = MemoryView::new(ViewId::new(1), "notes/a.md", SCENARIO, 60.0);
    let engine = attached(&mut view, &settings);

    let rects: Vec<f32> = engine
        .display_list()
        .iter()
        .filter_map(|op| match op {
            PaintOp::Fill {
                kind: MarkKind::Line(_),
                rect,
                ..
            } => Some(rect.y),
            _ => None,
        })
        .collect();
    assert_eq!(rects, vec![0.0, 20.0, 30.0, 40.0, 50.0]);

    let surface = engine.surface().unwrap();
    assert_eq!(surface.css_width(), 120.0);
    assert_eq!(surface.css_height(), 60.0);
    assert_eq!(surface.opacity(), settings.minimap_opacity);
}

#[test]
fn test_update_is_idempotent() {
    let settings = Settings::default();
    let text = "# Doc\n| a | b |\n![[x.png]]\n![[note]]\n    indented\n".repeat(40);
    let mut view = MemoryView::new(ViewId::new(1), "doc.md", &text, 300.0);
    let mut engine = attached(&mut view, &settings);

    let first_pixels = engine.surface().unwrap().pixels().to_vec();
    let first_ops = engine.display_list().to_vec();
    engine.update(&view, &settings);
    engine.update(&view, &settings);

    assert_eq!(engine.display_list(), first_ops.as_slice());
    assert!(engine.surface().unwrap().pixels() == first_pixels.as_slice());
}

#[test]
fn test_show_minimap_false_hides_without_painting() {
    let mut settings = Settings::default();
    let mut view = MemoryView::new(ViewId::new(1), "doc.md", SCENARIO, 120.0);
    let mut engine = attached(&mut view, &settings);
    assert!(engine.is_visible());

    settings.show_minimap = false;
    assert_eq!(engine.update(&view, &settings), UpdateOutcome::Hidden);
    assert!(engine.display_list().is_empty());
    assert!(!engine.is_visible());
    assert!(engine.is_attached());

    settings.show_minimap = true;
    assert!(matches!(
        engine.update(&view, &settings),
        UpdateOutcome::Painted(_)
    ));
    assert!(engine.is_visible());
}

#[test]
fn test_disabled_document_is_hidden_even_when_minimap_is_shown() {
    let mut settings = Settings::default();
    settings.set_file_enabled("notes/a.md", false);
    let mut view = MemoryView::new(ViewId::new(1), "notes/a.md", SCENARIO, 120.0);
    let mut engine = attached(&mut view, &settings);

    assert!(!engine.is_visible());
    assert!(engine.display_list().is_empty());
    assert_eq!(
        engine.sync_visibility(&view, &settings),
        UpdateOutcome::Hidden
    );

    settings.set_file_enabled("notes/a.md", true);
    assert!(matches!(
        engine.sync_visibility(&view, &settings),
        UpdateOutcome::Painted(_)
    ));
    assert!(engine.is_visible());
}

#[test]
fn test_disabled_rules_fall_through_to_plain_text() {
    let mut settings = Settings::default();
    settings.show_headers = false;
    settings.show_code_blocks = false;
    let mut view = MemoryView::new(ViewId::new(1), "doc.md", SCENARIO, 120.0);
    let engine = attached(&mut view, &settings);

    let classes: Vec<LineClass> = line_fills(&engine).into_iter().map(|f| f.0).collect();
    assert_eq!(classes, vec![LineClass::PlainText; 5]);
}

#[test]
fn test_indicator_tracks_scroll_and_respects_zero_opacity() {
    let mut settings = Settings::default();
    let text = "line\n".repeat(99);
    // 100 lines * 20px = 2000px; 500px viewport: scale 0.25
    let mut view = MemoryView::new(ViewId::new(1), "doc.md", &text, 500.0);
    let mut engine = attached(&mut view, &settings);

    view.set_scroll_top(800.0);
    engine.update(&view, &settings);
    let ops = indicator_ops(&engine);
    match ops.as_slice() {
        [
            PaintOp::Fill { rect, color, .. },
            PaintOp::Stroke {
                color: outline, ..
            },
        ] => {
            assert_eq!(rect.y, 200.0);
            assert_eq!(rect.height, 125.0);
            assert_eq!(rect.width, 120.0);
            assert_eq!(*color, Color::WHITE.with_opacity(0.3));
            assert_eq!(*outline, Color::WHITE.with_opacity(0.8));
        }
        other => panic!("unexpected indicator ops: {other:?}"),
    }

    settings.indicator_opacity = 0.0;
    engine.update(&view, &settings);
    assert!(indicator_ops(&engine).is_empty());
}

#[test]
fn test_indicator_outline_is_never_fainter_than_its_fill() {
    let mut settings = Settings::default();
    settings.indicator_opacity = 0.95;
    let mut view = MemoryView::new(ViewId::new(1), "doc.md", "line", 100.0);
    let engine = attached(&mut view, &settings);

    let outline = indicator_ops(&engine).iter().find_map(|op| match op {
        PaintOp::Stroke { color, .. } => Some(*color),
        _ => None,
    });
    assert_eq!(outline, Some(Color::WHITE.with_opacity(0.95)));
}

#[test]
fn test_batches_paint_every_line_once_in_order() {
    let line_count = 2 * LINE_BATCH + 276;
    let text = (0..line_count)
        .map(|i| format!("line {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    let settings = Settings::default();
    // 1px lines in a viewport taller than the document: nothing is culled.
    let mut view = MemoryView::new(ViewId::new(1), "doc.md", &text, 2000.0).with_line_height(1.0);
    let mut engine = attached(&mut view, &settings);

    let lines: Vec<usize> = line_fills(&engine).into_iter().map(|f| f.1).collect();
    assert_eq!(lines, (0..line_count).collect::<Vec<_>>());
    assert_eq!(
        engine.update(&view, &settings),
        UpdateOutcome::Painted(FrameStats {
            lines_painted: line_count,
            lines_culled: 0,
            indicator: true,
        })
    );
}

/// Reports a scroll height shorter than the laid-out content.
struct ClippedView {
    inner: MemoryView,
    scroll_height: f32,
}

impl DocumentView for ClippedView {
    fn id(&self) -> ViewId {
        self.inner.id()
    }

    fn document_id(&self) -> &str {
        self.inner.document_id()
    }

    fn scroll_metrics(&self) -> Option<ScrollMetrics> {
        let metrics = self.inner.scroll_metrics()?;
        Some(ScrollMetrics {
            scroll_height: self.scroll_height,
            ..metrics
        })
    }

    fn set_scroll_top(&mut self, scroll_top: f32) {
        self.inner.set_scroll_top(scroll_top);
    }

    fn line_count(&self) -> usize {
        self.inner.line_count()
    }

    fn line_text(&self, line: usize) -> Option<String> {
        self.inner.line_text(line)
    }

    fn line_layout(&self, line: usize) -> Option<LineLayout> {
        self.inner.line_layout(line)
    }

    fn theme(&self) -> Color {
        self.inner.theme()
    }

    fn subscribe(&mut self, kind: EventKind) -> SubscriptionId {
        self.inner.subscribe(kind)
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.inner.unsubscribe(subscription);
    }

    fn mount_overlay(&mut self, anchor: OverlayAnchor) -> bool {
        self.inner.mount_overlay(anchor)
    }

    fn unmount_overlay(&mut self) {
        self.inner.unmount_overlay();
    }
}

#[test]
fn test_lines_laid_out_past_the_surface_are_culled() {
    let settings = Settings::default();
    // Ten 20px lines, but only 100px of scroll height: scale 1 on a 100px surface.
    let text = vec!["body"; 10].join("\n");
    let mut view = ClippedView {
        inner: MemoryView::new(ViewId::new(1), "doc.md", &text, 100.0),
        scroll_height: 100.0,
    };
    let mut engine = MinimapEngine::new();
    assert!(engine.attach(&mut view, &settings));

    let outcome = engine.update(&view, &settings);
    let UpdateOutcome::Painted(stats) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!((stats.lines_painted, stats.lines_culled), (5, 5));
    let lines: Vec<usize> = line_fills(&engine).into_iter().map(|f| f.1).collect();
    assert_eq!(lines, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_generic_embeds_get_a_translucent_fill_and_an_outline() {
    let settings = Settings::default();
    let mut view = MemoryView::new(ViewId::new(1), "doc.md", "![[Meeting notes]]", 100.0);
    let engine = attached(&mut view, &settings);

    let embed_ops: Vec<PaintOp> = engine
        .display_list()
        .iter()
        .filter(|op| op.kind() == Some(MarkKind::Line(LineClass::GenericEmbed)))
        .copied()
        .collect();
    assert!(matches!(
        embed_ops.as_slice(),
        [PaintOp::Fill { color: fill, .. }, PaintOp::Stroke { color: stroke, .. }]
            if *fill == settings.embed_color.with_opacity(0.4) && *stroke == settings.embed_color
    ));
}

#[test]
fn test_surface_scales_with_device_pixel_ratio_and_scaling() {
    let mut settings = Settings::default();
    settings.minimap_scaling = 0.5;
    let mut view =
        MemoryView::new(ViewId::new(1), "doc.md", SCENARIO, 200.0).with_device_pixel_ratio(2.0);
    let engine = attached(&mut view, &settings);

    let surface = engine.surface().unwrap();
    assert_eq!((surface.css_width(), surface.css_height()), (60.0, 100.0));
    assert_eq!((surface.pixel_width(), surface.pixel_height()), (120, 200));
    assert_eq!(surface.pixels().len(), 120 * 200 * 4);
}

#[test]
fn test_header_width_uses_host_measurement() {
    let settings = Settings::default();
    let mut view = MemoryView::new(ViewId::new(1), "doc.md", "## Hello", 100.0)
        .with_text_measure(|text, _| text.chars().count() as f32 * 4.0);
    let engine = attached(&mut view, &settings);

    let width = engine.display_list().iter().find_map(|op| match op {
        PaintOp::Fill {
            kind: MarkKind::Line(LineClass::Header(2)),
            rect,
            ..
        } => Some(rect.width),
        _ => None,
    });
    assert_eq!(width, Some(5.0 * 4.0 + 4.0));
}

#[test]
fn test_theme_background_fills_unpainted_pixels() {
    let mut settings = Settings::default();
    settings.indicator_opacity = 0.0;
    let background = Color::rgb(0x10, 0x20, 0x30);
    let mut view =
        MemoryView::new(ViewId::new(1), "doc.md", "x", 100.0).with_background(background);
    let engine = attached(&mut view, &settings);

    let surface = engine.surface().unwrap();
    assert_eq!(surface.pixel(119, 99), Some(background));
    assert_eq!(surface.pixel(5, 0), Some(settings.text_color));
}
