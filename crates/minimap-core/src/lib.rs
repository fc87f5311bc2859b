#![warn(missing_docs)]
//! Minimap Core - Headless Document Minimap Engine
//!
//! # Overview
//!
//! `minimap-core` projects a document onto a narrow raster overview strip. Each line is
//! classified from its text (header, code fence, table row, embed, plain text) and painted as a
//! colored mark scaled to the strip's height; a translucent indicator shows the visible region,
//! and clicks or drags on the strip scroll the document.
//!
//! The crate owns no UI. A host exposes its views through [`DocumentView`] / [`ViewHost`] and
//! composites each engine's [`RasterSurface`] wherever it likes.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  MinimapController (settings, menu, views)  │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  MinimapRegistry → MinimapEngine per view   │  ← Lifecycle & Events
//! ├─────────────────────────────────────────────┤
//! │  Projection Geometry + Line Classification  │  ← Layout
//! ├─────────────────────────────────────────────┤
//! │  RasterSurface (RGBA, device pixel ratio)   │  ← Pixels
//! ├─────────────────────────────────────────────┤
//! │  Settings + SettingsStore (JSON)            │  ← Configuration
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use minimap_core::{MemoryHost, MemorySettingsStore, MinimapController, MinimapEvent};
//!
//! let text = "# Title\n\nplain text line\n```\ncode\n```\n".repeat(50);
//! let mut host = MemoryHost::new();
//! let view = host.open("notes/a.md", &text, 300.0);
//!
//! let mut controller = MinimapController::new(MemorySettingsStore::new());
//! controller.on_view_opened(&mut host, view);
//!
//! // Click the middle of the strip: the viewport centers on the middle of the document.
//! controller.handle_event(&mut host, view, MinimapEvent::PointerDown { y: 150.0 });
//! controller.handle_event(&mut host, view, MinimapEvent::PointerUp);
//!
//! let engine = controller.engine(view).unwrap();
//! assert!(engine.is_visible());
//! assert!(!engine.display_list().is_empty());
//! ```
//!
//! # Module Description
//!
//! - [`settings`] - configuration record, bounds, JSON stores
//! - [`settings_panel`] - labeled controls with typed get/apply
//! - [`classify`] - per-line classification
//! - [`geometry`] - surface sizing, mark geometry, reverse mapping
//! - [`surface`] - tiny-skia raster surface
//! - [`host`] - traits a host implements
//! - [`engine`] - per-view projection engine
//! - [`menu`] - scale/opacity context menu
//! - [`registry`] - view to engine map
//! - [`controller`] - application-level coordination
//! - [`memory`] - in-memory reference host

pub mod classify;
pub mod color;
pub mod controller;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod host;
pub mod memory;
pub mod menu;
pub mod registry;
pub mod settings;
pub mod settings_panel;
pub mod surface;

pub use classify::{ClassifyOptions, LineClass, classify, classify_with};
pub use color::Color;
pub use controller::{MenuClick, MinimapController};
pub use engine::{
    EngineResponse, FrameStats, ImageStatus, MarkKind, MinimapEngine, MinimapEvent, PaintOp,
    Subscription, UpdateOutcome,
};
pub use error::{ColorParseError, PreloadError, SettingsError};
pub use geometry::{Rect, ScrollMetrics, SurfaceSize, scroll_target};
pub use host::{
    DocumentView, EventKind, LineLayout, OverlayAnchor, SubscriptionId, ViewHost, ViewId,
};
pub use memory::{MemoryHost, MemoryView};
pub use menu::{ContextMenu, MenuChoice, MenuGroup};
pub use registry::MinimapRegistry;
pub use settings::{JsonSettingsStore, MemorySettingsStore, Settings, SettingsStore};
pub use settings_panel::{ControlKind, SettingControl, SettingKey, SettingValue, controls};
pub use surface::RasterSurface;
