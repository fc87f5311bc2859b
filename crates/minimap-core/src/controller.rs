//! Application-level coordination.
//!
//! [`MinimapController`] is the single owner of mutable state: the [`Settings`] record, its
//! [`SettingsStore`], the [`MinimapRegistry`] of per-view engines and the one context menu slot.
//! Hosts forward their view lifecycle and input events here.
//!
//! Every settings mutation follows the same sequence: update in memory, persist, then refresh
//! the minimap of every open view. A failed persist is logged and the refresh still happens,
//! so the in-memory state stays authoritative for the running session.
//!
//! # Example
//!
//! ```rust
//! use minimap_core::{MemoryHost, MemorySettingsStore, MinimapController};
//!
//! let mut host = MemoryHost::new();
//! let view = host.open("notes/a.md", "# Title\n\nbody", 400.0);
//!
//! let mut controller = MinimapController::new(MemorySettingsStore::new());
//! assert!(controller.on_view_opened(&mut host, view));
//!
//! controller.toggle_active_document(&mut host);
//! assert!(!controller.is_minimap_enabled_for_file("notes/a.md"));
//! assert!(!controller.engine(view).unwrap().is_visible());
//! ```

use crate::engine::{EngineResponse, MinimapEngine, MinimapEvent, UpdateOutcome};
use crate::error::SettingsError;
use crate::host::{ViewHost, ViewId};
use crate::menu::{ContextMenu, MenuChoice};
use crate::registry::MinimapRegistry;
use crate::settings::{Settings, SettingsStore};
use crate::settings_panel::{SettingKey, SettingValue};

/// Result of a click while a context menu may be open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuClick {
    /// No menu was open.
    NoMenu,
    /// The click landed outside the menu, which closed.
    Closed,
    /// An option was chosen, applied and persisted; the menu closed.
    Chosen(MenuChoice),
    /// The click hit a non-selectable row; the menu stays open.
    Ignored,
}

/// Owns settings, persistence, per-view engines and the context menu.
#[derive(Debug)]
pub struct MinimapController<S: SettingsStore> {
    settings: Settings,
    store: S,
    registry: MinimapRegistry,
    menu: Option<ContextMenu>,
}

impl<S: SettingsStore> MinimapController<S> {
    /// Load settings from `store` and start with no bound views.
    pub fn new(mut store: S) -> Self {
        let settings = store.load();
        Self {
            settings,
            store,
            registry: MinimapRegistry::new(),
            menu: None,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The settings store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the settings store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The engine registry.
    pub fn registry(&self) -> &MinimapRegistry {
        &self.registry
    }

    /// Engine bound to `view`.
    pub fn engine(&self, view: ViewId) -> Option<&MinimapEngine> {
        self.registry.get(view)
    }

    /// The open context menu.
    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    /// Persist the current settings.
    pub fn save_settings(&mut self) -> Result<(), SettingsError> {
        self.settings.sanitize();
        self.store.save(&self.settings)
    }

    /// Re-evaluate visibility and repaint the minimap of every open host view.
    ///
    /// Host views without a minimap get one, views whose engine is not attached yet (no
    /// scrollable region or overlay slot at open time) get another attach attempt, and
    /// engines of views the host no longer has are dropped.
    pub fn refresh_minimaps<H: ViewHost>(&mut self, host: &mut H) {
        let open = host.view_ids();
        for id in self.registry.view_ids() {
            if open.contains(&id) {
                continue;
            }
            if let Some(mut engine) = self.registry.remove(id) {
                tracing::debug!(view = id.get(), "dropping minimap of vanished view");
                engine.forget();
            }
            self.close_menu_for(id);
        }

        for id in open {
            let Some(view) = host.view_mut(id) else {
                continue;
            };
            let engine = self.registry.entry(id);
            if engine.is_attached() {
                engine.sync_visibility(view, &self.settings);
            } else {
                engine.attach(view, &self.settings);
            }
        }
    }

    /// Whether `document_id` is not in the disabled set.
    pub fn is_minimap_enabled_for_file(&self, document_id: &str) -> bool {
        self.settings.is_minimap_enabled_for_file(document_id)
    }

    /// Mutate settings, persist and refresh.
    pub fn update_settings<H, F>(&mut self, host: &mut H, change: F)
    where
        H: ViewHost,
        F: FnOnce(&mut Settings),
    {
        change(&mut self.settings);
        self.commit(host);
    }

    /// Enable or disable the minimap for one document.
    pub fn set_file_enabled<H: ViewHost>(
        &mut self,
        host: &mut H,
        document_id: &str,
        enabled: bool,
    ) {
        self.settings.set_file_enabled(document_id, enabled);
        self.commit(host);
    }

    /// Flip the minimap for the active document. Returns the new enabled state, or `None`
    /// without side effects when no document is active.
    pub fn toggle_active_document<H: ViewHost>(&mut self, host: &mut H) -> Option<bool> {
        let document_id = host.active_document()?;
        let enabled = self.settings.toggle_file(&document_id);
        tracing::debug!(document = %document_id, enabled, "minimap toggled for document");
        self.commit(host);
        Some(enabled)
    }

    /// Apply one settings panel change immediately: store, persist, repaint.
    pub fn apply_setting<H: ViewHost>(
        &mut self,
        host: &mut H,
        key: SettingKey,
        value: SettingValue,
    ) -> Result<SettingValue, SettingsError> {
        let stored = self.settings.apply(key, value)?;
        self.commit(host);
        Ok(stored)
    }

    /// Bind a minimap to a newly opened view.
    pub fn on_view_opened<H: ViewHost>(&mut self, host: &mut H, id: ViewId) -> bool {
        let Some(view) = host.view_mut(id) else {
            return false;
        };
        self.registry.entry(id).attach(view, &self.settings)
    }

    /// Release the minimap of a closing view. Works whether or not the host still has it.
    pub fn on_view_closed<H: ViewHost>(&mut self, host: &mut H, id: ViewId) {
        if let Some(mut engine) = self.registry.remove(id) {
            match host.view_mut(id) {
                Some(view) => {
                    engine.detach(view);
                }
                None => engine.forget(),
            }
        }
        self.close_menu_for(id);
    }

    /// The view now shows a different document: detach and attach again.
    pub fn on_document_swapped<H: ViewHost>(&mut self, host: &mut H, id: ViewId) -> bool {
        self.close_menu_for(id);
        let Some(view) = host.view_mut(id) else {
            return false;
        };
        let engine = self.registry.entry(id);
        engine.detach(view);
        engine.attach(view, &self.settings)
    }

    /// The active document changed: recheck visibility everywhere.
    pub fn on_active_document_changed<H: ViewHost>(&mut self, host: &mut H) {
        self.refresh_minimaps(host);
    }

    /// The document in `id` was edited.
    pub fn on_document_edited<H: ViewHost>(&mut self, host: &mut H, id: ViewId) -> UpdateOutcome {
        self.repaint(host, id)
    }

    /// The view in `id` was resized or re-laid out.
    pub fn on_view_resized<H: ViewHost>(&mut self, host: &mut H, id: ViewId) -> UpdateOutcome {
        self.repaint(host, id)
    }

    /// Route an input event to the view's engine. A context menu request opens the menu.
    pub fn handle_event<H: ViewHost>(
        &mut self,
        host: &mut H,
        id: ViewId,
        event: MinimapEvent,
    ) -> EngineResponse {
        let (Some(view), Some(engine)) = (host.view_mut(id), self.registry.get_mut(id)) else {
            return EngineResponse::Ignored;
        };
        let response = engine.handle_event(view, &self.settings, event);
        if let EngineResponse::OpenContextMenu { x, y } = response {
            self.open_context_menu(id, x, y);
        }
        response
    }

    /// Open the context menu for `view` at `(x, y)`, replacing any open menu.
    pub fn open_context_menu(&mut self, view: ViewId, x: f32, y: f32) -> &ContextMenu {
        if self.menu.is_some() {
            tracing::debug!("replacing open context menu");
        }
        self.menu.insert(ContextMenu::new(view, x, y, &self.settings))
    }

    /// Close the context menu; returns whether one was open.
    pub fn close_context_menu(&mut self) -> bool {
        self.menu.take().is_some()
    }

    /// Deliver a click to the open menu, if any.
    pub fn menu_click<H: ViewHost>(&mut self, host: &mut H, x: f32, y: f32) -> MenuClick {
        let Some(menu) = self.menu.as_ref() else {
            return MenuClick::NoMenu;
        };
        if !menu.contains(x, y) {
            self.menu = None;
            return MenuClick::Closed;
        }
        let Some(choice) = menu.choice_at(x, y) else {
            return MenuClick::Ignored;
        };
        self.menu = None;
        choice.apply(&mut self.settings);
        self.commit(host);
        MenuClick::Chosen(choice)
    }

    /// Detach every engine and close the menu.
    pub fn shutdown<H: ViewHost>(&mut self, host: &mut H) {
        for (id, mut engine) in self.registry.drain() {
            match host.view_mut(id) {
                Some(view) => {
                    engine.detach(view);
                }
                None => engine.forget(),
            }
        }
        self.menu = None;
        tracing::debug!("minimap controller shut down");
    }

    fn repaint<H: ViewHost>(&mut self, host: &mut H, id: ViewId) -> UpdateOutcome {
        match (host.view_mut(id), self.registry.get_mut(id)) {
            (Some(view), Some(engine)) => engine.update(view, &self.settings),
            _ => UpdateOutcome::Detached,
        }
    }

    fn commit<H: ViewHost>(&mut self, host: &mut H) {
        if let Err(err) = self.save_settings() {
            tracing::warn!(error = %err, "failed to persist minimap settings");
        }
        self.refresh_minimaps(host);
    }

    fn close_menu_for(&mut self, view: ViewId) {
        if self.menu.as_ref().is_some_and(|menu| menu.view_id() == view) {
            self.menu = None;
        }
    }
}
