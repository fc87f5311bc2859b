//! Minimap context menu.
//!
//! The menu is a plain model: a column of rows anchored at the right-click position. Hosts draw
//! it from [`ContextMenu::rows`] and hand clicks back through
//! [`MinimapController::menu_click`](crate::MinimapController::menu_click).

use crate::geometry::Rect;
use crate::host::ViewId;
use crate::settings::Settings;

/// Row height in logical px.
pub const ITEM_HEIGHT: f32 = 20.0;
/// Menu width in logical px.
pub const MENU_WIDTH: f32 = 120.0;
/// Selectable fractions, in menu order.
pub const MENU_STEPS: [f32; 10] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// An option group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuGroup {
    /// `minimapScaling`
    Scale,
    /// `minimapOpacity`
    Opacity,
}

impl MenuGroup {
    /// Group title.
    pub fn title(self) -> &'static str {
        match self {
            MenuGroup::Scale => "Scale",
            MenuGroup::Opacity => "Opacity",
        }
    }

    fn current(self, settings: &Settings) -> f32 {
        match self {
            MenuGroup::Scale => settings.minimap_scaling,
            MenuGroup::Opacity => settings.minimap_opacity,
        }
    }
}

/// A selected option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuChoice {
    /// Set `minimapScaling`.
    Scale(f32),
    /// Set `minimapOpacity`.
    Opacity(f32),
}

impl MenuChoice {
    /// Write the choice into `settings` (clamped like any other update).
    pub fn apply(self, settings: &mut Settings) {
        match self {
            MenuChoice::Scale(value) => settings.set_minimap_scaling(value),
            MenuChoice::Opacity(value) => settings.set_minimap_opacity(value),
        }
    }
}

/// What a row shows.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuRowKind {
    /// Non-selectable group title.
    Heading(MenuGroup),
    /// A selectable option.
    Item {
        /// Value written when chosen.
        choice: MenuChoice,
        /// Whether this is the current value.
        checked: bool,
    },
}

/// One laid-out row.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuRow {
    /// Display text.
    pub label: String,
    /// Row content.
    pub kind: MenuRowKind,
    /// Row rectangle.
    pub rect: Rect,
}

/// An open context menu.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    view: ViewId,
    rows: Vec<MenuRow>,
    bounds: Rect,
}

impl ContextMenu {
    /// Lay out the menu for `view` at `(x, y)`, marking the current values from `settings`.
    pub fn new(view: ViewId, x: f32, y: f32, settings: &Settings) -> Self {
        let mut rows = Vec::with_capacity(2 * (MENU_STEPS.len() + 1));
        for group in [MenuGroup::Scale, MenuGroup::Opacity] {
            rows.push((group.title().to_owned(), MenuRowKind::Heading(group)));
            let current = group.current(settings);
            for step in MENU_STEPS {
                let choice = match group {
                    MenuGroup::Scale => MenuChoice::Scale(step),
                    MenuGroup::Opacity => MenuChoice::Opacity(step),
                };
                let percent = (step * 100.0).round();
                rows.push((
                    format!("{percent}%"),
                    MenuRowKind::Item {
                        choice,
                        checked: (current - step).abs() < 0.005,
                    },
                ));
            }
        }

        let rows: Vec<MenuRow> = rows
            .into_iter()
            .enumerate()
            .map(|(i, (label, kind))| MenuRow {
                label,
                kind,
                rect: Rect::new(x, y + i as f32 * ITEM_HEIGHT, MENU_WIDTH, ITEM_HEIGHT),
            })
            .collect();
        let bounds = Rect::new(x, y, MENU_WIDTH, rows.len() as f32 * ITEM_HEIGHT);
        Self { view, rows, bounds }
    }

    /// The view the menu was opened on.
    pub fn view_id(&self) -> ViewId {
        self.view
    }

    /// Rows in display order.
    pub fn rows(&self) -> &[MenuRow] {
        &self.rows
    }

    /// Outer rectangle.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether `(x, y)` is inside the menu.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.bounds.contains(x, y)
    }

    /// The row under `(x, y)`.
    pub fn row_at(&self, x: f32, y: f32) -> Option<&MenuRow> {
        self.rows.iter().find(|row| row.rect.contains(x, y))
    }

    /// The option under `(x, y)`; headings yield `None`.
    pub fn choice_at(&self, x: f32, y: f32) -> Option<MenuChoice> {
        match self.row_at(x, y)?.kind {
            MenuRowKind::Item { choice, .. } => Some(choice),
            MenuRowKind::Heading(_) => None,
        }
    }

    /// The checked option of `group`, if the current value is one of the steps.
    pub fn checked(&self, group: MenuGroup) -> Option<MenuChoice> {
        self.rows.iter().find_map(|row| match row.kind {
            MenuRowKind::Item {
                choice,
                checked: true,
            } => {
                let matches = matches!(
                    (group, choice),
                    (MenuGroup::Scale, MenuChoice::Scale(_))
                        | (MenuGroup::Opacity, MenuChoice::Opacity(_))
                );
                matches.then_some(choice)
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_groups_of_ten_steps() {
        let menu = ContextMenu::new(ViewId::new(1), 0.0, 0.0, &Settings::default());
        let items = menu
            .rows()
            .iter()
            .filter(|row| matches!(row.kind, MenuRowKind::Item { .. }))
            .count();
        assert_eq!(items, 20);
        assert_eq!(menu.rows()[0].label, "Scale");
        assert_eq!(menu.rows()[1].label, "10%");
        assert_eq!(menu.rows()[11].label, "Opacity");
        assert_eq!(menu.bounds().height, 22.0 * ITEM_HEIGHT);
    }

    #[test]
    fn current_values_are_checked() {
        let mut settings = Settings::default();
        settings.minimap_scaling = 0.3;
        settings.minimap_opacity = 0.9;
        let menu = ContextMenu::new(ViewId::new(1), 0.0, 0.0, &settings);
        assert_eq!(menu.checked(MenuGroup::Scale), Some(MenuChoice::Scale(0.3)));
        assert_eq!(
            menu.checked(MenuGroup::Opacity),
            Some(MenuChoice::Opacity(0.9))
        );

        settings.minimap_opacity = 0.55;
        let menu = ContextMenu::new(ViewId::new(1), 0.0, 0.0, &settings);
        assert_eq!(menu.checked(MenuGroup::Opacity), None);
    }

    #[test]
    fn hit_testing_maps_rows_to_choices() {
        let menu = ContextMenu::new(ViewId::new(1), 10.0, 50.0, &Settings::default());
        assert_eq!(menu.choice_at(20.0, 55.0), None);
        assert_eq!(menu.choice_at(20.0, 75.0), Some(MenuChoice::Scale(0.1)));
        assert_eq!(
            menu.choice_at(20.0, 50.0 + 12.0 * ITEM_HEIGHT + 1.0),
            Some(MenuChoice::Opacity(0.1))
        );
        assert!(!menu.contains(5.0, 60.0));
        assert!(menu.choice_at(10.0 + MENU_WIDTH + 1.0, 75.0).is_none());
    }

    #[test]
    fn choices_write_clamped_settings() {
        let mut settings = Settings::default();
        MenuChoice::Scale(0.5).apply(&mut settings);
        MenuChoice::Opacity(0.2).apply(&mut settings);
        assert_eq!(settings.minimap_scaling, 0.5);
        assert_eq!(settings.minimap_opacity, 0.2);
    }
}
