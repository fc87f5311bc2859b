//! Minimap configuration model.
//!
//! [`Settings`] is a flat record: geometry, visibility flags, a color table and the per-file
//! disabled set. The engine only ever reads it; the [`MinimapController`](crate::MinimapController)
//! owns the single mutable copy and persists it through a [`SettingsStore`].
//!
//! # Persisted layout
//!
//! The record is written as one JSON object with camelCase keys. Loading is tolerant:
//!
//! - missing or unknown keys fall back to [`Settings::default`]
//! - a key whose value has the wrong shape falls back to its default, the rest still loads
//! - a non-list `disabledFiles` is discarded
//! - numbers are clamped to their documented bounds after loading
//!
//! # Example
//!
//! ```rust
//! use minimap_core::Settings;
//!
//! let json = serde_json::json!({ "width": 9999, "disabledFiles": "oops" });
//! let settings = Settings::from_json_value(&json);
//! assert_eq!(settings.width, 400.0);
//! assert!(settings.disabled_files.is_empty());
//! ```

use crate::color::Color;
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Number of header levels with their own color.
pub const HEADER_LEVELS: usize = 6;

/// Inclusive bounds of a numeric setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest accepted value.
    pub min: f32,
    /// Largest accepted value.
    pub max: f32,
}

impl Bounds {
    const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the bounds. Non-finite input yields `fallback`.
    pub fn clamp(self, value: f32, fallback: f32) -> f32 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            fallback
        }
    }
}

/// Bounds of `width` (logical px).
pub const WIDTH_BOUNDS: Bounds = Bounds::new(40.0, 400.0);
/// Bounds of `minimapScaling`.
pub const SCALING_BOUNDS: Bounds = Bounds::new(0.1, 1.0);
/// Bounds of `lineHeight` (logical px).
pub const LINE_HEIGHT_BOUNDS: Bounds = Bounds::new(0.5, 20.0);
/// Bounds of `lineSpacing` (multiplier).
pub const LINE_SPACING_BOUNDS: Bounds = Bounds::new(0.5, 4.0);
/// Bounds of `textDensity` (logical px per character).
pub const TEXT_DENSITY_BOUNDS: Bounds = Bounds::new(0.05, 5.0);
/// Bounds of `density`.
pub const DENSITY_BOUNDS: Bounds = Bounds::new(0.1, 4.0);
/// Bounds of `minElementWidth` / `minElementHeight` (logical px).
pub const MIN_ELEMENT_BOUNDS: Bounds = Bounds::new(0.0, 20.0);
/// Bounds of both opacity settings.
pub const OPACITY_BOUNDS: Bounds = Bounds::new(0.0, 1.0);

/// Default level 1..=6 header colors.
pub const DEFAULT_HEADER_COLORS: [Color; HEADER_LEVELS] = [
    Color::rgb(0xFF, 0x00, 0x00),
    Color::rgb(0xFF, 0x80, 0x00),
    Color::rgb(0xFF, 0xD7, 0x00),
    Color::rgb(0x00, 0xC8, 0x53),
    Color::rgb(0x00, 0xB0, 0xFF),
    Color::rgb(0xAA, 0x66, 0xFF),
];

/// Fallback header color for levels without their own entry.
pub const DEFAULT_HEADER_COLOR: Color = Color::rgb(0xE0, 0x6C, 0x75);

/// Minimap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Global on/off switch.
    pub show_minimap: bool,
    /// Logical surface width before scaling.
    pub width: f32,
    /// Overall surface scale, applied to width and height.
    pub minimap_scaling: f32,
    /// Base mark height in logical px.
    pub line_height: f32,
    /// Multiplier applied to `line_height`.
    pub line_spacing: f32,
    /// Logical px per character of line content.
    pub text_density: f32,
    /// Reserved; accepted and persisted but not consulted by any paint rule.
    pub density: f32,
    /// Reserved; accepted and persisted but not consulted by any paint rule.
    pub min_element_width: f32,
    /// Reserved; accepted and persisted but not consulted by any paint rule.
    pub min_element_height: f32,
    /// Paint `#` headers with header marks.
    pub show_headers: bool,
    /// Reserved; list items have no distinct paint rule.
    pub show_lists: bool,
    /// Paint code fence delimiter lines with fence marks.
    pub show_code_blocks: bool,
    /// Plain text mark color.
    pub text_color: Color,
    /// Per-level header colors, index 0 is level 1.
    pub header_colors: [Color; HEADER_LEVELS],
    /// Header color used when no level-specific color applies.
    pub header_color: Color,
    /// Code fence mark color.
    pub code_block_color: Color,
    /// Table row mark color.
    pub table_color: Color,
    /// Image embed mark color.
    pub image_color: Color,
    /// Generic embed mark color.
    pub embed_color: Color,
    /// Viewport indicator color.
    pub indicator_color: Color,
    /// Opacity of the whole minimap overlay.
    pub minimap_opacity: f32,
    /// Fill opacity of the viewport indicator; `0` hides it.
    pub indicator_opacity: f32,
    /// Document identifiers the minimap is suppressed for.
    pub disabled_files: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_minimap: true,
            width: 120.0,
            minimap_scaling: 1.0,
            line_height: 2.0,
            line_spacing: 1.0,
            text_density: 0.6,
            density: 1.0,
            min_element_width: 1.0,
            min_element_height: 1.0,
            show_headers: true,
            show_lists: true,
            show_code_blocks: true,
            text_color: Color::rgb(0x88, 0x88, 0x88),
            header_colors: DEFAULT_HEADER_COLORS,
            header_color: DEFAULT_HEADER_COLOR,
            code_block_color: Color::rgb(0x4E, 0xC9, 0xB0),
            table_color: Color::rgb(0x9C, 0xDC, 0xFE),
            image_color: Color::rgb(0xC5, 0x86, 0xC0),
            embed_color: Color::rgb(0xDC, 0xDC, 0xAA),
            indicator_color: Color::rgb(0xFF, 0xFF, 0xFF),
            minimap_opacity: 0.9,
            indicator_opacity: 0.3,
            disabled_files: BTreeSet::new(),
        }
    }
}

impl Settings {
    /// Build settings from a persisted JSON value, recovering field by field.
    pub fn from_json_value(value: &serde_json::Value) -> Self {
        let mut settings = Settings::default();
        let Some(obj) = value.as_object() else {
            tracing::warn!("settings root is not an object; using defaults");
            return settings;
        };

        macro_rules! load_field {
            ($key:literal => $field:ident) => {
                if let Some(raw) = obj.get($key) {
                    match serde_json::from_value(raw.clone()) {
                        Ok(parsed) => settings.$field = parsed,
                        Err(err) => {
                            tracing::warn!(key = $key, error = %err, "ignoring malformed setting")
                        }
                    }
                }
            };
        }

        load_field!("showMinimap" => show_minimap);
        load_field!("width" => width);
        load_field!("minimapScaling" => minimap_scaling);
        load_field!("lineHeight" => line_height);
        load_field!("lineSpacing" => line_spacing);
        load_field!("textDensity" => text_density);
        load_field!("density" => density);
        load_field!("minElementWidth" => min_element_width);
        load_field!("minElementHeight" => min_element_height);
        load_field!("showHeaders" => show_headers);
        load_field!("showLists" => show_lists);
        load_field!("showCodeBlocks" => show_code_blocks);
        load_field!("textColor" => text_color);
        load_field!("headerColor" => header_color);
        load_field!("codeBlockColor" => code_block_color);
        load_field!("tableColor" => table_color);
        load_field!("imageColor" => image_color);
        load_field!("embedColor" => embed_color);
        load_field!("indicatorColor" => indicator_color);
        load_field!("minimapOpacity" => minimap_opacity);
        load_field!("indicatorOpacity" => indicator_opacity);

        // Per-entry recovery: a bad level keeps its default, the others still load.
        match obj.get("headerColors") {
            Some(serde_json::Value::Array(entries)) => {
                for (slot, entry) in settings.header_colors.iter_mut().zip(entries) {
                    match serde_json::from_value::<Color>(entry.clone()) {
                        Ok(color) => *slot = color,
                        Err(err) => {
                            tracing::warn!(error = %err, "ignoring malformed header color")
                        }
                    }
                }
            }
            Some(_) => tracing::warn!("headerColors is not a list; using defaults"),
            None => {}
        }

        match obj.get("disabledFiles") {
            Some(serde_json::Value::Array(entries)) => {
                settings.disabled_files = entries
                    .iter()
                    .filter_map(|entry| entry.as_str().map(str::to_owned))
                    .collect();
            }
            Some(_) => tracing::warn!("disabledFiles is not a list; discarding it"),
            None => {}
        }

        settings.sanitize();
        settings
    }

    /// Clamp every numeric field into its bounds; non-finite values reset to defaults.
    pub fn sanitize(&mut self) {
        let defaults = Settings::default();
        self.width = WIDTH_BOUNDS.clamp(self.width, defaults.width);
        self.minimap_scaling = SCALING_BOUNDS.clamp(self.minimap_scaling, defaults.minimap_scaling);
        self.line_height = LINE_HEIGHT_BOUNDS.clamp(self.line_height, defaults.line_height);
        self.line_spacing = LINE_SPACING_BOUNDS.clamp(self.line_spacing, defaults.line_spacing);
        self.text_density = TEXT_DENSITY_BOUNDS.clamp(self.text_density, defaults.text_density);
        self.density = DENSITY_BOUNDS.clamp(self.density, defaults.density);
        self.min_element_width =
            MIN_ELEMENT_BOUNDS.clamp(self.min_element_width, defaults.min_element_width);
        self.min_element_height =
            MIN_ELEMENT_BOUNDS.clamp(self.min_element_height, defaults.min_element_height);
        self.minimap_opacity = OPACITY_BOUNDS.clamp(self.minimap_opacity, defaults.minimap_opacity);
        self.indicator_opacity =
            OPACITY_BOUNDS.clamp(self.indicator_opacity, defaults.indicator_opacity);
    }

    /// Serialize to the persisted JSON layout.
    pub fn to_json_value(&self) -> Result<serde_json::Value, SettingsError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Color for a header of the given level; levels outside `1..=6` use the fallback.
    pub fn header_color_for(&self, level: u8) -> Color {
        usize::from(level)
            .checked_sub(1)
            .and_then(|idx| self.header_colors.get(idx))
            .copied()
            .unwrap_or(self.header_color)
    }

    /// Mark height in logical px: `lineHeight × lineSpacing`.
    pub fn mark_line_height(&self) -> f32 {
        self.line_height * self.line_spacing
    }

    /// Whether the minimap should render for `document_id`.
    pub fn is_minimap_enabled_for_file(&self, document_id: &str) -> bool {
        !self.disabled_files.contains(document_id)
    }

    /// Add or remove `document_id` from the disabled set.
    pub fn set_file_enabled(&mut self, document_id: &str, enabled: bool) {
        if enabled {
            self.disabled_files.remove(document_id);
        } else {
            self.disabled_files.insert(document_id.to_owned());
        }
    }

    /// Flip `document_id`'s membership in the disabled set and return the new enabled state.
    pub fn toggle_file(&mut self, document_id: &str) -> bool {
        let enabled = !self.is_minimap_enabled_for_file(document_id);
        self.set_file_enabled(document_id, enabled);
        enabled
    }

    /// Set `minimapScaling`, clamped to `[0.1, 1]`.
    pub fn set_minimap_scaling(&mut self, value: f32) {
        self.minimap_scaling = SCALING_BOUNDS.clamp(value, self.minimap_scaling);
    }

    /// Set `minimapOpacity`, clamped to `[0, 1]`.
    pub fn set_minimap_opacity(&mut self, value: f32) {
        self.minimap_opacity = OPACITY_BOUNDS.clamp(value, self.minimap_opacity);
    }

    /// Set `indicatorOpacity`, clamped to `[0, 1]`.
    pub fn set_indicator_opacity(&mut self, value: f32) {
        self.indicator_opacity = OPACITY_BOUNDS.clamp(value, self.indicator_opacity);
    }
}

/// Persistence hook for [`Settings`].
///
/// `save` is called with the whole record after every mutation; the controller broadcasts a
/// repaint only after it returns.
pub trait SettingsStore {
    /// Load settings, falling back to defaults for anything missing or malformed.
    fn load(&mut self) -> Settings;

    /// Persist the whole record.
    fn save(&mut self, settings: &Settings) -> Result<(), SettingsError>;
}

/// A store that keeps the persisted JSON in memory.
///
/// Useful for hosts without durable storage and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    persisted: Option<serde_json::Value>,
    save_count: usize,
}

impl MemorySettingsStore {
    /// Create an empty store (loads defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a persisted JSON value.
    pub fn with_persisted(value: serde_json::Value) -> Self {
        Self {
            persisted: Some(value),
            save_count: 0,
        }
    }

    /// The last persisted value, if any.
    pub fn persisted(&self) -> Option<&serde_json::Value> {
        self.persisted.as_ref()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&mut self) -> Settings {
        self.persisted
            .as_ref()
            .map(Settings::from_json_value)
            .unwrap_or_default()
    }

    fn save(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        self.persisted = Some(settings.to_json_value()?);
        self.save_count += 1;
        Ok(())
    }
}

/// A store backed by a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Create a store for `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "settings.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_value(&self) -> Result<Option<serde_json::Value>, SettingsError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn write_pretty(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let mut writer = io::BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, settings)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

impl SettingsStore for JsonSettingsStore {
    fn load(&mut self) -> Settings {
        match self.read_value() {
            Ok(Some(value)) => Settings::from_json_value(&value),
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "no settings file; using defaults");
                Settings::default()
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "unreadable settings; using defaults"
                );
                Settings::default()
            }
        }
    }

    /// Writes a sibling temporary file and renames it over the target, so a failed write
    /// leaves the previous settings in place.
    fn save(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let temp_path = self.temp_path();
        let result = write_pretty(&temp_path, settings)
            .and_then(|()| fs::rename(&temp_path, &self.path).map_err(SettingsError::from));
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults_round_trip_through_json() {
        let settings = Settings::default();
        let value = settings.to_json_value().unwrap();
        assert_eq!(value["minimapScaling"], json!(1.0));
        assert_eq!(value["headerColors"][0], json!("#FF0000"));
        assert_eq!(value["disabledFiles"], json!([]));
        assert_eq!(Settings::from_json_value(&value), settings);
    }

    #[test]
    fn wrong_typed_fields_fall_back_individually() {
        let value = json!({
            "width": "wide",
            "showHeaders": false,
            "textColor": 42,
            "indicatorOpacity": 0.5,
        });
        let settings = Settings::from_json_value(&value);
        assert_eq!(settings.width, Settings::default().width);
        assert!(!settings.show_headers);
        assert_eq!(settings.text_color, Settings::default().text_color);
        assert_eq!(settings.indicator_opacity, 0.5);
    }

    #[test]
    fn non_list_disabled_files_is_discarded() {
        let settings = Settings::from_json_value(&json!({ "disabledFiles": { "a.md": true } }));
        assert!(settings.disabled_files.is_empty());

        let settings = Settings::from_json_value(&json!({ "disabledFiles": ["a.md", 3, "b.md"] }));
        assert_eq!(
            settings.disabled_files.iter().cloned().collect::<Vec<_>>(),
            vec!["a.md".to_string(), "b.md".to_string()]
        );
    }

    #[test]
    fn header_colors_recover_per_level() {
        let settings =
            Settings::from_json_value(&json!({ "headerColors": ["#000001", "nope", "#000003"] }));
        assert_eq!(settings.header_colors[0], Color::rgb(0, 0, 1));
        assert_eq!(settings.header_colors[1], DEFAULT_HEADER_COLORS[1]);
        assert_eq!(settings.header_colors[2], Color::rgb(0, 0, 3));
        assert_eq!(settings.header_colors[5], DEFAULT_HEADER_COLORS[5]);
    }

    #[test]
    fn loaded_numbers_are_clamped() {
        let settings = Settings::from_json_value(&json!({
            "minimapScaling": 4.0,
            "minimapOpacity": -1.0,
            "indicatorOpacity": 7,
            "lineHeight": 0,
        }));
        assert_eq!(settings.minimap_scaling, 1.0);
        assert_eq!(settings.minimap_opacity, 0.0);
        assert_eq!(settings.indicator_opacity, 1.0);
        assert_eq!(settings.line_height, LINE_HEIGHT_BOUNDS.min);
    }

    #[test]
    fn non_object_root_yields_defaults() {
        assert_eq!(Settings::from_json_value(&json!([1, 2])), Settings::default());
    }

    #[test]
    fn setters_clamp() {
        let mut settings = Settings::default();
        settings.set_minimap_scaling(0.0);
        assert_eq!(settings.minimap_scaling, 0.1);
        settings.set_minimap_opacity(1.5);
        assert_eq!(settings.minimap_opacity, 1.0);
        settings.set_indicator_opacity(f32::NAN);
        assert_eq!(settings.indicator_opacity, Settings::default().indicator_opacity);
    }

    #[test]
    fn header_color_falls_back_outside_levels() {
        let settings = Settings::default();
        assert_eq!(settings.header_color_for(1), Color::rgb(0xFF, 0, 0));
        assert_eq!(settings.header_color_for(0), DEFAULT_HEADER_COLOR);
        assert_eq!(settings.header_color_for(7), DEFAULT_HEADER_COLOR);
    }

    #[test]
    fn toggle_file_flips_membership() {
        let mut settings = Settings::default();
        assert!(settings.is_minimap_enabled_for_file("notes/a.md"));
        assert!(!settings.toggle_file("notes/a.md"));
        assert!(!settings.is_minimap_enabled_for_file("notes/a.md"));
        assert!(settings.toggle_file("notes/a.md"));
        assert!(settings.disabled_files.is_empty());
    }

    #[test]
    fn memory_store_persists_whole_record() {
        let mut store = MemorySettingsStore::new();
        let mut settings = store.load();
        settings.set_file_enabled("x.md", false);
        store.save(&settings).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load(), settings);
    }
}
