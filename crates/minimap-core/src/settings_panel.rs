//! Settings panel schema.
//!
//! Every [`Settings`] field is exposed as a labeled control. Hosts build their panel UI from
//! [`controls`] and route each user change through
//! [`MinimapController::apply_setting`](crate::MinimapController::apply_setting),
//! which persists and repaints immediately.

use crate::color::Color;
use crate::error::SettingsError;
use crate::settings::{
    Bounds, DENSITY_BOUNDS, HEADER_LEVELS, LINE_HEIGHT_BOUNDS, LINE_SPACING_BOUNDS,
    MIN_ELEMENT_BOUNDS, OPACITY_BOUNDS, SCALING_BOUNDS, Settings, TEXT_DENSITY_BOUNDS,
    WIDTH_BOUNDS,
};

/// Identifies one configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// `showMinimap`
    ShowMinimap,
    /// `width`
    Width,
    /// `minimapScaling`
    MinimapScaling,
    /// `lineHeight`
    LineHeight,
    /// `lineSpacing`
    LineSpacing,
    /// `textDensity`
    TextDensity,
    /// `density`
    Density,
    /// `minElementWidth`
    MinElementWidth,
    /// `minElementHeight`
    MinElementHeight,
    /// `showHeaders`
    ShowHeaders,
    /// `showLists`
    ShowLists,
    /// `showCodeBlocks`
    ShowCodeBlocks,
    /// `textColor`
    TextColor,
    /// `headerColors[level - 1]`
    HeaderLevelColor(u8),
    /// `headerColor`
    HeaderColor,
    /// `codeBlockColor`
    CodeBlockColor,
    /// `tableColor`
    TableColor,
    /// `imageColor`
    ImageColor,
    /// `embedColor`
    EmbedColor,
    /// `indicatorColor`
    IndicatorColor,
    /// `minimapOpacity`
    MinimapOpacity,
    /// `indicatorOpacity`
    IndicatorOpacity,
}

impl SettingKey {
    /// Persisted key name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShowMinimap => "showMinimap",
            Self::Width => "width",
            Self::MinimapScaling => "minimapScaling",
            Self::LineHeight => "lineHeight",
            Self::LineSpacing => "lineSpacing",
            Self::TextDensity => "textDensity",
            Self::Density => "density",
            Self::MinElementWidth => "minElementWidth",
            Self::MinElementHeight => "minElementHeight",
            Self::ShowHeaders => "showHeaders",
            Self::ShowLists => "showLists",
            Self::ShowCodeBlocks => "showCodeBlocks",
            Self::TextColor => "textColor",
            Self::HeaderLevelColor(_) => "headerColors",
            Self::HeaderColor => "headerColor",
            Self::CodeBlockColor => "codeBlockColor",
            Self::TableColor => "tableColor",
            Self::ImageColor => "imageColor",
            Self::EmbedColor => "embedColor",
            Self::IndicatorColor => "indicatorColor",
            Self::MinimapOpacity => "minimapOpacity",
            Self::IndicatorOpacity => "indicatorOpacity",
        }
    }
}

/// The kind of control a setting is edited with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    /// A numeric slider.
    Slider {
        /// Smallest value.
        min: f32,
        /// Largest value.
        max: f32,
        /// Step between positions.
        step: f32,
    },
    /// An on/off switch.
    Toggle,
    /// A color picker.
    ColorPicker,
}

impl ControlKind {
    const fn slider(bounds: Bounds, step: f32) -> Self {
        Self::Slider {
            min: bounds.min,
            max: bounds.max,
            step,
        }
    }
}

/// One labeled control in the settings panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingControl {
    /// Field edited by this control.
    pub key: SettingKey,
    /// Human-readable label.
    pub label: String,
    /// Control kind and bounds.
    pub kind: ControlKind,
}

/// A typed setting value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    /// Value of a toggle.
    Bool(bool),
    /// Value of a slider.
    Number(f32),
    /// Value of a color picker.
    Color(Color),
}

/// All controls of the settings panel, in display order.
pub fn controls() -> Vec<SettingControl> {
    let control = |key: SettingKey, label: &str, kind: ControlKind| SettingControl {
        key,
        label: label.to_string(),
        kind,
    };

    let mut out = vec![
        control(SettingKey::ShowMinimap, "Show minimap", ControlKind::Toggle),
        control(
            SettingKey::Width,
            "Width",
            ControlKind::slider(WIDTH_BOUNDS, 5.0),
        ),
        control(
            SettingKey::MinimapScaling,
            "Scale",
            ControlKind::slider(SCALING_BOUNDS, 0.1),
        ),
        control(
            SettingKey::LineHeight,
            "Line height",
            ControlKind::slider(LINE_HEIGHT_BOUNDS, 0.5),
        ),
        control(
            SettingKey::LineSpacing,
            "Line spacing",
            ControlKind::slider(LINE_SPACING_BOUNDS, 0.1),
        ),
        control(
            SettingKey::TextDensity,
            "Text density",
            ControlKind::slider(TEXT_DENSITY_BOUNDS, 0.05),
        ),
        control(
            SettingKey::Density,
            "Density",
            ControlKind::slider(DENSITY_BOUNDS, 0.1),
        ),
        control(
            SettingKey::MinElementWidth,
            "Minimum element width",
            ControlKind::slider(MIN_ELEMENT_BOUNDS, 0.5),
        ),
        control(
            SettingKey::MinElementHeight,
            "Minimum element height",
            ControlKind::slider(MIN_ELEMENT_BOUNDS, 0.5),
        ),
        control(SettingKey::ShowHeaders, "Show headers", ControlKind::Toggle),
        control(SettingKey::ShowLists, "Show lists", ControlKind::Toggle),
        control(
            SettingKey::ShowCodeBlocks,
            "Show code blocks",
            ControlKind::Toggle,
        ),
        control(SettingKey::TextColor, "Text color", ControlKind::ColorPicker),
    ];

    for level in 1..=HEADER_LEVELS as u8 {
        out.push(control(
            SettingKey::HeaderLevelColor(level),
            &format!("Header {level} color"),
            ControlKind::ColorPicker,
        ));
    }

    out.extend([
        control(
            SettingKey::HeaderColor,
            "Header fallback color",
            ControlKind::ColorPicker,
        ),
        control(
            SettingKey::CodeBlockColor,
            "Code block color",
            ControlKind::ColorPicker,
        ),
        control(SettingKey::TableColor, "Table color", ControlKind::ColorPicker),
        control(SettingKey::ImageColor, "Image color", ControlKind::ColorPicker),
        control(SettingKey::EmbedColor, "Embed color", ControlKind::ColorPicker),
        control(
            SettingKey::IndicatorColor,
            "Viewport indicator color",
            ControlKind::ColorPicker,
        ),
        control(
            SettingKey::MinimapOpacity,
            "Minimap opacity",
            ControlKind::slider(OPACITY_BOUNDS, 0.05),
        ),
        control(
            SettingKey::IndicatorOpacity,
            "Viewport indicator opacity",
            ControlKind::slider(OPACITY_BOUNDS, 0.05),
        ),
    ]);

    out
}

fn header_index(level: u8) -> Result<usize, SettingsError> {
    match level {
        1..=6 => Ok(usize::from(level) - 1),
        _ => Err(SettingsError::InvalidHeaderLevel(level)),
    }
}

impl Settings {
    /// Read the current value of `key`.
    pub fn get(&self, key: SettingKey) -> Result<SettingValue, SettingsError> {
        use SettingValue::{Bool, Color as C, Number};
        Ok(match key {
            SettingKey::ShowMinimap => Bool(self.show_minimap),
            SettingKey::Width => Number(self.width),
            SettingKey::MinimapScaling => Number(self.minimap_scaling),
            SettingKey::LineHeight => Number(self.line_height),
            SettingKey::LineSpacing => Number(self.line_spacing),
            SettingKey::TextDensity => Number(self.text_density),
            SettingKey::Density => Number(self.density),
            SettingKey::MinElementWidth => Number(self.min_element_width),
            SettingKey::MinElementHeight => Number(self.min_element_height),
            SettingKey::ShowHeaders => Bool(self.show_headers),
            SettingKey::ShowLists => Bool(self.show_lists),
            SettingKey::ShowCodeBlocks => Bool(self.show_code_blocks),
            SettingKey::TextColor => C(self.text_color),
            SettingKey::HeaderLevelColor(level) => C(self.header_colors[header_index(level)?]),
            SettingKey::HeaderColor => C(self.header_color),
            SettingKey::CodeBlockColor => C(self.code_block_color),
            SettingKey::TableColor => C(self.table_color),
            SettingKey::ImageColor => C(self.image_color),
            SettingKey::EmbedColor => C(self.embed_color),
            SettingKey::IndicatorColor => C(self.indicator_color),
            SettingKey::MinimapOpacity => Number(self.minimap_opacity),
            SettingKey::IndicatorOpacity => Number(self.indicator_opacity),
        })
    }

    /// Apply `value` to `key`, clamping numbers to the control bounds.
    ///
    /// Returns the value actually stored.
    pub fn apply(
        &mut self,
        key: SettingKey,
        value: SettingValue,
    ) -> Result<SettingValue, SettingsError> {
        let name = key.as_str();
        let as_bool = |value: SettingValue| match value {
            SettingValue::Bool(b) => Ok(b),
            _ => Err(SettingsError::TypeMismatch {
                key: name,
                expected: "bool",
            }),
        };
        let as_color = |value: SettingValue| match value {
            SettingValue::Color(c) => Ok(c),
            _ => Err(SettingsError::TypeMismatch {
                key: name,
                expected: "color",
            }),
        };
        let as_number = |value: SettingValue, bounds: Bounds| match value {
            SettingValue::Number(n) if n.is_finite() => Ok(n.clamp(bounds.min, bounds.max)),
            SettingValue::Number(_) => Err(SettingsError::NonFinite { key: name }),
            _ => Err(SettingsError::TypeMismatch {
                key: name,
                expected: "number",
            }),
        };

        match key {
            SettingKey::ShowMinimap => self.show_minimap = as_bool(value)?,
            SettingKey::Width => self.width = as_number(value, WIDTH_BOUNDS)?,
            SettingKey::MinimapScaling => {
                self.minimap_scaling = as_number(value, SCALING_BOUNDS)?
            }
            SettingKey::LineHeight => self.line_height = as_number(value, LINE_HEIGHT_BOUNDS)?,
            SettingKey::LineSpacing => {
                self.line_spacing = as_number(value, LINE_SPACING_BOUNDS)?
            }
            SettingKey::TextDensity => {
                self.text_density = as_number(value, TEXT_DENSITY_BOUNDS)?
            }
            SettingKey::Density => self.density = as_number(value, DENSITY_BOUNDS)?,
            SettingKey::MinElementWidth => {
                self.min_element_width = as_number(value, MIN_ELEMENT_BOUNDS)?
            }
            SettingKey::MinElementHeight => {
                self.min_element_height = as_number(value, MIN_ELEMENT_BOUNDS)?
            }
            SettingKey::ShowHeaders => self.show_headers = as_bool(value)?,
            SettingKey::ShowLists => self.show_lists = as_bool(value)?,
            SettingKey::ShowCodeBlocks => self.show_code_blocks = as_bool(value)?,
            SettingKey::TextColor => self.text_color = as_color(value)?,
            SettingKey::HeaderLevelColor(level) => {
                let idx = header_index(level)?;
                self.header_colors[idx] = as_color(value)?;
            }
            SettingKey::HeaderColor => self.header_color = as_color(value)?,
            SettingKey::CodeBlockColor => self.code_block_color = as_color(value)?,
            SettingKey::TableColor => self.table_color = as_color(value)?,
            SettingKey::ImageColor => self.image_color = as_color(value)?,
            SettingKey::EmbedColor => self.embed_color = as_color(value)?,
            SettingKey::IndicatorColor => self.indicator_color = as_color(value)?,
            SettingKey::MinimapOpacity => {
                self.minimap_opacity = as_number(value, OPACITY_BOUNDS)?
            }
            SettingKey::IndicatorOpacity => {
                self.indicator_opacity = as_number(value, OPACITY_BOUNDS)?
            }
        }

        self.get(key)
    }
}
