//! Named color presets.
//!
//! Presets are static data loaded once at startup, either from a JSON file
//! of shape `{"solid": [...], "dim": [...]}` or from the built-in table.
//! `text` and `background` carry display classes for the front-end and are
//! opaque here.

use crate::color::WireColor;
use serde::{Deserialize, Serialize};

/// A named solid color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolidPreset {
    pub name: String,
    /// Channel levels in red, green, blue, white order.
    pub value: [u8; 4],
    /// Display class for rendering the preset entry.
    #[serde(default)]
    pub text: String,
}

impl SolidPreset {
    pub fn color(&self) -> WireColor {
        let [red, green, blue, white] = self.value;
        WireColor::new(red, green, blue, white)
    }
}

/// A named base color for the brightness sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimPreset {
    pub name: String,
    /// Channel levels in red, green, blue, white order.
    pub value: [u8; 4],
    /// Display class for rendering the preset entry.
    #[serde(default)]
    pub background: String,
}

impl DimPreset {
    pub fn color(&self) -> WireColor {
        let [red, green, blue, white] = self.value;
        WireColor::new(red, green, blue, white)
    }
}

/// Every preset the panel knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetTable {
    #[serde(default)]
    pub solid: Vec<SolidPreset>,
    #[serde(default)]
    pub dim: Vec<DimPreset>,
}

impl PresetTable {
    /// Look up a solid preset by name, case-insensitively.
    pub fn solid(&self, name: &str) -> Option<&SolidPreset> {
        self.solid.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Look up a dim preset by name, case-insensitively.
    pub fn dim(&self, name: &str) -> Option<&DimPreset> {
        self.dim.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Fallback table used when no preset file is configured.
    pub fn builtin() -> PresetTable {
        fn solid(name: &str, value: [u8; 4], text: &str) -> SolidPreset {
            SolidPreset {
                name: name.to_string(),
                value,
                text: text.to_string(),
            }
        }
        fn dim(name: &str, value: [u8; 4], background: &str) -> DimPreset {
            DimPreset {
                name: name.to_string(),
                value,
                background: background.to_string(),
            }
        }
        PresetTable {
            solid: vec![
                solid("Red", [255, 0, 0, 0], "text-red-500"),
                solid("Green", [0, 255, 0, 0], "text-green-500"),
                solid("Blue", [0, 0, 255, 0], "text-blue-500"),
                solid("White", [255, 255, 255, 0], "text-white"),
                solid("Warm White", [0, 0, 0, 255], "text-amber-100"),
                solid("Off", [0, 0, 0, 0], "text-gray-500"),
            ],
            dim: vec![
                dim("Warm Glow", [0, 0, 0, 255], "bg-amber-100"),
                dim("Moonlight", [40, 40, 120, 0], "bg-slate-800"),
            ],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = PresetTable::builtin();
        assert!(table.solid("red").is_some());
        assert!(table.solid("RED").is_some());
        assert!(table.solid("cyan").is_none());
        assert!(table.dim("warm glow").is_some());
    }

    #[test]
    fn test_preset_color_preserves_channel_order() {
        let preset = SolidPreset {
            name: "Test".to_string(),
            value: [1, 2, 3, 4],
            text: String::new(),
        };
        assert_eq!(preset.color(), WireColor::new(1, 2, 3, 4));
    }

    #[test]
    fn test_table_parses_the_data_file_shape() {
        let json = r#"{
            "solid": [{"name": "Rose", "value": [255, 40, 80, 0], "text": "text-rose-400"}],
            "dim": [{"name": "Ember", "value": [200, 60, 0, 0], "background": "bg-orange-900"}]
        }"#;
        let table: PresetTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.solid.len(), 1);
        assert_eq!(table.solid("rose").unwrap().color(), WireColor::new(255, 40, 80, 0));
        assert_eq!(table.dim("ember").unwrap().background, "bg-orange-900");
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let table: PresetTable = serde_json::from_str(r#"{"solid": []}"#).unwrap();
        assert!(table.solid.is_empty());
        assert!(table.dim.is_empty());
    }
}
