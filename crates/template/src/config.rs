//! Fill settings

use crate::Result;
use mapping::DEFAULT_FONT_SIZE;
use pdf_core::Color;
use serde::{Deserialize, Serialize};

/// Settings applied to every fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FillConfig {
    /// Used when a saved mapping carries an unusable font size
    pub default_font_size: f32,
    /// Text fill color as 0-255 RGB
    pub text_color: [u8; 3],
    /// Whether a saved mapping takes precedence over the registry entry
    pub prefer_saved_mappings: bool,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            default_font_size: DEFAULT_FONT_SIZE,
            text_color: [0, 0, 0],
            prefer_saved_mappings: true,
        }
    }
}

impl FillConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn color(&self) -> Color {
        let [r, g, b] = self.text_color;
        Color::from_rgb(r, g, b)
    }

    /// `size` if it can be drawn, otherwise the configured default
    pub fn font_size_or_default(&self, size: f32) -> f32 {
        if size.is_finite() && size > 0.0 {
            size
        } else {
            self.default_font_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = FillConfig::default();
        assert_eq!(config.default_font_size, 12.0);
        assert_eq!(config.color(), Color::black());
        assert!(config.prefer_saved_mappings);
    }

    #[test]
    fn test_partial_json() {
        let config = FillConfig::from_json(r#"{"textColor": [255, 0, 0]}"#).unwrap();
        assert_eq!(config.color(), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(config.default_font_size, 12.0);
        assert!(config.prefer_saved_mappings);
    }

    #[test]
    fn test_font_size_fallback() {
        let config = FillConfig::default();
        assert_eq!(config.font_size_or_default(9.0), 9.0);
        assert_eq!(config.font_size_or_default(0.0), 12.0);
        assert_eq!(config.font_size_or_default(f32::NAN), 12.0);
    }
}
