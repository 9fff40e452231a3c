//! Color palettes for grids and time log points.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::gradient::Color;

/// ColorBrewer RdYlGn (11 classes), reversed so low values are green.
const RD_YL_GN_REVERSED: [&str; 11] = [
    "#006837", "#1a9850", "#66bd63", "#a6d96a", "#d9ef8b", "#ffffbf", "#fee08b", "#fdae61",
    "#f46d43", "#d73027", "#a50026",
];

/// Palette definition as stored in JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaletteDefinition {
    pub name: String,
    pub description: Option<String>,
    /// Hex colors from the low end to the high end.
    pub colors: Vec<String>,
}

/// An ordered, non-empty list of colors; the last one is the terminal color.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    colors: Vec<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            name: "RdYlGn-reversed".to_string(),
            colors: RD_YL_GN_REVERSED
                .iter()
                .filter_map(|hex| hex_to_rgb(hex))
                .map(|(r, g, b)| Color::rgb(r, g, b))
                .collect(),
        }
    }
}

impl Palette {
    pub fn new(name: impl Into<String>, colors: Vec<Color>) -> Result<Self> {
        if colors.is_empty() {
            return Err(RenderError::EmptyPalette);
        }
        Ok(Self {
            name: name.into(),
            colors,
        })
    }

    /// Build a palette from `#rrggbb` strings.
    pub fn from_hex<S: AsRef<str>>(name: impl Into<String>, hex: &[S]) -> Result<Self> {
        let colors = hex
            .iter()
            .map(|h| {
                hex_to_rgb(h.as_ref())
                    .map(|(r, g, b)| Color::rgb(r, g, b))
                    .ok_or_else(|| RenderError::InvalidColor(h.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(name, colors)
    }

    /// Load a palette definition from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self> {
        let def: PaletteDefinition = serde_json::from_str(json_str)?;
        Self::from_hex(def.name, &def.colors)
    }

    /// Load a palette definition from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| RenderError::PaletteFile {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Resolve a built-in palette by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "rdylgn-reversed" | "default" => Some(Self::default()),
            "rdylgn" => {
                let mut palette = Self::default();
                palette.name = "RdYlGn".to_string();
                palette.colors.reverse();
                Some(palette)
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Color used when every value is the same.
    pub fn terminal_color(&self) -> Color {
        self.colors[self.colors.len() - 1]
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}
