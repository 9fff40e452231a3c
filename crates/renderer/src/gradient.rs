//! Continuous color scales over a value range.

use taskdata_common::ValueRange;

use crate::palette::Palette;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Color given to a value outside the displayed range.
pub const OUTLIER_COLOR: Color = Color {
    r: 255,
    g: 0,
    b: 255,
    a: 255,
};

/// Linear color interpolation, `t` clamped to `[0, 1]`.
pub fn interpolate_color(color1: Color, color2: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| (f64::from(a) * t_inv + f64::from(b) * t).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

/// Palette colors spread evenly across a value range.
///
/// A degenerate range (`min == max`) maps every value to the palette's
/// terminal color.
#[derive(Debug, Clone)]
pub struct ColorScale {
    colors: Vec<Color>,
    range: ValueRange,
}

impl ColorScale {
    pub fn new(palette: &Palette, range: ValueRange) -> Self {
        Self {
            colors: palette.colors().to_vec(),
            range,
        }
    }

    pub fn range(&self) -> ValueRange {
        self.range
    }

    /// Color of `value`, clamped into the range.
    pub fn color(&self, value: f64) -> Color {
        let last = self.colors.len() - 1;
        if last == 0 || self.range.is_degenerate() {
            return self.colors[last];
        }

        let pos = self.range.normalize(value) * last as f64;
        let low = (pos.floor() as usize).min(last - 1);
        interpolate_color(self.colors[low], self.colors[low + 1], pos - low as f64)
    }

    /// Like [`ColorScale::color`], but values outside the range get
    /// [`OUTLIER_COLOR`] instead of being clamped.
    pub fn classify(&self, value: f64) -> Color {
        if self.range.contains(value) {
            self.color(value)
        } else {
            OUTLIER_COLOR
        }
    }
}
