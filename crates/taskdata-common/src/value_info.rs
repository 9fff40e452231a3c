//! Metadata describing a logged or gridded value.

use serde::{Deserialize, Serialize};

use crate::range::ValueRange;

/// First DDI of the proprietary range.
pub const PROPRIETARY_DDI_START: u16 = 0xE000;

/// How a raw integer value is presented to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePresentation {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default)]
    pub unit: Option<String>,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ValuePresentation {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            decimals: 0,
            unit: None,
        }
    }
}

/// Description of one value field of a series or grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueFieldInfo {
    /// Stable key used in record value maps and feature properties.
    pub key: String,
    pub ddi: u16,
    /// Observed range of raw values, `None` if the field was never logged.
    pub range: Option<ValueRange>,
    pub scale: f64,
    pub offset: f64,
    pub unit: Option<String>,
    pub decimals: u32,
    /// Owning device element.
    pub device_element_id: Option<String>,
    pub device_element_designator: Option<String>,
    /// Data dictionary entity name.
    pub name: Option<String>,
    pub proprietary: bool,
}

impl ValueFieldInfo {
    pub fn new(ddi: u16, device_element_id: Option<&str>) -> Self {
        let presentation = ValuePresentation::default();
        Self {
            key: Self::value_key(ddi, device_element_id),
            ddi,
            range: None,
            scale: presentation.scale,
            offset: presentation.offset,
            unit: presentation.unit,
            decimals: presentation.decimals,
            device_element_id: device_element_id.map(str::to_string),
            device_element_designator: None,
            name: None,
            proprietary: ddi >= PROPRIETARY_DDI_START,
        }
    }

    /// Key format: `"{DDI as 4 hex digits}_{device element id}"`, or just
    /// the DDI when no device element owns the value.
    pub fn value_key(ddi: u16, device_element_id: Option<&str>) -> String {
        match device_element_id {
            Some(det) => format!("{:04X}_{}", ddi, det),
            None => format!("{:04X}", ddi),
        }
    }

    pub fn with_presentation(mut self, presentation: &ValuePresentation) -> Self {
        self.scale = presentation.scale;
        self.offset = presentation.offset;
        self.decimals = presentation.decimals;
        self.unit = presentation.unit.clone();
        self
    }

    /// The display settings this info carries.
    pub fn presentation(&self) -> ValuePresentation {
        ValuePresentation {
            scale: self.scale,
            offset: self.offset,
            decimals: self.decimals,
            unit: self.unit.clone(),
        }
    }

    pub fn with_range(mut self, range: Option<ValueRange>) -> Self {
        self.range = range;
        self
    }

    pub fn ddi_string(&self) -> String {
        format!("{:04X}", self.ddi)
    }

    /// Fold another info for the same key into this one. Ranges combine as
    /// a monoid; descriptive fields keep the first defined value.
    pub fn merge(&mut self, other: &ValueFieldInfo) {
        self.range = ValueRange::combine(self.range, other.range);
        if self.unit.is_none() {
            self.unit = other.unit.clone();
        }
        if self.name.is_none() {
            self.name = other.name.clone();
        }
        if self.device_element_designator.is_none() {
            self.device_element_designator = other.device_element_designator.clone();
        }
    }

    /// Presentation value of a raw sample.
    pub fn scaled(&self, raw: f64) -> f64 {
        raw * self.scale + self.offset
    }

    /// Render a raw sample as text, e.g. `"12.50 l/ha"`.
    pub fn format_value(&self, raw: f64) -> String {
        let value = format!("{:.*}", self.decimals as usize, self.scaled(raw));
        match &self.unit {
            Some(unit) if !unit.is_empty() => format!("{} {}", value, unit),
            _ => value,
        }
    }
}
