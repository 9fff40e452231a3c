//! Merging of several parsed series into one view.
//!
//! A merged view holds no records. Its bbox and field ranges are folded
//! from the member series, and feature lists are re-derived from each
//! member's own projection (see [`crate::features::concat_tagged`]).

use taskdata_common::{BoundingBox, MergeWarning, ValueFieldInfo};

use crate::series::{default_value_key, ParsedSeries};

#[derive(Debug, Clone, Default)]
pub struct MergedView {
    /// Member series ids, in merge order.
    pub members: Vec<String>,
    pub bbox: Option<BoundingBox>,
    /// Union of member fields by key, in first-seen order.
    pub field_infos: Vec<ValueFieldInfo>,
    pub warnings: Vec<MergeWarning>,
}

impl MergedView {
    pub fn field_info(&self, key: &str) -> Option<&ValueFieldInfo> {
        self.field_infos.iter().find(|info| info.key == key)
    }

    pub fn default_value_key(&self) -> Option<&str> {
        default_value_key(&self.field_infos)
    }
}

/// Fold `series` (id, parse result) into one view.
pub fn merge_series<'a, I>(series: I) -> MergedView
where
    I: IntoIterator<Item = (&'a str, &'a ParsedSeries)>,
{
    let mut view = MergedView::default();

    for (id, parsed) in series {
        view.members.push(id.to_string());

        view.bbox = match (view.bbox, parsed.bbox) {
            (Some(a), Some(b)) => Some(a.envelope(&b)),
            (a, b) => a.or(b),
        };

        for info in &parsed.field_infos {
            match view.field_infos.iter_mut().find(|existing| existing.key == info.key) {
                Some(existing) => existing.merge(info),
                None => view.field_infos.push(info.clone()),
            }
        }

        view.warnings.extend(
            parsed
                .warnings
                .iter()
                .map(|message| MergeWarning::new(id, message.clone())),
        );
    }

    view
}
