//! GeoJSON projection of record lists.

use taskdata_common::{Feature, FeatureCollection};

use crate::record::TimeLogRecord;

/// One point feature per record with a valid position, in record order.
pub fn project(records: &[TimeLogRecord]) -> FeatureCollection {
    let features = records
        .iter()
        .filter_map(|record| {
            let (lon, lat) = record.position.lon_lat()?;
            Some(Feature::point(lon, lat).with_values(record.values.clone()))
        })
        .collect();
    FeatureCollection::new().with_features(features)
}

/// Concatenate member projections, tagging every feature with its origin.
pub fn concat_tagged<'a, I>(parts: I) -> FeatureCollection
where
    I: IntoIterator<Item = (&'a str, &'a FeatureCollection)>,
{
    let features = parts
        .into_iter()
        .flat_map(|(origin, collection)| {
            collection
                .features
                .iter()
                .map(move |feature| feature.clone().with_origin(origin))
        })
        .collect();
    FeatureCollection::new().with_features(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Position;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(lon: f64, lat: f64, value: f64) -> TimeLogRecord {
        TimeLogRecord {
            time: Utc::now(),
            position: Position {
                lat: Some(lat),
                lon: Some(lon),
                ..Default::default()
            },
            values: BTreeMap::from([("k".to_string(), value)]),
        }
    }

    #[test]
    fn test_project_preserves_order() {
        let records = vec![record(3.0, 0.0, 1.0), record(1.0, 0.0, 2.0), record(2.0, 0.0, 3.0)];
        let collection = project(&records);
        let lons: Vec<f64> = collection
            .features
            .iter()
            .map(|f| f.geometry.coordinates()[0][0])
            .collect();
        assert_eq!(lons, vec![3.0, 1.0, 2.0]);
        assert_eq!(collection.features[1].properties.values["k"], 2.0);
        assert!(collection.features[0].properties.origin.is_none());
    }

    #[test]
    fn test_concat_tagged() {
        let a = project(&[record(0.0, 0.0, 1.0)]);
        let b = project(&[record(1.0, 1.0, 2.0), record(2.0, 2.0, 3.0)]);
        let merged = concat_tagged([("A", &a), ("B", &b)]);

        let origins: Vec<_> = merged
            .features
            .iter()
            .map(|f| f.properties.origin.as_deref().unwrap())
            .collect();
        assert_eq!(origins, vec!["A", "B", "B"]);
    }
}
