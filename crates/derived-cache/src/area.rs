//! Projection of area entities (field boundaries) to GeoJSON.

use taskdata_common::{BoundingBox, Geometry, Partfield};

/// Geometry of one area entity plus its extent.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaGeometry {
    pub geometry: Geometry,
    /// `None` when the area has no coordinates.
    pub bbox: Option<BoundingBox>,
}

/// Turns an area entity into GeoJSON geometry.
pub trait AreaProjector: Send + Sync {
    fn to_geojson(&self, area: &Partfield) -> AreaGeometry;
}

/// Projects partfield polygons as-is: one polygon becomes a `Polygon`,
/// several a `MultiPolygon`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonAreaProjector;

impl AreaProjector for PolygonAreaProjector {
    fn to_geojson(&self, area: &Partfield) -> AreaGeometry {
        let geometry = match area.polygons.as_slice() {
            [single] => Geometry::Polygon {
                coordinates: single.clone(),
            },
            many => Geometry::MultiPolygon {
                coordinates: many.to_vec(),
            },
        };
        let bbox = BoundingBox::from_points(
            geometry
                .coordinates()
                .into_iter()
                .map(|[lon, lat]| (lon, lat)),
        );
        AreaGeometry { geometry, bbox }
    }
}
