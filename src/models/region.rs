use crate::error::{ProcessingError, Result};
use crate::utils::geometry::parse_geojson_geometry;
use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};

/// County identifier: `statefp * 1000 + countyfp`, e.g. 1001 for Autauga County, AL.
pub type RegionId = u32;

#[derive(Debug, Clone)]
pub enum RegionGeometry {
    Valid {
        shape: MultiPolygon<f64>,
        bounds: Rect<f64>,
    },
    /// Boundary that could not be interpreted; reported when a station search reaches it.
    Malformed { reason: String },
}

/// A county boundary belonging to one parent area (state).
#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub state: String,
    pub geometry: RegionGeometry,
}

impl Region {
    pub fn new(id: RegionId, state: impl Into<String>, shape: MultiPolygon<f64>) -> Self {
        let geometry = match shape.bounding_rect() {
            Some(bounds) => RegionGeometry::Valid { shape, bounds },
            None => RegionGeometry::Malformed {
                reason: "geometry is empty".to_string(),
            },
        };

        Self {
            id,
            state: state.into(),
            geometry,
        }
    }

    pub fn malformed(id: RegionId, state: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id,
            state: state.into(),
            geometry: RegionGeometry::Malformed {
                reason: reason.into(),
            },
        }
    }

    /// Build a region from a GeoJSON geometry string. Parse failures are kept as
    /// a malformed geometry rather than rejected.
    pub fn from_geojson(id: RegionId, state: impl Into<String>, json: &str) -> Self {
        match parse_geojson_geometry(json) {
            Ok(shape) => Self::new(id, state, shape),
            Err(e) => Self::malformed(id, state, e.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.geometry, RegionGeometry::Valid { .. })
    }

    /// Strict-interior containment: a point on a boundary edge is outside.
    pub fn contains(&self, point: &Point<f64>) -> Result<bool> {
        match &self.geometry {
            RegionGeometry::Valid { shape, bounds } => {
                let (x, y) = point.x_y();
                if x < bounds.min().x || x > bounds.max().x || y < bounds.min().y || y > bounds.max().y
                {
                    return Ok(false);
                }
                Ok(shape.contains(point))
            }
            RegionGeometry::Malformed { reason } => Err(ProcessingError::MalformedGeometry {
                region_id: self.id,
                reason: reason.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn unit_square(x0: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: 0.0),
            (x: x0 + 1.0, y: 0.0),
            (x: x0 + 1.0, y: 1.0),
            (x: x0, y: 1.0),
        ]])
    }

    #[test]
    fn test_region_contains() {
        let region = Region::new(1, "AL", unit_square(0.0));

        assert!(region.is_valid());
        assert!(region.contains(&Point::new(0.5, 0.5)).unwrap());
        assert!(!region.contains(&Point::new(1.5, 0.5)).unwrap());
        assert!(!region.contains(&Point::new(0.5, -3.0)).unwrap());
    }

    #[test]
    fn test_boundary_point_is_outside() {
        let left = Region::new(1, "AL", unit_square(0.0));
        let right = Region::new(2, "AL", unit_square(1.0));
        let on_edge = Point::new(1.0, 0.5);

        assert!(!left.contains(&on_edge).unwrap());
        assert!(!right.contains(&on_edge).unwrap());
    }

    #[test]
    fn test_malformed_region() {
        let region = Region::from_geojson(7, "AL", "{not json");

        assert!(!region.is_valid());
        match region.contains(&Point::new(0.0, 0.0)) {
            Err(ProcessingError::MalformedGeometry { region_id, .. }) => assert_eq!(region_id, 7),
            other => panic!("expected malformed geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_shape_is_malformed() {
        let region = Region::new(3, "AL", MultiPolygon::new(vec![]));
        assert!(!region.is_valid());
    }
}
