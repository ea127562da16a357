use crate::error::{ProcessingError, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;

/// GeoJSON geometry objects accepted for region boundaries. A `Feature`
/// wrapper is unwrapped to its geometry.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonObject {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    Feature {
        geometry: Box<GeoJsonObject>,
    },
}

/// Parse a GeoJSON `Polygon`, `MultiPolygon` or `Feature` into a planar
/// multi-polygon with x = longitude, y = latitude.
///
/// # Examples
/// ```
/// use county_weather::utils::parse_geojson_geometry;
///
/// let json = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;
/// let shape = parse_geojson_geometry(json).unwrap();
/// assert_eq!(shape.0.len(), 1);
/// ```
pub fn parse_geojson_geometry(json: &str) -> Result<MultiPolygon<f64>> {
    let object: GeoJsonObject = serde_json::from_str(json)
        .map_err(|e| ProcessingError::InvalidFormat(format!("Invalid GeoJSON geometry: {}", e)))?;
    object_to_multi_polygon(object)
}

fn object_to_multi_polygon(object: GeoJsonObject) -> Result<MultiPolygon<f64>> {
    match object {
        GeoJsonObject::Polygon { coordinates } => {
            Ok(MultiPolygon::new(vec![polygon_from_rings(&coordinates)?]))
        }
        GeoJsonObject::MultiPolygon { coordinates } => {
            if coordinates.is_empty() {
                return Err(ProcessingError::InvalidFormat(
                    "MultiPolygon has no parts".to_string(),
                ));
            }
            let polygons = coordinates
                .iter()
                .enumerate()
                .map(|(part, rings)| {
                    polygon_from_rings(rings).map_err(|e| {
                        ProcessingError::InvalidFormat(format!("part {}: {}", part, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        GeoJsonObject::Feature { geometry } => object_to_multi_polygon(*geometry),
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first().ok_or_else(|| {
        ProcessingError::InvalidFormat("Polygon has no exterior ring".to_string())
    })?;

    let exterior = ring_from_positions(exterior)?;
    let interiors = interiors
        .iter()
        .map(|ring| ring_from_positions(ring))
        .collect::<Result<Vec<_>>>()?;

    // Polygon::new closes any open ring.
    Ok(Polygon::new(exterior, interiors))
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    let mut coords = Vec::with_capacity(positions.len());
    for position in positions {
        match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => coords.push(Coord { x: *x, y: *y }),
            _ => {
                return Err(ProcessingError::InvalidCoordinate(format!(
                    "Invalid position: {:?}",
                    position
                )))
            }
        }
    }

    let open_len = match (coords.first(), coords.last()) {
        (Some(first), Some(last)) if coords.len() > 1 && first == last => coords.len() - 1,
        _ => coords.len(),
    };
    if open_len < 3 {
        return Err(ProcessingError::InvalidFormat(format!(
            "Ring needs at least 3 distinct positions, got {}",
            open_len
        )));
    }

    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, Point};

    #[test]
    fn test_parse_polygon() {
        let json = r#"{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]}"#;
        let shape = parse_geojson_geometry(json).unwrap();

        assert_eq!(shape.0.len(), 1);
        assert!(shape.contains(&Point::new(1.0, 1.0)));
        assert!(!shape.contains(&Point::new(3.0, 1.0)));
    }

    #[test]
    fn test_parse_multipolygon_with_hole() {
        let json = r#"{"type":"MultiPolygon","coordinates":[
            [[[0,0],[4,0],[4,4],[0,4],[0,0]],[[1,1],[2,1],[2,2],[1,2],[1,1]]],
            [[[10,10],[11,10],[11,11],[10,11],[10,10]]]
        ]}"#;
        let shape = parse_geojson_geometry(json).unwrap();

        assert_eq!(shape.0.len(), 2);
        assert!(shape.contains(&Point::new(3.0, 3.0)));
        assert!(!shape.contains(&Point::new(1.5, 1.5))); // inside the hole
        assert!(shape.contains(&Point::new(10.5, 10.5)));
    }

    #[test]
    fn test_parse_feature_and_open_ring() {
        let json = r#"{"type":"Feature","properties":{},"geometry":
            {"type":"Polygon","coordinates":[[[0,0,5],[1,0,5],[1,1,5]]]}}"#;
        let shape = parse_geojson_geometry(json).unwrap();

        assert!(shape.contains(&Point::new(0.7, 0.2)));
    }

    #[test]
    fn test_malformed_geometry() {
        // Unsupported type
        assert!(parse_geojson_geometry(r#"{"type":"Point","coordinates":[0,0]}"#).is_err());
        // Not JSON at all
        assert!(parse_geojson_geometry("POLYGON((0 0, 1 0, 1 1))").is_err());
        // Degenerate ring
        assert!(
            parse_geojson_geometry(r#"{"type":"Polygon","coordinates":[[[0,0],[1,1],[0,0]]]}"#)
                .is_err()
        );
        // Position with a single ordinate
        assert!(parse_geojson_geometry(
            r#"{"type":"Polygon","coordinates":[[[0],[1,0],[1,1],[0,1]]]}"#
        )
        .is_err());
        // No rings
        assert!(parse_geojson_geometry(r#"{"type":"Polygon","coordinates":[]}"#).is_err());
        assert!(parse_geojson_geometry(r#"{"type":"MultiPolygon","coordinates":[]}"#).is_err());
    }
}
