use geo::Point;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A GHCN-Daily station as listed in the station catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    #[validate(length(min = 1))]
    pub id: String,

    pub name: String,

    /// Parent area (US state / territory postal code)
    pub state: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub elevation: Option<f64>,
}

impl Station {
    pub fn new(
        id: impl Into<String>,
        state: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into().to_uppercase(),
            name: String::new(),
            state: state.into(),
            latitude,
            longitude,
            elevation: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_elevation(mut self, elevation: Option<f64>) -> Self {
        self.elevation = elevation;
        self
    }

    /// Station location as a planar point, x = longitude, y = latitude
    pub fn location(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_validation() {
        let station = Station::new("usc00010008", "AL", 31.5702, -85.2482)
            .with_name("ABBEVILLE")
            .with_elevation(Some(139.0));

        assert!(station.validate().is_ok());
        assert_eq!(station.id, "USC00010008");
        assert_eq!(station.location().x(), -85.2482);
        assert_eq!(station.location().y(), 31.5702);
    }

    #[test]
    fn test_invalid_coordinates() {
        let station = Station::new("US1TEST0001", "AL", 91.0, -85.0);
        assert!(station.validate().is_err());

        let station = Station::new("US1TEST0002", "AL", 31.0, -185.0);
        assert!(station.validate().is_err());
    }
}
