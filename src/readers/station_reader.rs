use crate::error::{ProcessingError, Result};
use crate::models::Station;
use crate::utils::constants::{MISSING_ELEVATION, US_STATION_PREFIX};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;
use validator::Validate;

/// Reader for the fixed-width GHCN-Daily station catalog (`ghcnd-stations.txt`).
pub struct StationReader {
    us_only: bool,
}

impl StationReader {
    pub fn new() -> Self {
        Self { us_only: true }
    }

    pub fn with_us_only(us_only: bool) -> Self {
        Self { us_only }
    }

    /// Read station metadata from the catalog file
    pub fn read_stations(&self, path: &Path) -> Result<Vec<Station>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut stations = Vec::new();

        for (line_number, line_result) in reader.lines().enumerate() {
            let line = line_result?;

            if line.trim().is_empty() {
                continue;
            }
            if self.us_only && !line.starts_with(US_STATION_PREFIX) {
                continue;
            }

            let station = self.parse_station_line(&line).map_err(|e| {
                ProcessingError::InvalidFormat(format!("line {}: {}", line_number + 1, e))
            })?;

            if let Err(e) = station.validate() {
                warn!(station = %station.id, error = %e, "Skipping station with invalid metadata");
                continue;
            }

            stations.push(station);
        }

        Ok(stations)
    }

    /// Parse a single catalog line.
    ///
    /// Columns (1-based): ID 1-11, LATITUDE 13-20, LONGITUDE 22-30,
    /// ELEVATION 32-37, STATE 39-40, NAME 42-71.
    fn parse_station_line(&self, line: &str) -> Result<Station> {
        let id = column(line, 0, 11);
        if id.is_empty() {
            return Err(ProcessingError::InvalidFormat("Missing station ID".to_string()));
        }

        let latitude = parse_degrees(column(line, 12, 20))?;
        let longitude = parse_degrees(column(line, 21, 30))?;

        let elevation = match column(line, 31, 37) {
            "" => None,
            raw => {
                let value = raw.parse::<f64>().map_err(|_| {
                    ProcessingError::InvalidFormat(format!("Invalid elevation: '{}'", raw))
                })?;
                (value != MISSING_ELEVATION).then_some(value)
            }
        };

        Ok(Station::new(id, column(line, 38, 40), latitude, longitude)
            .with_name(column(line, 41, 71))
            .with_elevation(elevation))
    }

    /// Read stations keyed by id
    pub fn read_stations_map(&self, path: &Path) -> Result<HashMap<String, Station>> {
        let stations = self.read_stations(path)?;
        let mut map = HashMap::with_capacity(stations.len());

        for station in stations {
            map.insert(station.id.clone(), station);
        }

        Ok(map)
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Trimmed fixed-width column, clamped to the line length
fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).map(str::trim).unwrap_or("")
}

fn parse_degrees(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| ProcessingError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn catalog_line(id: &str, lat: f64, lon: f64, elev: f64, state: &str, name: &str) -> String {
        format!(
            "{:<11} {:>8.4} {:>9.4} {:>6.1} {:<2} {:<30}",
            id, lat, lon, elev, state, name
        )
    }

    #[test]
    fn test_parse_station_line() {
        let reader = StationReader::new();
        let line = catalog_line("USC00010008", 31.5702, -85.2482, 139.0, "AL", "ABBEVILLE");
        let station = reader.parse_station_line(&line).unwrap();

        assert_eq!(station.id, "USC00010008");
        assert_eq!(station.state, "AL");
        assert_eq!(station.name, "ABBEVILLE");
        assert!((station.latitude - 31.5702).abs() < 1e-9);
        assert!((station.longitude - -85.2482).abs() < 1e-9);
        assert_eq!(station.elevation, Some(139.0));
    }

    #[test]
    fn test_missing_elevation_and_real_layout() {
        let reader = StationReader::new();
        let line = "US1AKAB0004  61.3572 -149.5564 -999.9 AK ANCHORAGE 1.4 E";
        let station = reader.parse_station_line(line).unwrap();

        assert_eq!(station.id, "US1AKAB0004");
        assert_eq!(station.state, "AK");
        assert_eq!(station.elevation, None);
        assert_eq!(station.name, "ANCHORAGE 1.4 E");
    }

    #[test]
    fn test_read_stations_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "{}", catalog_line("ACW00011604", 17.1167, -61.7833, 10.1, "", "ST JOHNS COOLIDGE FLD"))?;
        writeln!(temp_file, "{}", catalog_line("USC00010008", 31.5702, -85.2482, 139.0, "AL", "ABBEVILLE"))?;
        writeln!(temp_file)?;
        writeln!(temp_file, "{}", catalog_line("USW00013874", 33.6301, -84.4418, 308.2, "GA", "ATLANTA HARTSFIELD"))?;

        let stations = StationReader::new().read_stations(temp_file.path())?;
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].id, "USC00010008");
        assert_eq!(stations[1].state, "GA");

        let all = StationReader::with_us_only(false).read_stations(temp_file.path())?;
        assert_eq!(all.len(), 3);

        Ok(())
    }

    #[test]
    fn test_bad_coordinate_is_an_error() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "USC00010008  xx.5702  -85.2482  139.0 AL ABBEVILLE")?;

        let result = StationReader::new().read_stations(temp_file.path());
        assert!(result.is_err());

        Ok(())
    }
}
