use crate::error::{ProcessingError, Result};
use crate::models::{Region, RegionId, RegionIndex};
use crate::utils::constants::{
    BOUNDARY_COUNTY_FIPS_COLUMN, BOUNDARY_DELIMITER, BOUNDARY_GEOMETRY_COLUMN,
    BOUNDARY_STATE_CODE_COLUMN, BOUNDARY_STATE_FIPS_COLUMN,
};
use std::path::Path;
use tracing::{info, warn};

/// Reader for the `;`-delimited US county boundary export, one county per row
/// with its GeoJSON shape.
pub struct BoundaryReader {
    delimiter: u8,
}

impl BoundaryReader {
    pub fn new() -> Self {
        Self {
            delimiter: BOUNDARY_DELIMITER,
        }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn read_regions(&self, path: &Path) -> Result<Vec<Region>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let min_columns = BOUNDARY_STATE_CODE_COLUMN + 1;
        let mut regions = Vec::new();

        for (row, result) in reader.records().enumerate() {
            let record = result?;

            if record.len() < min_columns {
                warn!(row = row + 1, columns = record.len(), "Skipping short boundary row");
                continue;
            }

            let id = county_id(
                &record[BOUNDARY_STATE_FIPS_COLUMN],
                &record[BOUNDARY_COUNTY_FIPS_COLUMN],
            )?;
            let state = record[BOUNDARY_STATE_CODE_COLUMN].trim();
            let region = Region::from_geojson(id, state, &record[BOUNDARY_GEOMETRY_COLUMN]);

            if !region.is_valid() {
                warn!(region = id, state = %state, "County boundary could not be parsed");
            }

            regions.push(region);
        }

        Ok(regions)
    }

    /// Load the boundary catalog straight into a region index
    pub fn read_index(&self, path: &Path) -> Result<RegionIndex> {
        let index = RegionIndex::from_regions(self.read_regions(path)?);
        info!(
            regions = index.region_count(),
            malformed = index.malformed_count(),
            "Loaded county boundaries"
        );
        Ok(index)
    }
}

impl Default for BoundaryReader {
    fn default() -> Self {
        Self::new()
    }
}

/// County id from the state and county FIPS columns: "01" + "001" -> 1001
pub fn county_id(state_fips: &str, county_fips: &str) -> Result<RegionId> {
    let joined = format!("{}{}", state_fips.trim(), county_fips.trim());
    joined.parse::<RegionId>().map_err(|_| {
        ProcessingError::InvalidFormat(format!(
            "Invalid county FIPS: state '{}', county '{}'",
            state_fips, county_fips
        ))
    })
}
