use crate::error::Result;
use crate::models::StationRegionMapping;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Load a station -> county mapping written by `MappingWriter`.
pub fn read_mapping(path: &Path) -> Result<StationRegionMapping> {
    let file = File::open(path)?;
    let mapping: StationRegionMapping = serde_json::from_reader(BufReader::new(file))?;
    info!(stations = mapping.len(), path = %path.display(), "Loaded station mapping");
    Ok(mapping)
}
