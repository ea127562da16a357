use crate::error::Result;
use crate::models::StationRegionMapping;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Persists the station -> county mapping as a flat JSON object
/// (`{"USC00012345": 1001, ...}`).
pub struct MappingWriter {
    pretty: bool,
}

impl MappingWriter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn write_mapping(&self, mapping: &StationRegionMapping, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut out = BufWriter::new(File::create(path)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut out, mapping)?;
        } else {
            serde_json::to_writer(&mut out, mapping)?;
        }
        out.flush()?;

        info!(stations = mapping.len(), path = %path.display(), "Wrote station mapping");
        Ok(())
    }
}

impl Default for MappingWriter {
    fn default() -> Self {
        Self::new()
    }
}
