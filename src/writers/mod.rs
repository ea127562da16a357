pub mod mapping_writer;
pub mod npy_writer;
pub mod parquet_writer;

pub use mapping_writer::MappingWriter;
pub use npy_writer::{NpyWriter, TensorAxes};
pub use parquet_writer::{ParquetFileInfo, TensorParquetWriter};

use crate::error::{ProcessingError, Result};
use crate::models::ClimateDataset;
use crate::utils::constants::COMPRESSION_SNAPPY;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Parquet,
    Npy,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Npy => "npy",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::Parquet),
            "npy" | "numpy" => Ok(OutputFormat::Npy),
            _ => Err(ProcessingError::Config(format!(
                "Unsupported output format: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Persists a dataset in whichever format was configured
pub struct DatasetWriter {
    format: OutputFormat,
    compression: String,
}

impl DatasetWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            compression: COMPRESSION_SNAPPY.to_string(),
        }
    }

    /// Only used for Parquet output.
    pub fn with_compression(mut self, compression: &str) -> Self {
        self.compression = compression.to_string();
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn write(&self, dataset: &ClimateDataset, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match self.format {
            OutputFormat::Parquet => TensorParquetWriter::new()
                .with_compression(&self.compression)?
                .write_dataset(dataset, path),
            OutputFormat::Npy => NpyWriter::new().write_dataset(dataset, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("Parquet".parse::<OutputFormat>().unwrap(), OutputFormat::Parquet);
        assert_eq!("npy".parse::<OutputFormat>().unwrap(), OutputFormat::Npy);
        assert!("netcdf".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Npy.to_string(), "npy");
    }
}
