use crate::error::{ProcessingError, Result};
use crate::models::{AggregationTensor, ClimateDataset, Field, RegionId};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE, MONTHS_PER_YEAR,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Schema metadata keys documenting the tensor axes
pub const META_SHAPE: &str = "tensor.shape";
pub const META_YEARS: &str = "tensor.years";
pub const META_REGIONS: &str = "tensor.regions";
pub const META_FIELDS: &str = "tensor.fields";
pub const META_UNITS: &str = "tensor.units";
pub const META_MISSING: &str = "tensor.missing_value";

/// Writes a climate tensor as a long table: one row per (month, county) with
/// a nullable Float32 column per field. A null cell is a missing value.
pub struct TensorParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl TensorParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    pub fn write_dataset(&self, dataset: &ClimateDataset, path: &Path) -> Result<()> {
        let schema = self.create_schema(dataset);
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        let (months, regions, _) = dataset.tensor.shape();
        let total_rows = months * regions;
        let mut start = 0;
        while start < total_rows {
            let end = (start + self.row_group_size).min(total_rows);
            let batch = self.rows_to_batch(dataset, start..end, schema.clone())?;
            writer.write(&batch)?;
            start = end;
        }

        writer.close()?;
        Ok(())
    }

    fn create_schema(&self, dataset: &ClimateDataset) -> Arc<Schema> {
        let mut fields = vec![
            ArrowField::new("time_index", DataType::UInt32, false),
            ArrowField::new("year", DataType::Int32, false),
            ArrowField::new("month", DataType::UInt8, false),
            ArrowField::new("region_id", DataType::UInt32, false),
        ];
        fields.extend(
            dataset
                .fields
                .iter()
                .map(|f| ArrowField::new(f.code(), DataType::Float32, true)),
        );

        let (months, regions, field_count) = dataset.tensor.shape();
        let metadata = HashMap::from([
            (
                META_SHAPE.to_string(),
                format!("{},{},{}", months, regions, field_count),
            ),
            (META_YEARS.to_string(), join(&dataset.years)),
            (META_REGIONS.to_string(), join(&dataset.regions)),
            (
                META_FIELDS.to_string(),
                join(&dataset.fields.iter().map(|f| f.code()).collect::<Vec<_>>()),
            ),
            (
                META_UNITS.to_string(),
                join(&dataset.fields.iter().map(|f| f.units()).collect::<Vec<_>>()),
            ),
            (META_MISSING.to_string(), "null".to_string()),
        ]);

        Arc::new(Schema::new(fields).with_metadata(metadata))
    }

    /// Rows `range` of the (month, region) grid, in C order
    fn rows_to_batch(
        &self,
        dataset: &ClimateDataset,
        range: std::ops::Range<usize>,
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let (_, regions, _) = dataset.tensor.shape();

        let mut time_indices = Vec::with_capacity(range.len());
        let mut years = Vec::with_capacity(range.len());
        let mut months = Vec::with_capacity(range.len());
        let mut region_ids = Vec::with_capacity(range.len());
        for row in range.clone() {
            let time_index = row / regions;
            let (year, month) = dataset.month_label(time_index).ok_or_else(|| {
                ProcessingError::ShapeMismatch(format!("No year for month index {}", time_index))
            })?;
            time_indices.push(time_index as u32);
            years.push(year);
            months.push(month as u8);
            region_ids.push(dataset.regions[row % regions]);
        }

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(UInt32Array::from(time_indices)),
            Arc::new(Int32Array::from(years)),
            Arc::new(UInt8Array::from(months)),
            Arc::new(UInt32Array::from(region_ids)),
        ];
        for (field_index, _) in dataset.fields.iter().enumerate() {
            let values: Vec<Option<f32>> = range
                .clone()
                .map(|row| dataset.tensor.get(row / regions, row % regions, field_index))
                .collect();
            columns.push(Arc::new(Float32Array::from(values)));
        }

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Read a tensor file written by `write_dataset` back into memory
    pub fn read_dataset(&self, path: &Path) -> Result<ClimateDataset> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let metadata = builder.schema().metadata().clone();

        let years: Vec<i32> = parse_list(&metadata, META_YEARS)?;
        let regions: Vec<RegionId> = parse_list(&metadata, META_REGIONS)?;
        let fields = metadata_value(&metadata, META_FIELDS)?
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|code| {
                Field::from_code(code).ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!("Unknown field in metadata: {}", code))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let region_positions: HashMap<RegionId, usize> =
            regions.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut tensor =
            AggregationTensor::missing(years.len() * MONTHS_PER_YEAR, regions.len(), fields.len());

        for batch_result in builder.build()? {
            let batch = batch_result?;
            let time_indices = column::<UInt32Array>(&batch, "time_index")?;
            let region_ids = column::<UInt32Array>(&batch, "region_id")?;
            let field_columns = fields
                .iter()
                .map(|f| column::<Float32Array>(&batch, f.code()))
                .collect::<Result<Vec<_>>>()?;

            for row in 0..batch.num_rows() {
                let month = time_indices.value(row) as usize;
                if month >= years.len() * MONTHS_PER_YEAR {
                    return Err(ProcessingError::InvalidFormat(format!(
                        "time_index {} outside {} months listed in metadata",
                        month,
                        years.len() * MONTHS_PER_YEAR
                    )));
                }
                let region = *region_positions.get(&region_ids.value(row)).ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!(
                        "Region {} not listed in metadata",
                        region_ids.value(row)
                    ))
                })?;
                for (field_index, values) in field_columns.iter().enumerate() {
                    if values.is_valid(row) {
                        tensor.set(month, region, field_index, Some(values.value(row)))?;
                    }
                }
            }
        }

        ClimateDataset::new(years, regions, fields, tensor)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for TensorParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn metadata_value<'m>(metadata: &'m HashMap<String, String>, key: &str) -> Result<&'m str> {
    metadata
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ProcessingError::MissingData(format!("Parquet metadata key '{}'", key)))
}

fn parse_list<T: std::str::FromStr>(metadata: &HashMap<String, String>, key: &str) -> Result<Vec<T>> {
    metadata_value(metadata, key)?
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>().map_err(|_| {
                ProcessingError::InvalidFormat(format!("Invalid value '{}' in metadata '{}'", s, key))
            })
        })
        .collect()
}

fn column<'b, T: 'static>(batch: &'b RecordBatch, name: &str) -> Result<&'b T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column", name)))
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            if self.row_groups > 0 {
                self.total_rows as f64 / self.row_groups as f64
            } else {
                0.0
            }
        )
    }
}
