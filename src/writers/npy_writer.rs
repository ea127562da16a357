use crate::error::Result;
use crate::models::{ClimateDataset, RegionId};
use crate::utils::filename::axes_sidecar_path;
use ndarray_npy::write_npy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Axis labels written next to a `.npy` tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorAxes {
    pub shape: [usize; 3],
    pub time_axis: String,
    pub years: Vec<i32>,
    pub regions: Vec<RegionId>,
    pub fields: Vec<String>,
    pub units: Vec<String>,
    pub missing_value: String,
}

impl TensorAxes {
    pub fn from_dataset(dataset: &ClimateDataset) -> Self {
        let (months, regions, fields) = dataset.tensor.shape();
        Self {
            shape: [months, regions, fields],
            time_axis: "12 * (year - years[0]) + (month - 1)".to_string(),
            years: dataset.years.clone(),
            regions: dataset.regions.clone(),
            fields: dataset.fields.iter().map(|f| f.code().to_string()).collect(),
            units: dataset.fields.iter().map(|f| f.units().to_string()).collect(),
            missing_value: "NaN".to_string(),
        }
    }
}

/// Writes the tensor as a NumPy `.npy` array (`<f4`, C order, NaN for
/// missing cells) plus a `*.axes.json` sidecar.
pub struct NpyWriter;

impl NpyWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_dataset(&self, dataset: &ClimateDataset, path: &Path) -> Result<()> {
        write_npy(path, &dataset.tensor.to_nan_array())?;

        let sidecar = File::create(axes_sidecar_path(path))?;
        serde_json::to_writer_pretty(BufWriter::new(sidecar), &TensorAxes::from_dataset(dataset))?;

        Ok(())
    }
}

impl Default for NpyWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregationTensor, Field};
    use ndarray::Array3;
    use ndarray_npy::read_npy;
    use tempfile::TempDir;

    #[test]
    fn test_write_dataset() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("weather.npy");

        let mut tensor = AggregationTensor::missing(12, 2, 5);
        tensor.set(0, 0, Field::MaxTemperature.index(), Some(25.0))?;
        let dataset = ClimateDataset::new(vec![2000], vec![1, 2], Field::ALL.to_vec(), tensor)?;

        NpyWriter::new().write_dataset(&dataset, &path)?;

        let array: Array3<f32> = read_npy(&path).unwrap();
        assert_eq!(array.dim(), (12, 2, 5));
        assert_eq!(array[[0, 0, 1]], 25.0);
        assert!(array[[0, 0, 0]].is_nan());
        assert!(array[[11, 1, 4]].is_nan());

        let axes: TensorAxes =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("weather.axes.json"))?)?;
        assert_eq!(axes.shape, [12, 2, 5]);
        assert_eq!(axes.regions, vec![1, 2]);
        assert_eq!(axes.fields[1], "TMAX");

        Ok(())
    }
}
