use crate::error::{ProcessingError, Result};
use crate::models::observation::Field;
use crate::models::region::RegionId;
use crate::utils::constants::MONTHS_PER_YEAR;
use ndarray::{Array3, ArrayView3, Axis};

/// Dense (month, region, field) array of monthly means. `None` marks a cell
/// no observation contributed to.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationTensor {
    values: Array3<Option<f32>>,
}

impl AggregationTensor {
    /// Tensor with every cell missing
    pub fn missing(months: usize, regions: usize, fields: usize) -> Self {
        Self {
            values: Array3::from_elem((months, regions, fields), None),
        }
    }

    pub fn from_array(values: Array3<Option<f32>>) -> Self {
        Self { values }
    }

    /// Build from row-major (C order) cell values
    pub fn from_values(
        months: usize,
        regions: usize,
        fields: usize,
        values: Vec<Option<f32>>,
    ) -> Result<Self> {
        let values = Array3::from_shape_vec((months, regions, fields), values)?;
        Ok(Self { values })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// Cell value, `None` when missing or out of bounds
    pub fn get(&self, month: usize, region: usize, field: usize) -> Option<f32> {
        self.values.get((month, region, field)).copied().flatten()
    }

    pub fn set(
        &mut self,
        month: usize,
        region: usize,
        field: usize,
        value: Option<f32>,
    ) -> Result<()> {
        let shape = self.shape();
        let cell = self.values.get_mut((month, region, field)).ok_or_else(|| {
            ProcessingError::ShapeMismatch(format!(
                "cell ({}, {}, {}) is outside a {:?} tensor",
                month, region, field, shape
            ))
        })?;
        *cell = value;
        Ok(())
    }

    pub fn view(&self) -> ArrayView3<'_, Option<f32>> {
        self.values.view()
    }

    /// Plain float array with missing cells as NaN
    pub fn to_nan_array(&self) -> Array3<f32> {
        self.values.mapv(|v| v.unwrap_or(f32::NAN))
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Concatenate along the month axis in the given order.
    pub fn concatenate(parts: Vec<AggregationTensor>) -> Result<Self> {
        if parts.is_empty() {
            return Err(ProcessingError::MissingData(
                "No tensors to concatenate".to_string(),
            ));
        }

        let views: Vec<ArrayView3<'_, Option<f32>>> = parts.iter().map(|p| p.view()).collect();
        let values = ndarray::concatenate(Axis(0), &views)?;
        Ok(Self { values })
    }
}

/// The persisted artifact: tensor plus the axis labels needed to read it.
#[derive(Debug, Clone)]
pub struct ClimateDataset {
    pub years: Vec<i32>,
    pub regions: Vec<RegionId>,
    pub fields: Vec<Field>,
    pub tensor: AggregationTensor,
}

impl ClimateDataset {
    pub fn new(
        years: Vec<i32>,
        regions: Vec<RegionId>,
        fields: Vec<Field>,
        tensor: AggregationTensor,
    ) -> Result<Self> {
        let expected = (years.len() * MONTHS_PER_YEAR, regions.len(), fields.len());
        if tensor.shape() != expected {
            return Err(ProcessingError::ShapeMismatch(format!(
                "tensor shape {:?} does not match axes {:?}",
                tensor.shape(),
                expected
            )));
        }
        Ok(Self {
            years,
            regions,
            fields,
            tensor,
        })
    }

    /// (year, month 1-12) of a month-axis index
    pub fn month_label(&self, time_index: usize) -> Option<(i32, u32)> {
        let year = self.years.get(time_index / MONTHS_PER_YEAR)?;
        Some((*year, (time_index % MONTHS_PER_YEAR) as u32 + 1))
    }

    pub fn summary(&self) -> String {
        let (months, regions, fields) = self.tensor.shape();
        let cells = months * regions * fields;
        let missing = self.tensor.missing_count();
        format!(
            "Climate Dataset Summary:\n\
            - Years: {}-{}\n\
            - Shape: ({}, {}, {})\n\
            - Fields: {}\n\
            - Missing cells: {} of {} ({:.1}%)",
            self.years.first().copied().unwrap_or_default(),
            self.years.last().copied().unwrap_or_default(),
            months,
            regions,
            fields,
            self.fields
                .iter()
                .map(|f| f.code())
                .collect::<Vec<_>>()
                .join(", "),
            missing,
            cells,
            if cells > 0 {
                missing as f64 / cells as f64 * 100.0
            } else {
                0.0
            }
        )
    }
}
