use crate::error::{ProcessingError, Result};
use crate::models::{ClimateDataset, Field, RegionId};
use crate::writers::TensorParquetWriter;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct CellLocation {
    pub year: i32,
    pub month: u32,
    pub region: RegionId,
}

#[derive(Debug, Clone)]
pub struct FieldStatistics {
    pub field: Field,
    pub present: usize,
    pub total: usize,
    pub min: Option<(f32, CellLocation)>,
    pub max: Option<(f32, CellLocation)>,
    pub mean: Option<f64>,
}

impl FieldStatistics {
    pub fn coverage_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.present as f64 / self.total as f64 * 100.0
    }
}

#[derive(Debug)]
pub struct TensorStatistics {
    pub year_range: (i32, i32),
    pub months: usize,
    pub regions: usize,
    pub fields: Vec<FieldStatistics>,
}

pub struct TensorAnalyzer;

impl TensorAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_parquet(&self, path: &Path) -> Result<TensorStatistics> {
        let dataset = TensorParquetWriter::new().read_dataset(path)?;
        self.analyze(&dataset)
    }

    pub fn analyze(&self, dataset: &ClimateDataset) -> Result<TensorStatistics> {
        let (months, regions, _) = dataset.tensor.shape();
        let (Some(first), Some(last)) = (dataset.years.first(), dataset.years.last()) else {
            return Err(ProcessingError::MissingData(
                "Dataset has no years to analyze".to_string(),
            ));
        };

        let fields = dataset
            .fields
            .iter()
            .enumerate()
            .map(|(f, field)| {
                let mut stats = FieldStatistics {
                    field: *field,
                    present: 0,
                    total: months * regions,
                    min: None,
                    max: None,
                    mean: None,
                };
                let mut sum = 0.0f64;

                for t in 0..months {
                    for r in 0..regions {
                        let Some(value) = dataset.tensor.get(t, r, f) else {
                            continue;
                        };
                        stats.present += 1;
                        sum += value as f64;

                        let location = || {
                            let (year, month) = dataset.month_label(t).unwrap_or((*first, 1));
                            CellLocation {
                                year,
                                month,
                                region: dataset.regions[r],
                            }
                        };
                        if stats.min.as_ref().map_or(true, |(min, _)| value < *min) {
                            stats.min = Some((value, location()));
                        }
                        if stats.max.as_ref().map_or(true, |(max, _)| value > *max) {
                            stats.max = Some((value, location()));
                        }
                    }
                }

                if stats.present > 0 {
                    stats.mean = Some(sum / stats.present as f64);
                }
                stats
            })
            .collect();

        Ok(TensorStatistics {
            year_range: (*first, *last),
            months,
            regions,
            fields,
        })
    }
}

impl Default for TensorAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TensorStatistics {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Monthly County Weather\n\
            Years: {} to {} ({} months)\n\
            Counties: {}\n\
            Fields: {}",
            self.year_range.0,
            self.year_range.1,
            self.months,
            self.regions,
            self.fields.len()
        );

        for stats in &self.fields {
            let range = match (&stats.min, &stats.max) {
                (Some((min, min_at)), Some((max, max_at))) => format!(
                    "{:.1} {units} ({} {}-{:02}) to {:.1} {units} ({} {}-{:02})",
                    min,
                    min_at.region,
                    min_at.year,
                    min_at.month,
                    max,
                    max_at.region,
                    max_at.year,
                    max_at.month,
                    units = stats.field.units()
                ),
                _ => "No valid measurements".to_string(),
            };
            out.push_str(&format!(
                "\n- {}: {:.1}% coverage, {}",
                stats.field.code(),
                stats.coverage_percentage(),
                range
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregationTensor;

    #[test]
    fn test_field_extremes_and_coverage() -> Result<()> {
        let mut tensor = AggregationTensor::missing(24, 2, 5);
        let tmax = Field::MaxTemperature.index();
        tensor.set(0, 0, tmax, Some(-3.5))?;
        tensor.set(18, 1, tmax, Some(31.0))?;
        tensor.set(5, 1, tmax, Some(12.5))?;
        let dataset =
            ClimateDataset::new(vec![2000, 2001], vec![1001, 1003], Field::ALL.to_vec(), tensor)?;

        let stats = TensorAnalyzer::new().analyze(&dataset)?;
        let tmax_stats = &stats.fields[tmax];

        assert_eq!(stats.year_range, (2000, 2001));
        assert_eq!(tmax_stats.present, 3);
        assert_eq!(tmax_stats.total, 48);
        assert_eq!(tmax_stats.mean, Some(40.0 / 3.0));
        assert_eq!(
            tmax_stats.max,
            Some((31.0, CellLocation { year: 2001, month: 7, region: 1003 }))
        );
        assert_eq!(tmax_stats.min.as_ref().map(|(v, _)| *v), Some(-3.5));
        assert!(stats.fields[Field::Snowfall.index()].mean.is_none());
        assert!(stats.summary().contains("No valid measurements"));

        Ok(())
    }
}
