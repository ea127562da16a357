use crate::error::{ProcessingError, Result};
use crate::models::{AggregationTensor, Field, ObservationRecord, RegionAxis, StationRegionMapping};
use crate::utils::constants::{DEFAULT_SCALE_DIVISOR, MISSING_RAW_VALUE, MONTHS_PER_YEAR};
use chrono::Datelike;
use ndarray::{Array3, Zip};

/// Per-partition record accounting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub records: u64,
    pub aggregated: u64,
    pub unmapped_station: u64,
    pub unknown_field: u64,
    pub outside_partition: u64,
    pub missing_value: u64,
    pub quality_flagged: u64,
}

impl AggregationStats {
    pub fn skipped(&self) -> u64 {
        self.records - self.aggregated
    }

    pub fn merge(&mut self, other: &AggregationStats) {
        self.records += other.records;
        self.aggregated += other.aggregated;
        self.unmapped_station += other.unmapped_station;
        self.unknown_field += other.unknown_field;
        self.outside_partition += other.outside_partition;
        self.missing_value += other.missing_value;
        self.quality_flagged += other.quality_flagged;
    }
}

/// Running integer sums and counts per (month, region, field) cell. Raw values
/// are summed exactly, so the result does not depend on record order.
struct MonthlyAccumulator {
    sums: Array3<i64>,
    counts: Array3<u32>,
}

impl MonthlyAccumulator {
    fn new(regions: usize, fields: usize) -> Self {
        let shape = (MONTHS_PER_YEAR, regions, fields);
        Self {
            sums: Array3::zeros(shape),
            counts: Array3::zeros(shape),
        }
    }

    fn add(&mut self, month: usize, region: usize, field: usize, value: i64) {
        self.sums[[month, region, field]] += value;
        self.counts[[month, region, field]] += 1;
    }

    fn finalize(self, scale_divisor: f64) -> AggregationTensor {
        let values = Zip::from(&self.sums)
            .and(&self.counts)
            .map_collect(|&sum, &count| {
                (count > 0).then(|| (sum as f64 / count as f64 / scale_divisor) as f32)
            });

        AggregationTensor::from_array(values)
    }
}

/// Reduces one year of daily observations into a 12 x regions x fields tensor
/// of monthly means.
pub struct RecordAggregator<'a> {
    mapping: &'a StationRegionMapping,
    axis: &'a RegionAxis,
    scale_divisor: f64,
    skip_quality_flagged: bool,
}

impl<'a> RecordAggregator<'a> {
    pub fn new(mapping: &'a StationRegionMapping, axis: &'a RegionAxis) -> Self {
        Self {
            mapping,
            axis,
            scale_divisor: DEFAULT_SCALE_DIVISOR,
            skip_quality_flagged: false,
        }
    }

    pub fn with_scale_divisor(mut self, scale_divisor: f64) -> Self {
        self.scale_divisor = scale_divisor;
        self
    }

    pub fn with_skip_quality_flagged(mut self, skip: bool) -> Self {
        self.skip_quality_flagged = skip;
        self
    }

    pub fn aggregate<I>(&self, year: i32, records: I) -> Result<AggregationTensor>
    where
        I: IntoIterator<Item = Result<ObservationRecord>>,
    {
        self.aggregate_with_stats(year, records).map(|(tensor, _)| tensor)
    }

    /// Aggregate a partition's record stream. Records for unmapped stations,
    /// unknown elements, other years, missing values and (optionally) quality
    /// flags are counted and skipped; a stream error fails the partition.
    pub fn aggregate_with_stats<I>(
        &self,
        year: i32,
        records: I,
    ) -> Result<(AggregationTensor, AggregationStats)>
    where
        I: IntoIterator<Item = Result<ObservationRecord>>,
    {
        if !self.scale_divisor.is_finite() || self.scale_divisor == 0.0 {
            return Err(ProcessingError::Config(format!(
                "Invalid scale divisor: {}",
                self.scale_divisor
            )));
        }

        let mut accumulator = MonthlyAccumulator::new(self.axis.len(), Field::ALL.len());
        let mut stats = AggregationStats::default();

        for record in records {
            let record = record?;
            stats.records += 1;

            let Some(region) = self
                .mapping
                .get(&record.station_id)
                .and_then(|id| self.axis.index_of(id))
            else {
                stats.unmapped_station += 1;
                continue;
            };

            let Some(field) = record.field() else {
                stats.unknown_field += 1;
                continue;
            };

            if record.date.year() != year {
                stats.outside_partition += 1;
                continue;
            }

            if record.value == MISSING_RAW_VALUE {
                stats.missing_value += 1;
                continue;
            }

            if self.skip_quality_flagged && record.is_quality_flagged() {
                stats.quality_flagged += 1;
                continue;
            }

            let month = record.date.month0() as usize;
            accumulator.add(month, region, field.index(), record.value);
            stats.aggregated += 1;
        }

        Ok((accumulator.finalize(self.scale_divisor), stats))
    }
}

/// Aggregate one year of records against a mapping and its shared region axis.
pub fn aggregate<I>(
    year: i32,
    records: I,
    mapping: &StationRegionMapping,
    axis: &RegionAxis,
) -> Result<AggregationTensor>
where
    I: IntoIterator<Item = Result<ObservationRecord>>,
{
    RecordAggregator::new(mapping, axis).aggregate(year, records)
}
