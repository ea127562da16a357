use crate::error::Result;
use crate::models::{ClimateDataset, Field, RegionAxis, StationRegionMapping};
use crate::processors::pipeline_coordinator::PipelineCoordinator;
use crate::processors::record_aggregator::{AggregationStats, RecordAggregator};
use crate::readers::YearArchiveReader;
use crate::utils::constants::DEFAULT_SCALE_DIVISOR;
use crate::utils::progress::ProgressReporter;
use std::sync::Mutex;
use tracing::{debug, info};

/// Yearly archives -> monthly county tensor. The region axis is derived once
/// from the mapping so every year shares it.
pub struct ClimatePipeline {
    mapping: StationRegionMapping,
    axis: RegionAxis,
    archives: YearArchiveReader,
    coordinator: PipelineCoordinator,
    scale_divisor: f64,
    skip_quality_flagged: bool,
}

impl ClimatePipeline {
    pub fn new(
        mapping: StationRegionMapping,
        archives: YearArchiveReader,
        coordinator: PipelineCoordinator,
    ) -> Self {
        let axis = mapping.region_axis();
        Self {
            mapping,
            axis,
            archives,
            coordinator,
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

    pub fn region_axis(&self) -> &RegionAxis {
        &self.axis
    }

    /// Aggregate `years` (in the given order) into a single dataset whose
    /// month axis runs through them consecutively.
    pub fn run(&self, years: &[i32], progress: Option<&ProgressReporter>) -> Result<ClimateDataset> {
        let (dataset, _) = self.run_with_stats(years, progress)?;
        Ok(dataset)
    }

    pub fn run_with_stats(
        &self,
        years: &[i32],
        progress: Option<&ProgressReporter>,
    ) -> Result<(ClimateDataset, AggregationStats)> {
        info!(
            years = years.len(),
            stations = self.mapping.len(),
            regions = self.axis.len(),
            "Starting aggregation"
        );

        let aggregator = RecordAggregator::new(&self.mapping, &self.axis)
            .with_scale_divisor(self.scale_divisor)
            .with_skip_quality_flagged(self.skip_quality_flagged);
        let totals = Mutex::new(AggregationStats::default());

        let tensor = self.coordinator.run(
            years,
            |year| self.archives.open(*year),
            |year, stream| {
                let (tensor, stats) = aggregator.aggregate_with_stats(*year, stream)?;
                debug!(
                    year,
                    records = stats.records,
                    aggregated = stats.aggregated,
                    unmapped_station = stats.unmapped_station,
                    unknown_field = stats.unknown_field,
                    outside_partition = stats.outside_partition,
                    missing_value = stats.missing_value,
                    quality_flagged = stats.quality_flagged,
                    "Year aggregated"
                );
                if let Ok(mut totals) = totals.lock() {
                    totals.merge(&stats);
                }
                Ok(tensor)
            },
            progress,
        )?;

        let stats = totals.into_inner().unwrap_or_default();
        info!(
            records = stats.records,
            aggregated = stats.aggregated,
            skipped = stats.skipped(),
            "Aggregation complete"
        );

        let dataset = ClimateDataset::new(
            years.to_vec(),
            self.axis.ids().to_vec(),
            Field::ALL.to_vec(),
            tensor,
        )?;
        Ok((dataset, stats))
    }
}
