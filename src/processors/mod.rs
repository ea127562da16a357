pub mod climate_pipeline;
pub mod pipeline_coordinator;
pub mod record_aggregator;
pub mod station_resolver;

pub use climate_pipeline::ClimatePipeline;
pub use pipeline_coordinator::PipelineCoordinator;
pub use record_aggregator::{aggregate, AggregationStats, RecordAggregator};
pub use station_resolver::{
    resolve, GeometryFailure, ResolutionReport, StationOutcome, StationResolver, UnresolvedReason,
    UnresolvedStation,
};
