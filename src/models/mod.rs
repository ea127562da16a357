pub mod adjacency;
pub mod mapping;
pub mod observation;
pub mod region;
pub mod region_index;
pub mod station;
pub mod tensor;

pub use adjacency::AdjacencyGraph;
pub use mapping::{RegionAxis, StationRegionMapping};
pub use observation::{Field, ObservationRecord};
pub use region::{Region, RegionGeometry, RegionId};
pub use region_index::RegionIndex;
pub use station::Station;
pub use tensor::{AggregationTensor, ClimateDataset};
