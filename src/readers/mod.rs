pub mod adjacency_reader;
pub mod archive_reader;
pub mod boundary_reader;
pub mod mapping_reader;
pub mod record_reader;
pub mod station_reader;

pub use adjacency_reader::AdjacencyReader;
pub use archive_reader::{RecordStream, YearArchiveReader};
pub use boundary_reader::BoundaryReader;
pub use mapping_reader::read_mapping;
pub use record_reader::{parse_record_line, RecordIterator};
pub use station_reader::StationReader;
