/// Input file names
pub const STATIONS_FILE: &str = "ghcnd-stations.txt";
pub const BOUNDARIES_FILE: &str = "us-county-boundaries.csv";
pub const NEIGHBORS_FILE: &str = "neighbors-states.csv";
pub const MAPPING_FILE: &str = "ghcnd-to-county-id.json";

/// Directory names
pub const DATA_DIR: &str = "extra_data";
pub const ARCHIVE_DIR: &str = "by_year";
pub const OUTPUT_DIR: &str = "output";

/// Station catalog
pub const US_STATION_PREFIX: &str = "US";
pub const MISSING_ELEVATION: f64 = -999.9;

/// County boundary CSV layout
pub const BOUNDARY_DELIMITER: u8 = b';';
pub const BOUNDARY_GEOMETRY_COLUMN: usize = 1;
pub const BOUNDARY_STATE_FIPS_COLUMN: usize = 2;
pub const BOUNDARY_COUNTY_FIPS_COLUMN: usize = 3;
pub const BOUNDARY_STATE_CODE_COLUMN: usize = 8;

/// Observation values
pub const MISSING_RAW_VALUE: i64 = -9999;
pub const DEFAULT_SCALE_DIVISOR: f64 = 10.0;
pub const MONTHS_PER_YEAR: usize = 12;

/// Year range covered by the default run
pub const DEFAULT_START_YEAR: i32 = 1900;
pub const DEFAULT_END_YEAR: i32 = 2016;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const DEFAULT_FETCH_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Environment prefix for settings overrides
pub const ENV_PREFIX: &str = "COUNTY_WEATHER";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
