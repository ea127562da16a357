pub mod constants;
pub mod filename;
pub mod geometry;
pub mod logging;
pub mod progress;
pub mod settings;

pub use constants::*;
pub use filename::{axes_sidecar_path, generate_default_tensor_filename};
pub use geometry::parse_geojson_geometry;
pub use logging::init_logging;
pub use progress::ProgressReporter;
pub use settings::{Settings, SettingsOverrides};
