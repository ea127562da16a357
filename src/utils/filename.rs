use crate::utils::constants::OUTPUT_DIR;
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// Generate default tensor filename with format:
/// monthly-county-weather-{START}-to-{END}-{YYMMDD}.{extension}
pub fn generate_default_tensor_filename(start_year: i32, end_year: i32, extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "monthly-county-weather-{}-to-{}-{:02}{:02}{:02}.{}",
        start_year, end_year, year, month, day, extension
    );
    PathBuf::from(OUTPUT_DIR).join(filename)
}

/// Sidecar path documenting the axes of a `.npy` tensor: `foo.npy` -> `foo.axes.json`
pub fn axes_sidecar_path(tensor_path: &Path) -> PathBuf {
    tensor_path.with_extension("axes.json")
}
