use crate::error::{ProcessingError, Result};
use crate::utils::constants::*;
use config::{Config, Environment, File, Value};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Run configuration. Layers, lowest precedence first: built-in defaults,
/// an optional config file, `COUNTY_WEATHER_*` environment variables, then
/// command-line overrides.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    pub stations_file: PathBuf,
    pub boundaries_file: PathBuf,
    pub neighbors_file: PathBuf,
    pub mapping_file: PathBuf,
    pub archive_dir: PathBuf,

    #[validate(range(min = 1763, max = 2100))]
    pub start_year: i32,
    #[validate(range(min = 1763, max = 2100))]
    pub end_year: i32,

    #[validate(range(min = 1))]
    pub max_workers: usize,
    pub fetch_retries: u32,
    pub retry_backoff_ms: u64,

    pub scale_divisor: f64,
    pub skip_quality_flagged: bool,
    pub use_mmap: bool,

    pub compression: String,
    pub output_format: String,
}

/// Values supplied on the command line; unset entries leave lower layers alone.
#[derive(Debug, Default)]
pub struct SettingsOverrides {
    values: Vec<(String, Value)>,
}

impl SettingsOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.values.push((key.to_string(), value.into()));
        self
    }

    pub fn set_path(&mut self, key: &str, path: Option<&Path>) -> &mut Self {
        if let Some(path) = path {
            self.set(key, path.to_string_lossy().into_owned());
        }
        self
    }

    pub fn set_opt<T: Into<Value>>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Settings {
    pub fn load(config_file: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self> {
        let data_dir = PathBuf::from(DATA_DIR);
        let data_path = |name: &str| data_dir.join(name).to_string_lossy().into_owned();

        let mut builder = Config::builder()
            .set_default("stations_file", data_path(STATIONS_FILE))?
            .set_default("boundaries_file", data_path(BOUNDARIES_FILE))?
            .set_default("neighbors_file", data_path(NEIGHBORS_FILE))?
            .set_default("mapping_file", data_path(MAPPING_FILE))?
            .set_default("archive_dir", data_path(ARCHIVE_DIR))?
            .set_default("start_year", DEFAULT_START_YEAR as i64)?
            .set_default("end_year", DEFAULT_END_YEAR as i64)?
            .set_default("max_workers", num_cpus::get() as i64)?
            .set_default("fetch_retries", DEFAULT_FETCH_RETRIES as i64)?
            .set_default("retry_backoff_ms", DEFAULT_RETRY_BACKOFF_MS as i64)?
            .set_default("scale_divisor", DEFAULT_SCALE_DIVISOR)?
            .set_default("skip_quality_flagged", false)?
            .set_default("use_mmap", false)?
            .set_default("compression", COMPRESSION_SNAPPY)?
            .set_default("output_format", "parquet")?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        for (key, value) in &overrides.values {
            builder = builder.set_override(key.as_str(), value.clone())?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        settings.check_ranges()?;
        Ok(settings)
    }

    fn check_ranges(&self) -> Result<()> {
        if self.start_year > self.end_year {
            return Err(ProcessingError::Config(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }
        if !self.scale_divisor.is_finite() || self.scale_divisor == 0.0 {
            return Err(ProcessingError::Config(format!(
                "scale_divisor must be a non-zero number, got {}",
                self.scale_divisor
            )));
        }
        Ok(())
    }

    pub fn years(&self) -> Vec<i32> {
        (self.start_year..=self.end_year).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() -> Result<()> {
        let settings = Settings::load(None, &SettingsOverrides::new())?;

        assert_eq!(settings.stations_file, PathBuf::from("extra_data/ghcnd-stations.txt"));
        assert_eq!(settings.archive_dir, PathBuf::from("extra_data/by_year"));
        assert_eq!(settings.start_year, DEFAULT_START_YEAR);
        assert_eq!(settings.end_year, DEFAULT_END_YEAR);
        assert_eq!(settings.scale_divisor, 10.0);
        assert!(!settings.skip_quality_flagged);
        assert_eq!(settings.compression, "snappy");
        assert!(settings.max_workers >= 1);

        Ok(())
    }

    #[test]
    fn test_file_then_overrides() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("county-weather.toml");
        std::fs::write(
            &path,
            "start_year = 1950\nend_year = 1960\nmax_workers = 3\ncompression = \"zstd\"\n",
        )?;

        let mut overrides = SettingsOverrides::new();
        overrides
            .set_opt("end_year", Some(1955i64))
            .set_opt::<i64>("max_workers", None)
            .set_path("archive_dir", Some(Path::new("/data/by_year")));

        let settings = Settings::load(Some(&path), &overrides)?;

        assert_eq!(settings.start_year, 1950);
        assert_eq!(settings.end_year, 1955);
        assert_eq!(settings.max_workers, 3);
        assert_eq!(settings.compression, "zstd");
        assert_eq!(settings.archive_dir, PathBuf::from("/data/by_year"));
        assert_eq!(settings.years().len(), 6);

        Ok(())
    }

    #[test]
    fn test_inverted_year_range_rejected() {
        let mut overrides = SettingsOverrides::new();
        overrides.set("start_year", 2000i64).set("end_year", 1990i64);

        assert!(matches!(
            Settings::load(None, &overrides),
            Err(ProcessingError::Config(_))
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut overrides = SettingsOverrides::new();
        overrides.set("max_workers", 0i64);

        assert!(matches!(
            Settings::load(None, &overrides),
            Err(ProcessingError::Validation(_))
        ));
    }
}
