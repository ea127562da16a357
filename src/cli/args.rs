use crate::utils::settings::SettingsOverrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "county-weather")]
#[command(about = "Aggregate GHCN-Daily station records into monthly US county weather")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Settings file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Hide progress bars")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assign every US station to the county containing it
    Resolve {
        #[command(flatten)]
        inputs: ResolveArgs,

        #[arg(short, long, help = "Mapping JSON to write")]
        mapping_file: Option<PathBuf>,
    },

    /// Aggregate yearly archives into a monthly county tensor using an existing mapping
    Aggregate {
        #[arg(short, long, help = "Station mapping JSON")]
        mapping_file: Option<PathBuf>,

        #[command(flatten)]
        run: AggregateArgs,
    },

    /// Resolve stations (unless a mapping is cached) and aggregate
    Process {
        #[command(flatten)]
        inputs: ResolveArgs,

        #[arg(short, long, help = "Station mapping JSON (reused when present)")]
        mapping_file: Option<PathBuf>,

        #[arg(long, help = "Rebuild the mapping even if it exists")]
        force: bool,

        #[command(flatten)]
        run: AggregateArgs,
    },

    /// Display information about a tensor Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    #[arg(long, help = "GHCN station catalog (ghcnd-stations.txt)")]
    pub stations_file: Option<PathBuf>,

    #[arg(long, help = "County boundaries CSV")]
    pub boundaries_file: Option<PathBuf>,

    #[arg(long, help = "State adjacency CSV")]
    pub neighbors_file: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct AggregateArgs {
    #[arg(short, long, help = "Directory of {year}.csv[.gz] archives")]
    pub archive_dir: Option<PathBuf>,

    #[arg(long)]
    pub start_year: Option<i32>,

    #[arg(long)]
    pub end_year: Option<i32>,

    #[arg(
        short,
        long,
        help = "Output file [default: output/monthly-county-weather-{START}-to-{END}-{YYMMDD}.{ext}]"
    )]
    pub output_file: Option<PathBuf>,

    #[arg(long, help = "parquet or npy")]
    pub output_format: Option<String>,

    #[arg(short, long, help = "Parquet compression: snappy, gzip, lz4, zstd, none")]
    pub compression: Option<String>,

    #[arg(long)]
    pub max_workers: Option<usize>,

    #[arg(long, help = "Retries per archive fetch")]
    pub fetch_retries: Option<u32>,

    #[arg(long, help = "Divisor applied to raw values (tenths -> units)")]
    pub scale_divisor: Option<f64>,

    #[arg(long, help = "Drop records carrying a quality flag")]
    pub skip_quality_flagged: bool,

    #[arg(long, help = "Memory-map uncompressed archives")]
    pub use_mmap: bool,
}

impl ResolveArgs {
    pub fn apply(&self, overrides: &mut SettingsOverrides) {
        overrides
            .set_path("stations_file", self.stations_file.as_deref())
            .set_path("boundaries_file", self.boundaries_file.as_deref())
            .set_path("neighbors_file", self.neighbors_file.as_deref());
    }
}

impl AggregateArgs {
    pub fn apply(&self, overrides: &mut SettingsOverrides) {
        overrides
            .set_path("archive_dir", self.archive_dir.as_deref())
            .set_opt("start_year", self.start_year.map(i64::from))
            .set_opt("end_year", self.end_year.map(i64::from))
            .set_opt("output_format", self.output_format.clone())
            .set_opt("compression", self.compression.clone())
            .set_opt("max_workers", self.max_workers.map(|n| n as i64))
            .set_opt("fetch_retries", self.fetch_retries.map(i64::from))
            .set_opt("scale_divisor", self.scale_divisor);

        // Flags only ever switch these on
        if self.skip_quality_flagged {
            overrides.set("skip_quality_flagged", true);
        }
        if self.use_mmap {
            overrides.set("use_mmap", true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_arguments() {
        let cli = Cli::parse_from([
            "county-weather",
            "process",
            "--force",
            "--start-year",
            "2000",
            "--end-year",
            "2001",
            "--output-format",
            "npy",
            "--verbose",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Process { force, run, inputs, .. } => {
                assert!(force);
                assert_eq!(run.start_year, Some(2000));
                assert_eq!(run.output_format.as_deref(), Some("npy"));
                assert!(inputs.stations_file.is_none());

                let mut overrides = SettingsOverrides::new();
                run.apply(&mut overrides);
                assert!(!overrides.is_empty());
            }
            _ => panic!("expected process command"),
        }
    }
}
