use crate::analyzers::TensorAnalyzer;
use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::models::StationRegionMapping;
use crate::processors::{ClimatePipeline, PipelineCoordinator, ResolutionReport, StationResolver};
use crate::readers::{read_mapping, AdjacencyReader, BoundaryReader, StationReader, YearArchiveReader};
use crate::utils::filename::generate_default_tensor_filename;
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use crate::utils::settings::{Settings, SettingsOverrides};
use crate::writers::{DatasetWriter, MappingWriter, OutputFormat, TensorParquetWriter};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config_file = cli.config.clone();
    let quiet = cli.quiet;
    let mut overrides = SettingsOverrides::new();

    match cli.command {
        Commands::Resolve {
            inputs,
            mapping_file,
        } => {
            inputs.apply(&mut overrides);
            overrides.set_path("mapping_file", mapping_file.as_deref());
            let settings = Settings::load(config_file.as_deref(), &overrides)?;

            let report = resolve_stations(settings, quiet).await?;
            println!("\n{}", report.summary());
        }

        Commands::Aggregate { mapping_file, run } => {
            overrides.set_path("mapping_file", mapping_file.as_deref());
            run.apply(&mut overrides);
            let settings = Settings::load(config_file.as_deref(), &overrides)?;

            let mapping = read_mapping(&settings.mapping_file)?;
            aggregate_years(settings, mapping, run.output_file, quiet).await?;
        }

        Commands::Process {
            inputs,
            mapping_file,
            force,
            run,
        } => {
            inputs.apply(&mut overrides);
            overrides.set_path("mapping_file", mapping_file.as_deref());
            run.apply(&mut overrides);
            let settings = Settings::load(config_file.as_deref(), &overrides)?;

            let mapping = if !force && settings.mapping_file.is_file() {
                println!(
                    "Reusing station mapping: {}",
                    settings.mapping_file.display()
                );
                read_mapping(&settings.mapping_file)?
            } else {
                let report = resolve_stations(settings.clone(), quiet).await?;
                println!("\n{}", report.summary());
                report.mapping
            };

            aggregate_years(settings, mapping, run.output_file, quiet).await?;
        }

        Commands::Info { file } => {
            println!("Analyzing tensor file: {}", file.display());

            let writer = TensorParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;
            println!("\n{}", file_info.summary());

            let stats = tokio::task::spawn_blocking(move || {
                TensorAnalyzer::new().analyze_parquet(&file)
            })
            .await??;
            println!("\n{}", stats.summary());
        }
    }

    Ok(())
}

/// Load the inputs, resolve every station and persist the mapping.
async fn resolve_stations(settings: Settings, quiet: bool) -> Result<ResolutionReport> {
    println!("Resolving stations to counties...");
    println!("Stations: {}", settings.stations_file.display());
    println!("Boundaries: {}", settings.boundaries_file.display());
    println!("Neighbors: {}", settings.neighbors_file.display());

    let start = Instant::now();
    let report = tokio::task::spawn_blocking(move || -> Result<ResolutionReport> {
        let stations = StationReader::new().read_stations(&settings.stations_file)?;
        let regions = BoundaryReader::new().read_index(&settings.boundaries_file)?;
        let adjacency = AdjacencyReader::new().read_graph(&settings.neighbors_file)?;

        let progress = ProgressReporter::new(stations.len() as u64, "Resolving stations...", quiet);
        let report = StationResolver::new(&regions, &adjacency).resolve(&stations, Some(&progress));

        MappingWriter::new().write_mapping(&report.mapping, &settings.mapping_file)?;
        Ok(report)
    })
    .await??;

    info!(elapsed = ?start.elapsed(), "Resolve phase finished");
    Ok(report)
}

/// Run the yearly pipeline against `mapping` and write the tensor.
async fn aggregate_years(
    settings: Settings,
    mapping: StationRegionMapping,
    output_file: Option<PathBuf>,
    quiet: bool,
) -> Result<PathBuf> {
    let format: OutputFormat = settings.output_format.parse()?;
    let output_file = output_file.unwrap_or_else(|| {
        generate_default_tensor_filename(settings.start_year, settings.end_year, format.extension())
    });

    println!(
        "Aggregating {}-{} from {}",
        settings.start_year,
        settings.end_year,
        settings.archive_dir.display()
    );
    println!("Output file: {}", output_file.display());
    println!("Workers: {}", settings.max_workers);

    let start = Instant::now();
    let written = output_file.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let years = settings.years();
        let archives = YearArchiveReader::new(&settings.archive_dir).with_mmap(settings.use_mmap);
        let coordinator = PipelineCoordinator::new(settings.max_workers)
            .with_fetch_retries(settings.fetch_retries)
            .with_retry_backoff(Duration::from_millis(settings.retry_backoff_ms));

        let pipeline = ClimatePipeline::new(mapping, archives, coordinator)
            .with_scale_divisor(settings.scale_divisor)
            .with_skip_quality_flagged(settings.skip_quality_flagged);

        let progress = ProgressReporter::new(years.len() as u64, "Aggregating years...", quiet);
        let dataset = pipeline.run(&years, Some(&progress))?;
        println!("\n{}", dataset.summary());

        DatasetWriter::new(format)
            .with_compression(&settings.compression)
            .write(&dataset, &output_file)
    })
    .await??;

    info!(elapsed = ?start.elapsed(), path = %written.display(), "Aggregate phase finished");
    println!("Processing complete!");
    Ok(written)
}
