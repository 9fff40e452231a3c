//! `taskdata`: inspect and export precision-agriculture task data.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use derived_cache::CacheConfig;
use taskdata_common::ValueRange;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use taskdata_cli::{
    export_raster, geojson_string, load_session, resolve_palette, series_ref, summarize,
};

#[derive(Parser, Debug)]
#[command(name = "taskdata")]
#[command(about = "Inspect task-data containers and export grids and time logs")]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print grids, series extents, ranges and warnings as JSON
    Summary {
        /// Container file
        container: PathBuf,
    },

    /// Render a grid to PNG
    Raster {
        container: PathBuf,

        /// Grid id
        #[arg(long)]
        grid: String,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Lower end of the color range (default: grid minimum)
        #[arg(long, requires = "max")]
        min: Option<f64>,

        /// Upper end of the color range (default: grid maximum)
        #[arg(long, requires = "min")]
        max: Option<f64>,

        /// Built-in palette name or palette JSON file
        #[arg(long, env = "PALETTE")]
        palette: Option<String>,
    },

    /// Export time log points as GeoJSON
    Geojson {
        container: PathBuf,

        /// Single time log id
        #[arg(long)]
        series: Option<String>,

        /// Task id whose time logs are merged
        #[arg(long)]
        task: Option<String>,

        /// Time log ids left out of the merged view
        #[arg(long)]
        exclude: Vec<String>,

        /// Interpolate missing field values
        #[arg(long)]
        filled: bool,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = CacheConfig::from_env();
    info!(outlier_method = ?config.outlier_method, "Loaded configuration");

    match args.command {
        Command::Summary { container } => {
            let session = load_session(&container, config)?;
            let summary = summarize(&session)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Raster {
            container,
            grid,
            output,
            min,
            max,
            palette,
        } => {
            let range = match (min, max) {
                (Some(min), Some(max)) => match ValueRange::new(min, max) {
                    Some(range) => Some(range),
                    None => bail!("invalid range {}..{}", min, max),
                },
                _ => None,
            };
            let palette = resolve_palette(palette.as_deref())?;
            let session = load_session(&container, config)?;
            let (width, height) = export_raster(&session, &grid, range, &palette, &output)?;
            info!(width, height, "Raster exported");
        }
        Command::Geojson {
            container,
            series,
            task,
            exclude,
            filled,
            output,
        } => {
            let series = series_ref(series.as_deref(), task.as_deref(), &exclude)?;
            let session = load_session(&container, config)?;
            let json = geojson_string(&session, &series, filled)?;
            match output {
                Some(path) => std::fs::write(&path, json)?,
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}
