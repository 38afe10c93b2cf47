use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glacier_stations::config::AppConfig;
use glacier_stations::glaciers::load_glaciers_async;
use glacier_stations::processing::{process_stations, ProcessOptions};
use glacier_stations::server::{self, AppState};
use glacier_stations::stations::{FileStationSource, HttpStationSource, StationSource};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch stations once and write those near glaciers as GeoJSON
    Filter {
        #[command(flatten)]
        common: CommonArgs,

        /// Read stations from a saved JSON response instead of the backend
        #[arg(long, value_name = "FILE")]
        stations_file: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Serve filtered stations and glacier lookups over HTTP
    Serve {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Station endpoint, overrides source.stations_url
    #[arg(long, env = "STATIONS_URL")]
    stations_url: Option<String>,

    /// Buffer distance in km, overrides filter.buffer_km
    #[arg(long, env = "BUFFER_KM")]
    buffer_km: Option<f64>,
}

impl CommonArgs {
    fn load_config(&self) -> Result<AppConfig> {
        AppConfig::load_from_file(&self.config)?
            .with_overrides(self.stations_url.clone(), self.buffer_km)
    }
}

fn options(config: &AppConfig) -> ProcessOptions {
    ProcessOptions {
        allowed_countries: config.source.allowed_countries.clone(),
        buffer_km: config.filter.buffer_km,
    }
}

fn http_source(config: &AppConfig) -> Result<HttpStationSource> {
    Ok(HttpStationSource::new(
        config.source.stations_url.clone(),
        Duration::from_secs(config.source.timeout_secs),
    )?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Filter {
            common,
            stations_file,
            output,
        } => {
            let config = common.load_config()?;
            let glaciers =
                load_glaciers_async(config.glaciers.path.clone(), config.glaciers.name_field.clone())
                    .await?;

            let source: Box<dyn StationSource> = match stations_file {
                Some(path) => Box::new(FileStationSource::new(path)),
                None => Box::new(http_source(&config)?),
            };

            let processed = process_stations(source.as_ref(), &glaciers, &options(&config)).await?;
            let geojson = serde_json::to_string_pretty(&processed.stations.to_geojson())?;

            match output {
                Some(path) => {
                    std::fs::write(&path, geojson)
                        .with_context(|| format!("Failed to write output: {:?}", path))?;
                    info!(path = ?path, count = processed.stations.len(), "Wrote filtered stations");
                }
                None => println!("{}", geojson),
            }
        }
        Commands::Serve { common } => {
            let config = common.load_config()?;

            // Refuse to start without geometry; requests never see an empty set
            let glaciers =
                load_glaciers_async(config.glaciers.path.clone(), config.glaciers.name_field.clone())
                    .await?;

            let state = AppState {
                glaciers,
                source: Box::new(http_source(&config)?),
                options: options(&config),
            };

            server::start_server(config.server.port, state).await?;
        }
    }

    Ok(())
}
