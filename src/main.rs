//! Recosanté CLI - Command-line interface
//!
//! Resolves postal codes, prints the current readings for a municipality, or
//! keeps polling and prints every new snapshot.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use recosante::config::RecosanteConfig;
use recosante::coordinator::{RefreshCoordinator, RefreshOutcome, Snapshot};
use recosante::location_resolver::{LocationInput, LocationResolver};
use recosante::models::Location;
use recosante::sensor::{self, ReadingState, Sensor};
use recosante::{GeoApiClient, RecosanteClient, RecosanteError, logging};
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "recosante")]
#[command(about = "Air quality, pollen and UV readings from Recosanté", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the communes sharing a postal code
    Resolve {
        /// Five-digit French postal code
        postal_code: String,
    },
    /// Fetch once and print every reading
    Show {
        #[command(flatten)]
        location: LocationArgs,

        /// Print readings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Refresh every hour and print each new snapshot until interrupted
    Watch {
        #[command(flatten)]
        location: LocationArgs,

        /// Print readings as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct LocationArgs {
    /// INSEE code of the municipality
    #[arg(long, requires = "city", conflicts_with = "postal_code")]
    insee: Option<String>,

    /// Display name used with --insee
    #[arg(long, requires = "insee")]
    city: Option<String>,

    /// Postal code to resolve
    #[arg(long)]
    postal_code: Option<String>,

    /// INSEE code or "code;name" choice when several communes share the postal code
    #[arg(long, requires = "postal_code")]
    commune: Option<String>,
}

impl LocationArgs {
    fn to_input(&self) -> Option<LocationInput> {
        match (&self.insee, &self.city, &self.postal_code) {
            (Some(insee), Some(city), _) => Some(LocationInput::Insee {
                insee: insee.clone(),
                city: city.clone(),
            }),
            (_, _, Some(postal_code)) => Some(LocationInput::PostalCode {
                postal_code: postal_code.clone(),
                commune: self.commune.clone(),
            }),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        let message = e
            .downcast_ref::<RecosanteError>()
            .map_or_else(|| format!("{e:#}"), RecosanteError::user_message);
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = RecosanteConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    let geo = GeoApiClient::from_config(&config.api)?;

    match cli.command {
        Command::Resolve { postal_code } => {
            let communes = LocationResolver::candidates(&geo, &postal_code).await?;
            for commune in communes {
                println!("{}\t{}", commune.code, commune.nom);
            }
            Ok(())
        }
        Command::Show { location, json } => {
            let location = select_location(&location, &config, &geo).await?;
            let client = RecosanteClient::from_config(&config.api)?;
            let coordinator = RefreshCoordinator::new(client, location);
            report_outcome(coordinator.first_refresh().await?);
            let sensors = sensor::sensors_for(coordinator.location());
            print_readings(&sensors, &coordinator.snapshot(), json)
        }
        Command::Watch { location, json } => {
            let location = select_location(&location, &config, &geo).await?;
            let client = RecosanteClient::from_config(&config.api)?;
            watch(RefreshCoordinator::new(client, location), json).await
        }
    }
}

/// Location from the command line, else from the configuration file
async fn select_location(
    args: &LocationArgs,
    config: &RecosanteConfig,
    geo: &GeoApiClient,
) -> Result<Location> {
    if let Some(input) = args.to_input() {
        return Ok(LocationResolver::resolve_location(geo, input).await?);
    }
    match config.location.to_location() {
        Some(location) => Ok(location),
        None => bail!(
            "no location configured: pass --insee and --city, or --postal-code, \
             or set [location] in the configuration file"
        ),
    }
}

async fn watch(coordinator: RefreshCoordinator<RecosanteClient>, json: bool) -> Result<()> {
    let coordinator = Arc::new(coordinator);
    report_outcome(
        coordinator
            .first_refresh()
            .await
            .context("initial refresh failed")?,
    );

    let sensors = sensor::sensors_for(coordinator.location());
    print_readings(&sensors, &coordinator.snapshot(), json)?;

    let mut updates = coordinator.subscribe();
    let cancel = CancellationToken::new();
    let handle = Arc::clone(&coordinator).spawn(cancel.clone());
    info!(
        "Refreshing every {}s, press Ctrl-C to stop",
        coordinator.interval().as_secs()
    );

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_readings(&sensors, &snapshot, json)?;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("Stopping");
                break;
            }
        }
    }

    cancel.cancel();
    handle.await.context("refresh loop panicked")?;
    Ok(())
}

fn report_outcome(outcome: RefreshOutcome) {
    if let RefreshOutcome::NoData(message) = outcome {
        warn!("{}", message);
    }
}

fn print_readings(sensors: &[Sensor], snapshot: &Snapshot, json: bool) -> Result<()> {
    let states = sensor::render_all(sensors, snapshot);
    if json {
        println!("{}", serde_json::to_string_pretty(&states)?);
        return Ok(());
    }

    for state in &states {
        println!("{}", format_reading(state));
    }
    if let Some(attribution) = states
        .iter()
        .find(|state| state.is_available())
        .map(|state| &state.attributes.attribution)
    {
        println!("\n{attribution}");
    }
    Ok(())
}

fn format_reading(state: &ReadingState) -> String {
    let value = match &state.value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => return format!("{:<55} unavailable", state.name),
    };
    let unit = state.unit.map(|unit| format!(" {unit}")).unwrap_or_default();
    match &state.attributes.label {
        Some(label) => format!("{:<55} {value}{unit} ({label})", state.name),
        None => format!("{:<55} {value}{unit}", state.name),
    }
}
