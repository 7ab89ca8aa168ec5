//! `fishlog` - CLI for the fishing-trip log
//!
//! This binary wires the command line to the trip store, the analysis
//! builders and the tide, weather and photo services.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::{info, warn};

use fishlog::analysis::{build_report, AnalysisOptions, ALL_AREAS};
use fishlog::check::{autofill, run_check, tide_at, Sources};
use fishlog::cli::{
    AddCommand, AnalyzeCommand, CheckCommand, Cli, Command, ConfigCommand, DeleteCommand,
    EditCommand, ListCommand, ShowCommand, SpotsCommand, TideCommand,
};
use fishlog::config::STARTER_CONFIG;
use fishlog::listing::{self, ListOptions};
use fishlog::photos::{apply_plan, plan_edit, upload_new, SlotPlan};
use fishlog::render::{self, views, OutputFormat};
use fishlog::storage::{open_store, LogStore};
use fishlog::trip::{NewTrip, TripUpdate};
use fishlog::{init_logging, Config};
use fishlog_forecast::{
    CloudinaryHost, ImageHost, OpenMeteoClient, OpenMeteoMarineClient, Tide736Client,
};

/// The live service clients.
#[derive(Debug)]
struct Services {
    tide: Tide736Client,
    weather: OpenMeteoClient,
    sea: OpenMeteoMarineClient,
}

impl Services {
    fn from_config(config: &Config) -> Result<Self> {
        let settings = config.http_settings();
        let forecast = &config.forecast;
        Ok(Self {
            tide: Tide736Client::new(forecast.tide_base_url.clone(), &settings)?,
            weather: OpenMeteoClient::new(
                forecast.weather_base_url.clone(),
                forecast.timezone.clone(),
                &settings,
            )?,
            sea: OpenMeteoMarineClient::new(
                forecast.marine_base_url.clone(),
                forecast.timezone.clone(),
                &settings,
            )?,
        })
    }

    fn sources(&self) -> Sources<'_> {
        Sources {
            tide: &self.tide,
            weather: &self.weather,
            sea: &self.sea,
        }
    }
}

fn image_host(config: &Config) -> Result<CloudinaryHost> {
    let images = &config.images;
    let host = CloudinaryHost::new(
        images.base_url.clone(),
        images.cloud_name.clone(),
        images.upload_preset.clone(),
        images.folder.clone(),
        &config.http_settings(),
    )?;
    if !host.is_configured() {
        bail!("photo upload needs images.cloud_name and images.upload_preset in the configuration");
    }
    Ok(host)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn open(config: &Config) -> Result<Box<dyn LogStore>> {
    open_store(config).with_context(|| {
        format!(
            "failed to open the {} store at {}",
            config.storage.backend,
            config.store_path().display()
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config_path = cli.config.clone();
    let load = || Config::load_from(config_path.clone()).context("failed to load configuration");

    match cli.command {
        Command::Add(cmd) => handle_add(&load()?, cmd).await,
        Command::List(cmd) => handle_list(&load()?, &cmd),
        Command::Show(cmd) => handle_show(&load()?, &cmd),
        Command::Edit(cmd) => handle_edit(&load()?, cmd).await,
        Command::Delete(cmd) => handle_delete(&load()?, &cmd),
        Command::Analyze(cmd) => handle_analyze(&load()?, &cmd),
        Command::Check(cmd) => handle_check(&load()?, &cmd).await,
        Command::Tide(cmd) => handle_tide(&load()?, &cmd).await,
        Command::Spots(cmd) => handle_spots(&load()?, &cmd),
        Command::Status(cmd) => handle_status(&load()?, cmd.json),
        Command::Config(cmd) => handle_config(config_path.clone(), cmd),
    }
}

async fn handle_add(config: &Config, cmd: AddCommand) -> Result<()> {
    let date = cmd.date.unwrap_or_else(today);
    let mut trip = NewTrip::on(date);
    trip.time = cmd.time;
    trip.area = cmd.area;
    if let Some(phase) = cmd.tide {
        trip.tide_phase = phase;
    }
    trip.tide_height = cmd.tide_height;
    trip.temperature = cmd.temp;
    trip.wind_direction = cmd.wind;
    trip.lure = cmd.lure;
    trip.action = cmd.action;
    trip.size = cmd.size;
    let mut trip = trip.normalized()?;
    let mut store = open(config)?;

    if cmd.auto {
        let spot = config.resolve_spot(cmd.spot.as_deref())?;
        let services = Services::from_config(config)?;
        let filled = autofill(&mut trip, spot, services.sources()).await;
        if !filled.filled.is_empty() {
            println!("Filled from {}: {}", spot.name, filled.filled.join(", "));
        }
        for w in &filled.warnings {
            eprintln!("warning: {w}");
        }
    }

    if !cmd.photo.is_empty() {
        let host = image_host(config)?;
        trip.photos = upload_new(&host, date, &trip.area, &cmd.photo)
            .await
            .context("photo upload failed; the trip was not saved")?;
    }

    let id = store.insert(&trip)?;
    info!(id, %date, "trip added");
    println!("Added trip {id} ({date}).");
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand) -> Result<()> {
    let store = open(config)?;
    let options = ListOptions {
        key: cmd.sort.into(),
        order: cmd.order.into(),
        then: cmd.then.to_then(),
        area: cmd.area.clone(),
    };
    let trips = listing::list(store.fetch_all()?, &options);
    print!("{}", views::trip_list(&trips, cmd.format.into())?);
    Ok(())
}

fn handle_show(config: &Config, cmd: &ShowCommand) -> Result<()> {
    let store = open(config)?;
    let Some(trip) = store.get(cmd.id)? else {
        bail!("no trip with id {}", cmd.id);
    };
    print!("{}", views::trip_detail(&trip, cmd.format.into())?);
    Ok(())
}

async fn handle_edit(config: &Config, cmd: EditCommand) -> Result<()> {
    if !cmd.has_changes() {
        println!("Nothing to change.");
        return Ok(());
    }
    let plan = plan_edit(&cmd.photo, &cmd.remove_photo)?;

    let mut store = open(config)?;
    let Some(existing) = store.get(cmd.id)? else {
        warn!(id = cmd.id, "edit of unknown trip");
        eprintln!("warning: no trip with id {}; nothing changed", cmd.id);
        return Ok(());
    };

    let mut update = TripUpdate::from_existing(&existing);
    if let Some(time) = cmd.time {
        update.time = Some(time);
    }
    if let Some(area) = cmd.area {
        update.area = area;
    }
    if let Some(phase) = cmd.tide {
        update.tide_phase = phase;
    }
    if cmd.tide_height.is_some() {
        update.tide_height = cmd.tide_height;
    }
    if cmd.temp.is_some() {
        update.temperature = cmd.temp;
    }
    if let Some(wind) = cmd.wind {
        update.wind_direction = wind;
    }
    if let Some(lure) = cmd.lure {
        update.lure = lure;
    }
    if let Some(action) = cmd.action {
        update.action = action;
    }
    if cmd.size.is_some() {
        update.size = cmd.size;
    }
    let mut update = update.normalized()?;

    let host = if plan.iter().any(SlotPlan::needs_upload) {
        Some(image_host(config)?)
    } else {
        None
    };
    update.photos = apply_plan(
        host.as_ref().map(|h| h as &dyn ImageHost),
        existing.id,
        existing.date,
        plan,
    )
    .await
    .context("photo upload failed; the trip was not changed")?;

    if store.update(cmd.id, &update)? {
        info!(id = cmd.id, "trip updated");
        println!("Updated trip {}.", cmd.id);
    } else {
        eprintln!("warning: no trip with id {}; nothing changed", cmd.id);
    }
    Ok(())
}

fn handle_delete(config: &Config, cmd: &DeleteCommand) -> Result<()> {
    let mut store = open(config)?;
    let mut found = Vec::new();
    for id in &cmd.ids {
        match store.get(*id)? {
            Some(trip) => found.push(trip),
            None => {
                warn!(id, "delete of unknown trip");
                eprintln!("warning: no trip with id {id}");
            }
        }
    }
    if found.is_empty() {
        return Ok(());
    }

    if !cmd.yes {
        println!("Would delete:");
        print!("{}", views::trip_list(&found, OutputFormat::Table)?);
        println!("Run again with --yes to delete.");
        return Ok(());
    }

    for trip in &found {
        if store.delete(trip.id)? {
            info!(id = trip.id, "trip deleted");
            println!("Deleted trip {}.", trip.id);
        }
    }
    Ok(())
}

fn handle_analyze(config: &Config, cmd: &AnalyzeCommand) -> Result<()> {
    let store = open(config)?;
    let trips = store.fetch_all()?;

    let mut options = AnalysisOptions::from_config(&config.analysis);
    options.area = cmd.area.clone();
    if let Some(step) = cmd.hour_step {
        options.heatmap.hour_step = step;
    }
    options.heatmap.metric = cmd.metric.into();

    let report = build_report(&trips, &options);
    if let Some(area) = cmd.area.as_deref() {
        if area != ALL_AREAS && !report.areas.iter().any(|a| a == area) {
            eprintln!(
                "warning: no trips at '{area}'; known areas: {}",
                report.areas.join(", ")
            );
        }
    }
    print!("{}", views::report(&report, &cmd.sections(), cmd.format.into())?);
    Ok(())
}

async fn handle_check(config: &Config, cmd: &CheckCommand) -> Result<()> {
    let spot = config.resolve_spot(cmd.spot.as_deref())?;
    let date = cmd.date.unwrap_or_else(today);
    let services = Services::from_config(config)?;

    let report = run_check(spot, date, services.sources()).await;
    print!("{}", views::check(&report, cmd.format.into())?);
    Ok(())
}

async fn handle_tide(config: &Config, cmd: &TideCommand) -> Result<()> {
    let spot = config.resolve_spot(cmd.spot.as_deref())?;
    let date = cmd.date.unwrap_or_else(today);
    let services = Services::from_config(config)?;

    let (day, sample) = tide_at(spot, date, cmd.time, &services.tide)
        .await
        .with_context(|| format!("tide lookup for {} on {date} failed", spot.name))?;
    print!("{}", views::tide(spot, &day, cmd.time, sample, cmd.format.into())?);
    Ok(())
}

fn handle_spots(config: &Config, cmd: &SpotsCommand) -> Result<()> {
    print!(
        "{}",
        views::spots(&config.spots, config.default_spot.as_deref(), cmd.format.into())?
    );
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let store = open(config)?;
    let stats = store.stats()?;
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };
    print!("{}", views::status(store.backend(), store.path(), &stats, format)?);
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config =
                Config::load_from(config_path).context("failed to load configuration")?;
            if json {
                println!("{}", config.to_pretty_json()?);
            } else {
                let images = if config.images.cloud_name.is_some()
                    && config.images.upload_preset.is_some()
                {
                    "configured"
                } else {
                    "not configured"
                };
                let pairs = [
                    ("Backend", config.storage.backend.to_string()),
                    ("Store", config.store_path().display().to_string()),
                    ("Timezone", config.forecast.timezone.clone()),
                    ("Timeout", format!("{}s", config.forecast.timeout_secs)),
                    ("Photos", images.to_string()),
                    (
                        "Heatmap",
                        format!(
                            "0–{}cm by {}cm, {}h columns",
                            config.analysis.tide_max_cm,
                            config.analysis.tide_step_cm,
                            config.analysis.hour_step
                        ),
                    ),
                    ("Spots", config.spots.len().to_string()),
                    (
                        "Default spot",
                        config.default_spot.clone().unwrap_or_default(),
                    ),
                ];
                print!("{}", render::fields(&pairs));
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
        ConfigCommand::Init { force } => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            if path.exists() && !force {
                bail!(
                    "{} already exists; use --force to overwrite",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, STARTER_CONFIG)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
