mod classify;
mod cli;
mod home_assistant;
mod influx;
mod poller;
mod prelude;
mod registry;
mod sensor;

use std::sync::Arc;

use clap::{Parser, crate_version};
use itertools::Itertools;

use crate::{cli::Args, influx::Influx, prelude::*, sensor::SensorDefinition};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let influx = args.influx.new_client();
    let home_assistant = Arc::new(args.home_assistant.try_new_client()?);

    let definitions = discover(&influx).await?;

    // Full replace: purge whatever a previous run registered, then re-create.
    let n_removed = registry::purge(home_assistant.as_ref()).await?;
    info!(n_removed, "purged previously registered sensors");
    for definition in &definitions {
        poller::update_sensor(&influx, home_assistant.as_ref(), definition).await;
    }
    info!(n_sensors = definitions.len(), "registered");

    if args.once {
        return Ok(());
    }
    poller::run(influx, home_assistant, definitions, args.poll_interval()).await
}

/// Discover the available (measurement, field) pairs and classify them into sensors.
async fn discover(influx: &Influx) -> Result<Vec<SensorDefinition>> {
    let samples = influx.discover().await?;
    let definitions: Vec<SensorDefinition> = samples
        .iter()
        .unique_by(|sample| (sample.measurement.clone(), sample.field.clone()))
        .filter_map(SensorDefinition::try_from_sample)
        .collect();
    info!(n_sensors = definitions.len(), "discovered");
    Ok(definitions)
}
