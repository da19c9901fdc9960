//! Per-sensor polling loops.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinSet, time::sleep};

use crate::{influx::Influx, prelude::*, registry::Registry, sensor::SensorDefinition};

/// Update one sensor once and publish the outcome.
///
/// A failed query degrades to an `unknown` state inside
/// [`SensorDefinition::to_state`]; a failed publish is logged and swallowed.
/// Either way, the next tick is the only retry.
pub async fn update_sensor<R: Registry + Sync + ?Sized>(
    influx: &Influx,
    registry: &R,
    definition: &SensorDefinition,
) {
    let reading = influx.last_value(&definition.measurement, &definition.field).await;
    let state = definition.to_state(reading);
    if let Err(error) = registry.publish(definition, &state).await {
        error!(entity_id = %definition.entity_id(), "failed to publish: {error:#}");
    }
}

/// Run one independent polling task per sensor until Ctrl-C.
///
/// Each task owns its definition outright; the tasks never interact.
pub async fn run<R>(
    influx: Influx,
    registry: Arc<R>,
    definitions: Vec<SensorDefinition>,
    period: Duration,
) -> Result
where
    R: Registry + Send + Sync + 'static,
{
    let mut tasks = JoinSet::new();
    for definition in definitions {
        let influx = influx.clone();
        let registry = Arc::clone(&registry);
        tasks.spawn(async move {
            loop {
                sleep(period).await;
                update_sensor(&influx, registry.as_ref(), &definition).await;
            }
        });
    }
    info!(n_tasks = tasks.len(), period_secs = period.as_secs(), "polling…");

    tokio::signal::ctrl_c().await.context("failed to listen for the shutdown signal")?;
    info!("shutting down…");
    tasks.shutdown().await;
    Ok(())
}
