//! Client for the InfluxDB instance running on the Enpal box.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use influxdb2::{Client, models::Query};
use influxdb2_derive::FromDataPoint;

use crate::prelude::*;

pub const BUCKET: &str = "solar";
pub const ORGANIZATION: &str = "enpal";

/// Trailing window within which a point counts as «the latest».
const RANGE_START: &str = "-5m";

/// Shared handle to the telemetry database.
#[derive(Clone)]
pub struct Influx(Arc<Client>);

impl Influx {
    #[must_use]
    pub fn new(url: &str, token: &str) -> Self {
        Self(Arc::new(Client::new(url.trim_end_matches('/'), ORGANIZATION, token)))
    }

    /// Fetch the latest sample of every (measurement, field) pair in the bucket.
    #[instrument(skip_all, name = "discover")]
    pub async fn discover(&self) -> Result<Vec<MetricSample>> {
        let samples = self
            .0
            .query::<MetricSample>(Some(Query::new(discovery_query())))
            .await
            .context("discovery query failed")?;
        info!(n_samples = samples.len(), "fetched");
        for sample in &samples {
            trace!(
                measurement = sample.measurement.as_str(),
                field = sample.field.as_str(),
                unit = sample.unit.as_str(),
                time = %sample.time,
                "sample"
            );
        }
        Ok(samples)
    }

    /// Fetch the latest value of one exact (measurement, field) pair.
    ///
    /// Returns `None` when the pair has no point within the trailing window.
    #[instrument(skip_all, fields(measurement = measurement, field = field))]
    pub async fn last_value(&self, measurement: &str, field: &str) -> Result<Option<f64>> {
        let samples = self
            .0
            .query::<MetricSample>(Some(Query::new(point_query(measurement, field))))
            .await
            .context("point query failed")?;
        Ok(samples.first().map(|sample| sample.value))
    }
}

/// One row of a Flux query result.
#[derive(Debug, FromDataPoint)]
pub struct MetricSample {
    pub measurement: String,
    pub field: String,

    /// Raw schema unit (a tag on every Enpal point), e.g. `W` or `Percent`.
    pub unit: String,

    pub value: f64,
    pub time: DateTime<FixedOffset>,
}

impl Default for MetricSample {
    fn default() -> Self {
        Self {
            measurement: String::new(),
            field: String::new(),
            unit: String::new(),
            value: 0.0,
            time: DateTime::<Utc>::MIN_UTC.fixed_offset(),
        }
    }
}

/// The result columns are renamed so that they decode into [`MetricSample`] by plain name.
const RENAME_PIPE: &str =
    r#"|> rename(columns: {_measurement: "measurement", _field: "field", _value: "value", _time: "time"})"#;

fn discovery_query() -> String {
    format!(
        r#"from(bucket: "{BUCKET}")
  |> range(start: {RANGE_START})
  |> last()
  {RENAME_PIPE}"#
    )
}

fn point_query(measurement: &str, field: &str) -> String {
    format!(
        r#"from(bucket: "{BUCKET}")
  |> range(start: {RANGE_START})
  |> filter(fn: (r) => r["_measurement"] == "{measurement}")
  |> filter(fn: (r) => r["_field"] == "{field}")
  |> last()
  {RENAME_PIPE}"#
    )
}
