//! Sensor identity and the per-poll state it publishes.

use chrono::{DateTime, Local, NaiveTime, Utc};

use crate::{
    classify::{DeviceClass, classify_field, classify_unit},
    influx::MetricSample,
    prelude::*,
};

/// Entity id prefix shared by every sensor this bridge registers.
pub const ENTITY_ID_PREFIX: &str = "sensor.enpal_";

/// The storage level field gets a band-dependent battery icon.
const STORAGE_LEVEL_FIELD: &str = "Percent.Storage.Level";

/// Home Assistant state class.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    #[display("measurement")]
    Measurement,
    #[display("total_increasing")]
    TotalIncreasing,
}

/// Immutable sensor identity, derived once at discovery time.
#[derive(Clone, Debug)]
pub struct SensorDefinition {
    pub measurement: String,
    pub field: String,
    pub icon: &'static str,
    pub name: String,

    /// Display unit, possibly blank.
    pub unit: String,

    pub device_class: Option<DeviceClass>,
}

impl SensorDefinition {
    /// Classify a discovery sample into a sensor definition.
    ///
    /// `None` when the (measurement, field) pair does not map onto a sensor.
    #[must_use]
    pub fn try_from_sample(sample: &MetricSample) -> Option<Self> {
        let Some(class) = classify_field(&sample.measurement, &sample.field) else {
            debug!(
                measurement = sample.measurement.as_str(),
                field = sample.field.as_str(),
                "not mapped to a sensor, skipping"
            );
            return None;
        };
        let (device_class, unit) = classify_unit(&sample.unit);
        Some(Self {
            measurement: sample.measurement.clone(),
            field: sample.field.clone(),
            icon: class.icon,
            name: class.name,
            unit: unit.to_string(),
            device_class,
        })
    }

    /// Globally unique sensor id: `{measurement}_{field}`.
    #[must_use]
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.measurement, self.field)
    }

    #[must_use]
    pub fn entity_id(&self) -> String {
        format!("{ENTITY_ID_PREFIX}{}", slug(&self.unique_id()))
    }

    /// Build the state to publish from one poll outcome.
    #[must_use]
    pub fn to_state(&self, reading: Result<Option<f64>>) -> SensorState {
        self.state_at(reading, Local::now(), Utc::now())
    }

    fn state_at(
        &self,
        reading: Result<Option<f64>>,
        now_local: DateTime<Local>,
        now_utc: DateTime<Utc>,
    ) -> SensorState {
        // The state class and reset time only depend on the static unit,
        // so a failed poll republishes them unchanged:
        let (state_class, last_reset) = if matches!(self.unit.as_str(), "kWh" | "Wh") {
            // Cumulative counters reset at the start of the current day:
            (StateClass::TotalIncreasing, Some(start_of_day(now_utc)))
        } else {
            (StateClass::Measurement, None)
        };
        let value = match reading {
            // A missing point is a zero, not an error:
            Ok(value) => round2(value.unwrap_or(0.0)),
            Err(error) => {
                error!(
                    measurement = self.measurement.as_str(),
                    field = self.field.as_str(),
                    "poll failed: {error:#}"
                );
                return SensorState {
                    value: None,
                    state_class,
                    icon: self.icon,
                    last_check: now_local,
                    last_reset,
                };
            }
        };
        let icon = if self.field == STORAGE_LEVEL_FIELD {
            battery_icon(value, self.icon)
        } else {
            self.icon
        };
        SensorState { value: Some(value), state_class, icon, last_check: now_local, last_reset }
    }
}

/// Latest published state of one sensor. Owned by exactly one polling task.
#[derive(Debug)]
pub struct SensorState {
    /// Rounded to 2 decimal places; `None` is published as `unknown`.
    pub value: Option<f64>,

    pub state_class: StateClass,
    pub icon: &'static str,
    pub last_check: DateTime<Local>,
    pub last_reset: Option<DateTime<Utc>>,
}

fn slug(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Battery icon for the storage level percentage.
///
/// The band ladder is applied sequentially and a later match overwrites an
/// earlier one, so the `>= 10` outline rule only shows through in the gaps
/// between bands. Levels below 10 keep the classifier icon. Ambiguous as the
/// boundaries are, dashboards in the wild depend on them, so the ladder stays
/// as is.
#[rustfmt::skip]
fn battery_icon(level: f64, fallback: &'static str) -> &'static str {
    let mut icon = fallback;
    if level >= 10.0 { icon = "mdi:battery-outline"; }
    if (10.0..=19.0).contains(&level) { icon = "mdi:battery-10"; }
    if (20.0..=29.0).contains(&level) { icon = "mdi:battery-20"; }
    if (30.0..=39.0).contains(&level) { icon = "mdi:battery-30"; }
    if (40.0..=49.0).contains(&level) { icon = "mdi:battery-40"; }
    if (50.0..=59.0).contains(&level) { icon = "mdi:battery-50"; }
    if (60.0..=69.0).contains(&level) { icon = "mdi:battery-60"; }
    if (70.0..=79.0).contains(&level) { icon = "mdi:battery-70"; }
    if (80.0..=89.0).contains(&level) { icon = "mdi:battery-80"; }
    if (90.0..=99.0).contains(&level) { icon = "mdi:battery-90"; }
    if level == 100.0 { icon = "mdi:battery"; }
    icon
}
