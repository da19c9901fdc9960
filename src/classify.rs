//! Static classification tables mapping the Enpal InfluxDB schema onto sensors.

use serde::Serialize;

/// Home Assistant device class.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    #[display("power")]
    Power,
    #[display("energy")]
    Energy,
    #[display("current")]
    Current,
    #[display("voltage")]
    Voltage,
    #[display("battery")]
    Battery,
    #[display("temperature")]
    Temperature,
    #[display("frequency")]
    Frequency,
}

/// Classify a raw schema unit into a device class and a display unit.
///
/// Unrecognized units degrade to no device class and a blank display unit,
/// never an error. `Celcius` is how the Enpal schema actually spells it.
#[must_use]
pub fn classify_unit(unit: &str) -> (Option<DeviceClass>, &str) {
    match unit {
        "W" => (Some(DeviceClass::Power), unit),
        "kWh" | "Wh" => (Some(DeviceClass::Energy), unit),
        "A" => (Some(DeviceClass::Current), unit),
        "V" => (Some(DeviceClass::Voltage), unit),
        "Percent" => (Some(DeviceClass::Battery), "%"),
        "Celcius" => (Some(DeviceClass::Temperature), "°C"),
        "Hz" => (Some(DeviceClass::Frequency), unit),
        _ => (None, ""),
    }
}

/// Icon and display name of one classified field.
#[derive(Debug, Eq, PartialEq)]
pub struct FieldClass {
    pub icon: &'static str,
    pub name: String,
}

struct FieldSpec {
    measurement: &'static str,
    field: &'static str,
    icon: &'static str,
    name: &'static str,
}

/// Fields with a dedicated icon and display name.
#[rustfmt::skip]
const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec { measurement: "inverter", field: "Power.DC.Total", icon: "mdi:solar-power", name: "Enpal Solar Production Power" },
    FieldSpec { measurement: "inverter", field: "Power.House.Total", icon: "mdi:home-lightning-bolt", name: "Enpal Power House Total" },
    FieldSpec { measurement: "inverter", field: "Energy.Production.Total.Day", icon: "mdi:solar-power-variant", name: "Enpal Production Day" },

    FieldSpec { measurement: "battery", field: "Power.Battery.Charge.Discharge", icon: "mdi:battery-charging", name: "Enpal Battery Power" },
    FieldSpec { measurement: "battery", field: "Energy.Battery.Charge.Level", icon: "mdi:battery", name: "Enpal Battery Percent" },
    FieldSpec { measurement: "battery", field: "Energy.Battery.Charge.Day", icon: "mdi:battery-arrow-up", name: "Enpal Battery Charge Day" },
    FieldSpec { measurement: "battery", field: "Energy.Battery.Discharge.Day", icon: "mdi:battery-arrow-down", name: "Enpal Battery Discharge Day" },

    FieldSpec { measurement: "powerSensor", field: "Current.Phase.A", icon: "mdi:lightning-bolt", name: "Enpal Ampere Phase A" },
    FieldSpec { measurement: "powerSensor", field: "Current.Phase.B", icon: "mdi:lightning-bolt", name: "Enpal Ampere Phase B" },
    FieldSpec { measurement: "powerSensor", field: "Current.Phase.C", icon: "mdi:lightning-bolt", name: "Enpal Ampere Phase C" },
    FieldSpec { measurement: "powerSensor", field: "Power.AC.Phase.A", icon: "mdi:lightning-bolt", name: "Enpal Power Phase A" },
    FieldSpec { measurement: "powerSensor", field: "Power.AC.Phase.B", icon: "mdi:lightning-bolt", name: "Enpal Power Phase B" },
    FieldSpec { measurement: "powerSensor", field: "Power.AC.Phase.C", icon: "mdi:lightning-bolt", name: "Enpal Power Phase C" },
    FieldSpec { measurement: "powerSensor", field: "Voltage.Phase.A", icon: "mdi:lightning-bolt", name: "Enpal Voltage Phase A" },
    FieldSpec { measurement: "powerSensor", field: "Voltage.Phase.B", icon: "mdi:lightning-bolt", name: "Enpal Voltage Phase B" },
    FieldSpec { measurement: "powerSensor", field: "Voltage.Phase.C", icon: "mdi:lightning-bolt", name: "Enpal Voltage Phase C" },

    FieldSpec { measurement: "system", field: "Power.External.Total", icon: "mdi:home-lightning-bolt", name: "Enpal Power External Total" },
    FieldSpec { measurement: "system", field: "Energy.Consumption.Total.Day", icon: "mdi:home-lightning-bolt", name: "Enpal Energy Consumption" },
    FieldSpec { measurement: "system", field: "Energy.External.Total.Out.Day", icon: "mdi:transmission-tower-export", name: "Enpal Energy External Out Day" },
    FieldSpec { measurement: "system", field: "Energy.External.Total.In.Day", icon: "mdi:transmission-tower-import", name: "Enpal Energy External In Day" },
    FieldSpec { measurement: "system", field: "Energy.Storage.Total.Out.Day", icon: "mdi:battery-arrow-down", name: "Enpal Battery Discharge Day duplicate" },
    FieldSpec { measurement: "system", field: "Energy.Storage.Total.In.Day", icon: "mdi:battery-arrow-up", name: "Enpal Battery Charge Day duplicate" },

    FieldSpec { measurement: "wallbox", field: "State.Wallbox.Connector.1.Charge", icon: "mdi:ev-station", name: "Wallbox Charge Percent" },
    FieldSpec { measurement: "wallbox", field: "Power.Wallbox.Connector.1.Charging", icon: "mdi:ev-station", name: "Wallbox Charging Power" },
    FieldSpec { measurement: "wallbox", field: "Energy.Wallbox.Connector.1.Charged.Total", icon: "mdi:ev-station", name: "Wallbox Charging Total" },
];

/// Generic icon and name prefix for fields of a known measurement
/// that have no dedicated entry in [`FIELD_SPECS`].
#[rustfmt::skip]
const MEASUREMENT_FALLBACKS: &[(&str, &str, &str)] = &[
    ("inverter", "mdi:solar-power", "Enpal Solar"),
    ("battery", "mdi:battery", "Enpal Battery"),
    ("powerSensor", "mdi:lightning-bolt", "Enpal Power Grid"),
    ("system", "mdi:battery", "Enpal System"),
    ("wallbox", "mdi:ev-station", "Wallbox"),
];

/// Schema bookkeeping fields that must not become sensors.
const IGNORED_FIELDS: &[(&str, &str)] = &[("system", "measureId")];

/// Classify a (measurement, field) pair.
///
/// `None` means the pair does not map onto a sensor: either the measurement
/// is not recognized, or the field is explicitly ignored.
#[must_use]
pub fn classify_field(measurement: &str, field: &str) -> Option<FieldClass> {
    if IGNORED_FIELDS.contains(&(measurement, field)) {
        return None;
    }
    if let Some(spec) =
        FIELD_SPECS.iter().find(|spec| spec.measurement == measurement && spec.field == field)
    {
        return Some(FieldClass { icon: spec.icon, name: spec.name.to_string() });
    }
    MEASUREMENT_FALLBACKS
        .iter()
        .find(|(fallback_measurement, _, _)| *fallback_measurement == measurement)
        .map(|(_, icon, name_prefix)| FieldClass { icon, name: format!("{name_prefix} {field}") })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_classify_unit_ok() {
        assert_eq!(classify_unit("W"), (Some(DeviceClass::Power), "W"));
        assert_eq!(classify_unit("kWh"), (Some(DeviceClass::Energy), "kWh"));
        assert_eq!(classify_unit("Wh"), (Some(DeviceClass::Energy), "Wh"));
        assert_eq!(classify_unit("A"), (Some(DeviceClass::Current), "A"));
        assert_eq!(classify_unit("V"), (Some(DeviceClass::Voltage), "V"));
        assert_eq!(classify_unit("Percent"), (Some(DeviceClass::Battery), "%"));
        assert_eq!(classify_unit("Celcius"), (Some(DeviceClass::Temperature), "°C"));
        assert_eq!(classify_unit("Hz"), (Some(DeviceClass::Frequency), "Hz"));
    }

    #[test]
    fn test_classify_unit_unrecognized_degrades_ok() {
        assert_eq!(classify_unit("Lumen"), (None, ""));
        assert_eq!(classify_unit(""), (None, ""));
    }

    #[test]
    fn test_classify_field_exact_ok() {
        let class = classify_field("inverter", "Power.DC.Total").unwrap();
        assert_eq!(class.icon, "mdi:solar-power");
        assert_eq!(class.name, "Enpal Solar Production Power");

        let class = classify_field("system", "Energy.External.Total.In.Day").unwrap();
        assert_eq!(class.icon, "mdi:transmission-tower-import");
        assert_eq!(class.name, "Enpal Energy External In Day");

        let class = classify_field("wallbox", "Power.Wallbox.Connector.1.Charging").unwrap();
        assert_eq!(class.icon, "mdi:ev-station");
        assert_eq!(class.name, "Wallbox Charging Power");
    }

    /// Every listed pair must classify to its own entry, not a fallback.
    #[test]
    fn test_field_specs_total_ok() {
        for spec in FIELD_SPECS {
            let class = classify_field(spec.measurement, spec.field).unwrap();
            assert_eq!(class.icon, spec.icon);
            assert_eq!(class.name, spec.name);
        }
    }

    #[test]
    fn test_field_specs_unique_ok() {
        let pairs: BTreeSet<_> =
            FIELD_SPECS.iter().map(|spec| (spec.measurement, spec.field)).collect();
        assert_eq!(pairs.len(), FIELD_SPECS.len());
    }

    #[test]
    fn test_classify_field_fallbacks_ok() {
        let class = classify_field("inverter", "Frequency.Grid").unwrap();
        assert_eq!(class.icon, "mdi:solar-power");
        assert_eq!(class.name, "Enpal Solar Frequency.Grid");

        let class = classify_field("battery", "Temperature.Cell.Max").unwrap();
        assert_eq!(class.icon, "mdi:battery");
        assert_eq!(class.name, "Enpal Battery Temperature.Cell.Max");

        let class = classify_field("powerSensor", "Frequency").unwrap();
        assert_eq!(class.icon, "mdi:lightning-bolt");
        assert_eq!(class.name, "Enpal Power Grid Frequency");

        let class = classify_field("system", "Uptime").unwrap();
        assert_eq!(class.icon, "mdi:battery");
        assert_eq!(class.name, "Enpal System Uptime");

        let class = classify_field("wallbox", "State.Plug").unwrap();
        assert_eq!(class.icon, "mdi:ev-station");
        assert_eq!(class.name, "Wallbox State.Plug");
    }

    #[test]
    fn test_classify_field_ignored_ok() {
        assert_eq!(classify_field("system", "measureId"), None);
    }

    #[test]
    fn test_classify_field_unknown_measurement_ok() {
        assert_eq!(classify_field("weather", "Temperature.Outside"), None);
    }
}
