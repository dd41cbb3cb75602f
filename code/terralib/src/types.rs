use serde;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// A persisted JSON object. Both the sensor and the control documents are kept
// in this raw form so keys we don't know about survive a round trip.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub const TEMPERATURE: &str = "temperature";
pub const HUMIDITY: &str = "humidity";
pub const LUX: &str = "lux";
pub const SOIL: &str = "soil";

pub const LAMP: &str = "lamp";
pub const SERVO: &str = "servo";
pub const THRESHOLD: &str = "threshold";

// Latest values posted by the microcontroller.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct SensorReading {
    // Degrees Celsius
    pub temperature: f64,
    // Relative humidity in percent (0-100)
    pub humidity: f64,
    pub lux: f64,
    // Raw soil moisture ADC value, 0..=4095. Higher is drier.
    pub soil: i64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Switch {
    On,
    #[default]
    Off,
}

impl Switch {
    pub fn is_on(&self) -> bool {
        *self == Switch::On
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Switch::On => write!(f, "ON"),
            Switch::Off => write!(f, "OFF"),
        }
    }
}

impl FromStr for Switch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ON" => Ok(Switch::On),
            "OFF" => Ok(Switch::Off),
            _ => Err(anyhow::anyhow!("Expected ON or OFF, got '{s}'")),
        }
    }
}

// Typed view of the control document. The device polls these flags to decide
// whether to drive the lamp relay and the watering/feeding servo.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ControlState {
    pub lamp: Switch,
    pub servo: Switch,
    // Soil ADC value around which the soil reading counts as optimal.
    pub threshold: i64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Status {
    Low,
    Optimal,
    High,
}

impl Status {
    pub fn is_optimal(&self) -> bool {
        *self == Status::Optimal
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Low => write!(f, "Low"),
            Status::Optimal => write!(f, "Optimal"),
            Status::High => write!(f, "High"),
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Condition {
    Optimal,
    #[serde(rename = "Not Optimal")]
    NotOptimal,
}

impl Condition {
    pub fn message(&self) -> &'static str {
        match self {
            Condition::Optimal => "Terrarium Anda dalam kondisi baik.",
            Condition::NotOptimal => "Periksa sensor yang statusnya Low/High.",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Optimal => write!(f, "Optimal"),
            Condition::NotOptimal => write!(f, "Not Optimal"),
        }
    }
}

// Everything the dashboard shows. Derived from the two stored documents on
// every request, never persisted.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    pub sensor_data: SensorReading,
    pub control_data: Document,
    pub soil_status: Status,
    pub soil_moisture_percent: f64,
    pub humidity_status: Status,
    pub temp_status: Status,
    pub light_status: Status,
    pub terrarium_condition: Condition,
    pub terrarium_message: String,
    // Sensor fields that were missing or unreadable and were replaced by 0.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted_fields: Vec<String>,
}

#[cfg(test)]
mod json_format {
    use super::*;

    #[test]
    fn switch_is_uppercase() {
        assert_eq!(serde_json::to_string(&Switch::On).unwrap(), "\"ON\"");
        assert_eq!(serde_json::to_string(&Switch::Off).unwrap(), "\"OFF\"");
        assert_eq!(
            serde_json::from_str::<Switch>("\"ON\"").unwrap(),
            Switch::On
        );
    }

    #[test]
    fn switch_from_str_ignores_case() {
        assert_eq!("on".parse::<Switch>().unwrap(), Switch::On);
        assert_eq!("Off".parse::<Switch>().unwrap(), Switch::Off);
        assert_eq!(
            "maybe".parse::<Switch>().unwrap_err().to_string(),
            "Expected ON or OFF, got 'maybe'"
        );
    }

    #[test]
    fn condition_names() {
        assert_eq!(
            serde_json::to_string(&Condition::NotOptimal).unwrap(),
            "\"Not Optimal\""
        );
        assert_eq!(Condition::NotOptimal.to_string(), "Not Optimal");
        assert_eq!(serde_json::to_string(&Status::High).unwrap(), "\"High\"");
    }
}
