use crate::control::DEFAULT_THRESHOLD;
use crate::decode::{Decoded, decode_f64, decode_i64};
use crate::types::{
    Condition, Document, HUMIDITY, LUX, SOIL, SensorReading, Status, StatusReport, TEMPERATURE,
    THRESHOLD,
};

// Full scale of the soil sensor's 12-bit ADC.
pub const SOIL_ADC_MAX: i64 = 4095;

// The soil reading counts as optimal within this distance of the threshold.
pub const SOIL_BAND: i64 = 500;

// (low, high) bounds for the fixed-threshold metrics. Values strictly outside
// the range are Low/High; the bounds themselves are Optimal.
pub const HUMIDITY_RANGE: (f64, f64) = (60.0, 85.0);
pub const TEMPERATURE_RANGE: (f64, f64) = (20.0, 30.0);
pub const LUX_RANGE: (f64, f64) = (100.0, 1000.0);

fn classify(value: f64, (low, high): (f64, f64)) -> Status {
    if value > high {
        Status::High
    } else if value < low {
        Status::Low
    } else {
        Status::Optimal
    }
}

// Note that the labels are the reverse of classify(): a raw reading above the
// band is reported as "Low" and one below it as "High".
pub fn soil_status(soil: i64, threshold: i64) -> Status {
    if soil > threshold.saturating_add(SOIL_BAND) {
        Status::Low
    } else if soil < threshold.saturating_sub(SOIL_BAND) {
        Status::High
    } else {
        Status::Optimal
    }
}

pub fn humidity_status(humidity: f64) -> Status {
    classify(humidity, HUMIDITY_RANGE)
}

pub fn temperature_status(temperature: f64) -> Status {
    classify(temperature, TEMPERATURE_RANGE)
}

pub fn light_status(lux: f64) -> Status {
    classify(lux, LUX_RANGE)
}

// Converts the raw soil value to a moisture percentage in [0, 100], rounded to
// one decimal place. 0 is soaked, SOIL_ADC_MAX is bone dry.
pub fn soil_moisture_percent(soil: i64) -> f64 {
    let max = SOIL_ADC_MAX as f64;
    let pct = ((max - soil as f64) / max * 100.0).clamp(0.0, 100.0);
    (pct * 10.0).round() / 10.0
}

pub fn overall_condition(statuses: &[Status]) -> Condition {
    if statuses.iter().all(Status::is_optimal) {
        Condition::Optimal
    } else {
        Condition::NotOptimal
    }
}

// Reads the four sensor fields out of a raw document. Anything missing or
// unreadable comes back as 0 with `defaulted` set.
pub fn decode_reading(sensor: &Document) -> (SensorReading, Vec<&'static str>) {
    let temperature = decode_f64(sensor, TEMPERATURE, 0.0);
    let humidity = decode_f64(sensor, HUMIDITY, 0.0);
    let lux = decode_f64(sensor, LUX, 0.0);
    let soil = decode_i64(sensor, SOIL, 0);

    let mut defaulted = Vec::new();
    note_default(sensor, TEMPERATURE, &temperature, &mut defaulted);
    note_default(sensor, HUMIDITY, &humidity, &mut defaulted);
    note_default(sensor, LUX, &lux, &mut defaulted);
    note_default(sensor, SOIL, &soil, &mut defaulted);

    (
        SensorReading {
            temperature: temperature.value,
            humidity: humidity.value,
            lux: lux.value,
            soil: soil.value,
        },
        defaulted,
    )
}

fn note_default<T>(
    doc: &Document,
    key: &'static str,
    decoded: &Decoded<T>,
    defaulted: &mut Vec<&'static str>,
) {
    if !decoded.defaulted {
        return;
    }
    // A missing key is expected from partial payloads; a present but
    // unreadable one means the device sent garbage.
    if let Some(raw) = doc.get(key) {
        log::warn!("Could not read sensor field '{key}' from {raw}, using 0");
    }
    defaulted.push(key);
}

pub fn read_threshold(control: &Document) -> i64 {
    let threshold = decode_i64(control, THRESHOLD, DEFAULT_THRESHOLD);
    if threshold.defaulted {
        if let Some(raw) = control.get(THRESHOLD) {
            log::warn!("Invalid soil threshold {raw}, using {DEFAULT_THRESHOLD}");
        }
    }
    threshold.value
}

// Builds the status report for the dashboard and the /status endpoint from
// the stored sensor and control documents. Never fails: bad input degrades to
// default values.
pub fn evaluate(sensor: &Document, control: &Document) -> StatusReport {
    let (reading, defaulted) = decode_reading(sensor);
    let threshold = read_threshold(control);

    let soil = soil_status(reading.soil, threshold);
    let humidity = humidity_status(reading.humidity);
    let temp = temperature_status(reading.temperature);
    let light = light_status(reading.lux);
    let condition = overall_condition(&[soil, humidity, temp, light]);

    StatusReport {
        sensor_data: reading,
        control_data: control.clone(),
        soil_status: soil,
        soil_moisture_percent: soil_moisture_percent(reading.soil),
        humidity_status: humidity,
        temp_status: temp,
        light_status: light,
        terrarium_condition: condition,
        terrarium_message: condition.message().to_string(),
        defaulted_fields: defaulted.into_iter().map(String::from).collect(),
    }
}

pub fn print_status_report(report: &StatusReport) {
    let s = &report.sensor_data;
    println!(
        "Condition: {} ({})",
        report.terrarium_condition, report.terrarium_message
    );
    println!(
        "Soil:     {} raw, {:.1}% moisture [{}]",
        s.soil, report.soil_moisture_percent, report.soil_status
    );
    println!("Humidity: {:.1}% [{}]", s.humidity, report.humidity_status);
    println!("Temp:     {:.1}C [{}]", s.temperature, report.temp_status);
    println!("Light:    {:.0} lux [{}]", s.lux, report.light_status);
    if !report.defaulted_fields.is_empty() {
        println!("<unreadable: {}>", report.defaulted_fields.join(", "));
    }
}


#[cfg(test)]
mod evaluate {
    use super::*;
    use crate::control::default_control;
    use serde_json::{Value, json};

    fn doc(v: Value) -> Document {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn all_optimal() {
        let sensor = doc(json!({"temperature": 25, "humidity": 70, "lux": 500, "soil": 2500}));
        let report = evaluate(&sensor, &default_control());
        assert_eq!(report.soil_status, Status::Optimal);
        assert_eq!(report.humidity_status, Status::Optimal);
        assert_eq!(report.temp_status, Status::Optimal);
        assert_eq!(report.light_status, Status::Optimal);
        assert_eq!(report.terrarium_condition, Condition::Optimal);
        assert_eq!(report.terrarium_message, "Terrarium Anda dalam kondisi baik.");
        assert!(report.defaulted_fields.is_empty());
        assert_eq!(report.control_data, default_control());
    }

    #[test]
    fn zero_threshold_makes_soil_low() {
        let sensor = doc(json!({"temperature": 25, "humidity": 70, "lux": 500, "soil": 2500}));
        let control = doc(json!({"lamp": "OFF", "servo": "OFF", "threshold": 0}));
        let report = evaluate(&sensor, &control);
        assert_eq!(report.soil_status, Status::Low);
        assert_eq!(report.terrarium_condition, Condition::NotOptimal);
        assert_eq!(
            report.terrarium_message,
            "Periksa sensor yang statusnya Low/High."
        );
    }

    #[test]
    fn missing_threshold_uses_default() {
        let sensor = doc(json!({"temperature": 25, "humidity": 70, "lux": 500, "soil": 3000}));
        let report = evaluate(&sensor, &Document::new());
        assert_eq!(report.soil_status, Status::Optimal);

        let report = evaluate(&sensor, &doc(json!({"threshold": "lots"})));
        assert_eq!(report.soil_status, Status::Optimal);
    }

    #[test]
    fn bad_field_defaults_only_that_field() {
        let sensor = doc(json!({"temperature": "hot", "humidity": "70.5", "lux": 500, "soil": 2500}));
        let report = evaluate(&sensor, &default_control());
        assert_eq!(report.sensor_data.temperature, 0.0);
        assert_eq!(report.sensor_data.humidity, 70.5);
        assert_eq!(report.temp_status, Status::Low);
        assert_eq!(report.humidity_status, Status::Optimal);
        assert_eq!(report.defaulted_fields, vec!["temperature".to_string()]);
    }

    #[test]
    fn empty_reading() {
        let report = evaluate(&Document::new(), &default_control());
        assert_eq!(report.sensor_data, SensorReading::default());
        // soil=0 sits far below the band
        assert_eq!(report.soil_status, Status::High);
        assert_eq!(report.soil_moisture_percent, 100.0);
        assert_eq!(report.defaulted_fields.len(), 4);
    }

    #[test]
    fn huge_soil_reads_as_dry() {
        let sensor = doc(json!({"temperature": 25, "humidity": 70, "lux": 500, "soil": 1e20}));
        let report = evaluate(&sensor, &default_control());
        assert_eq!(report.sensor_data.soil, i64::MAX);
        assert_eq!(report.soil_status, Status::Low);
        assert_eq!(report.soil_moisture_percent, 0.0);
        assert!(report.defaulted_fields.is_empty());
    }

    #[test]
    fn serialized_field_names() {
        let sensor = doc(json!({"temperature": 25, "humidity": 70, "lux": 500, "soil": 2500}));
        let js = serde_json::to_value(evaluate(&sensor, &default_control())).unwrap();
        assert_eq!(js["sensor_data"]["soil"], json!(2500));
        assert_eq!(js["sensor_data"]["temperature"], json!(25.0));
        assert_eq!(js["control_data"]["threshold"], json!(2500));
        assert_eq!(js["soil_moisture_percent"], json!(38.9));
        assert_eq!(js["temp_status"], json!("Optimal"));
        assert_eq!(js["terrarium_condition"], json!("Optimal"));
        assert!(js.get("defaulted_fields").is_none());
    }
}
