use crate::decode::decode_i64;
use crate::types::{ControlState, Document, LAMP, SERVO, Switch, THRESHOLD};
use serde_json::{Value, json};

pub const DEFAULT_THRESHOLD: i64 = 2500;

impl Default for ControlState {
    fn default() -> Self {
        Self {
            lamp: Switch::Off,
            servo: Switch::Off,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ControlState {
    // Typed view of a control document. Unrecognized switch values read as
    // OFF and an unreadable threshold reads as the default.
    pub fn decode(doc: &Document) -> Self {
        Self {
            lamp: decode_switch(doc, LAMP),
            servo: decode_switch(doc, SERVO),
            threshold: decode_i64(doc, THRESHOLD, DEFAULT_THRESHOLD).value,
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(LAMP.into(), json!(self.lamp));
        doc.insert(SERVO.into(), json!(self.servo));
        doc.insert(THRESHOLD.into(), json!(self.threshold));
        doc
    }
}

fn decode_switch(doc: &Document, key: &str) -> Switch {
    doc.get(key)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

pub fn default_control() -> Document {
    ControlState::default().to_document()
}

// Shallow merge: every key in `update` replaces the same key in `current`;
// keys absent from `update` are left alone.
pub fn merge(current: &mut Document, update: Document) {
    for (key, value) in update {
        current.insert(key, value);
    }
}
