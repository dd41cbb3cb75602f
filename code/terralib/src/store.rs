use crate::control::default_control;
use crate::types::{Document, HUMIDITY, LUX, SOIL, TEMPERATURE};
use anyhow::Context;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

// The two documents the server keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    // Latest reading posted by the device.
    Sensor,
    // Lamp/servo flags and the soil threshold, polled by the device.
    Control,
}

impl DocumentKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Sensor => "data.json",
            DocumentKind::Control => "control.json",
        }
    }

    // What load() hands back when nothing usable has been stored yet.
    pub fn default_document(&self) -> Document {
        match self {
            DocumentKind::Sensor => default_sensor(),
            DocumentKind::Control => default_control(),
        }
    }
}

pub fn default_sensor() -> Document {
    let mut doc = Document::new();
    doc.insert(TEMPERATURE.into(), json!(0));
    doc.insert(HUMIDITY.into(), json!(0));
    doc.insert(LUX.into(), json!(0));
    doc.insert(SOIL.into(), json!(4095));
    doc
}

// Storage backend for the sensor and control documents. One implementation
// keeps them as files on disk, the other keeps them in memory for tests.
//
// load() never fails because a document is missing or unreadable; it falls
// back to DocumentKind::default_document(). Only genuine I/O problems are
// returned as errors.
pub trait DocumentStore {
    fn load(&self, kind: DocumentKind) -> anyhow::Result<Document>;
    // Replaces the stored document entirely.
    fn save(&mut self, kind: DocumentKind, doc: &Document) -> anyhow::Result<()>;
}

// Stores each document as a pretty-printed json file in `dir`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, kind: DocumentKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

impl DocumentStore for FileStore {
    fn load(&self, kind: DocumentKind) -> anyhow::Result<Document> {
        let path = self.path(kind);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("{} does not exist, using defaults", path.display());
                return Ok(kind.default_document());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        Ok(parse_document(&bytes, &path).unwrap_or_else(|| kind.default_document()))
    }

    fn save(&mut self, kind: DocumentKind, doc: &Document) -> anyhow::Result<()> {
        let path = self.path(kind);
        let file =
            File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, doc)?;
        writer
            .flush()
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

fn parse_document(bytes: &[u8], path: &Path) -> Option<Document> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(doc)) => Some(doc),
        Ok(other) => {
            log::warn!(
                "{} holds a json {} instead of an object, using defaults",
                path.display(),
                json_type_name(&other)
            );
            None
        }
        Err(err) => {
            log::warn!("{} is not valid json ({err}), using defaults", path.display());
            None
        }
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// MemoryStore implements DocumentStore without touching the disk. Used for
// testing.
#[derive(Default)]
pub struct MemoryStore {
    docs: HashMap<DocumentKind, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // The stored document, without falling back to defaults.
    pub fn get(&self, kind: DocumentKind) -> Option<&Document> {
        self.docs.get(&kind)
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, kind: DocumentKind) -> anyhow::Result<Document> {
        Ok(self
            .docs
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_document()))
    }

    fn save(&mut self, kind: DocumentKind, doc: &Document) -> anyhow::Result<()> {
        self.docs.insert(kind, doc.clone());
        Ok(())
    }
}


#[cfg(test)]
mod memory_store {
    use super::*;

    #[test]
    fn defaults_until_saved() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load(DocumentKind::Sensor).unwrap(), default_sensor());
        assert!(store.get(DocumentKind::Sensor).is_none());

        let Value::Object(doc) = json!({"soil": 10}) else {
            unreachable!()
        };
        store.save(DocumentKind::Sensor, &doc).unwrap();
        assert_eq!(store.load(DocumentKind::Sensor).unwrap(), doc);
        assert_eq!(
            store.load(DocumentKind::Control).unwrap(),
            default_control()
        );
    }
}
