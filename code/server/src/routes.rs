use crate::error::ApiError;
use crate::views::{DashboardView, ThresholdView};
use askama::Template;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use terralib::control::merge;
use terralib::status::evaluate;
use terralib::store::{DocumentKind, DocumentStore};
use terralib::types::{Document, StatusReport};

const SCRIPT_JS: &str = include_str!("../static/script.js");

// All handlers share one store. The lock is held for the whole
// load/modify/save sequence of a request, so concurrent updates can't
// interleave.
pub type SharedStore = Arc<Mutex<dyn DocumentStore + Send>>;

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/threshold", get(threshold))
        .route("/status", get(status))
        .route("/get-control", get(get_control))
        .route("/data", post(receive_data))
        .route("/update_control", post(update_control))
        .route("/static/script.js", get(script))
        .with_state(store)
}

type StoreGuard<'a> = MutexGuard<'a, dyn DocumentStore + Send + 'static>;

fn lock(store: &SharedStore) -> Result<StoreGuard<'_>, ApiError> {
    store.lock().map_err(|_| {
        log::error!("Document store mutex is poisoned");
        ApiError::internal("Penyimpanan tidak tersedia")
    })
}

enum BodyError {
    NotJson,
    // Valid json, but an array or a scalar.
    NotObject,
}

// The body must be a json object. Content-Type isn't checked: the device
// firmware doesn't always set it.
fn parse_object(body: &[u8]) -> Result<Document, BodyError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(BodyError::NotObject),
        Err(_) => Err(BodyError::NotJson),
    }
}

fn current_report(store: &SharedStore) -> Result<StatusReport, ApiError> {
    let store = lock(store)?;
    let load = |kind: DocumentKind| {
        store.load(kind).map_err(|err| {
            log::error!("Error loading {kind:?} document: {err:#}");
            ApiError::internal("Gagal membaca data")
        })
    };
    let sensor = load(DocumentKind::Sensor)?;
    let control = load(DocumentKind::Control)?;
    Ok(evaluate(&sensor, &control))
}

fn render(view: &impl Template) -> Result<Html<String>, ApiError> {
    view.render().map(Html).map_err(|err| {
        log::error!("Error rendering template: {err}");
        ApiError::internal("Gagal menampilkan halaman")
    })
}

async fn dashboard(State(store): State<SharedStore>) -> Result<Html<String>, ApiError> {
    render(&DashboardView::new(current_report(&store)?))
}

async fn threshold(State(store): State<SharedStore>) -> Result<Html<String>, ApiError> {
    render(&ThresholdView::new(current_report(&store)?))
}

async fn status(State(store): State<SharedStore>) -> Result<Json<StatusReport>, ApiError> {
    Ok(Json(current_report(&store)?))
}

// The device polls this to find out what the lamp and servo should be doing.
async fn get_control(State(store): State<SharedStore>) -> Result<Json<Document>, ApiError> {
    match lock(&store)?.load(DocumentKind::Control) {
        Ok(doc) => Ok(Json(doc)),
        Err(err) => {
            log::error!("Error reading control document: {err:#}");
            Err(ApiError::internal("Gagal membaca data kontrol"))
        }
    }
}

// The device posts its latest reading here. It replaces the stored reading
// as-is.
async fn receive_data(
    State(store): State<SharedStore>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let reading = match parse_object(&body) {
        Ok(doc) => doc,
        Err(BodyError::NotJson) => {
            log::warn!("POST /data with a body that is not json");
            return Err(ApiError::bad_request("Request harus dalam format JSON"));
        }
        Err(BodyError::NotObject) => {
            log::warn!("POST /data with a json body that is not an object");
            return Err(ApiError::bad_request("Request harus berupa objek JSON"));
        }
    };
    log::info!("POST /data: {}", Value::Object(reading.clone()));

    if let Err(err) = lock(&store)?.save(DocumentKind::Sensor, &reading) {
        log::error!("Error saving sensor document: {err:#}");
        return Err(ApiError::internal("Gagal menyimpan data sensor"));
    }
    Ok(Json(
        json!({"status": "success", "message": "Data berhasil diterima"}),
    ))
}

async fn update_control(
    State(store): State<SharedStore>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let update = match parse_object(&body) {
        Ok(doc) => doc,
        Err(BodyError::NotJson) => {
            log::warn!("POST /update_control with a body that is not json");
            return Err(ApiError::bad_request("Request must be JSON"));
        }
        Err(BodyError::NotObject) => {
            log::warn!("POST /update_control with a json body that is not an object");
            return Err(ApiError::bad_request("Request must be a JSON object"));
        }
    };
    log::info!("POST /update_control: {}", Value::Object(update.clone()));

    let mut guard = lock(&store)?;
    let mut control = guard.load(DocumentKind::Control).map_err(|err| {
        log::error!("Error reading control document: {err:#}");
        ApiError::internal("Gagal membaca data kontrol")
    })?;
    merge(&mut control, update);
    if let Err(err) = guard.save(DocumentKind::Control, &control) {
        log::error!("Error saving control document: {err:#}");
        return Err(ApiError::internal("Gagal menyimpan data kontrol"));
    }
    Ok(Json(json!({"status": "success", "updated_data": control})))
}

async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], SCRIPT_JS)
}
