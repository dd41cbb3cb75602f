//! The terrarium monitor's http server. The microcontroller posts its sensor
//! readings to `/data` and polls `/get-control` for lamp/servo commands; people
//! use the rendered dashboard, which talks to `/status` and `/update_control`.

mod error;
mod routes;
mod views;

use std::path::Path;
use std::sync::{Arc, Mutex};
use terralib::config::ServerConfig;
use terralib::store::FileStore;

// Optional, read from the working directory.
const CONFIG_FILE: &str = "server.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stderrlog::new()
        .module(module_path!())
        .module("terralib")
        .verbosity(log::Level::Info)
        .init()?;

    log::info!("Starting terrarium server...");

    let cfg = ServerConfig::load_or_default(Path::new(CONFIG_FILE))?;
    log::info!("Using config: {cfg:?}");

    let store = FileStore::new(&cfg.data_dir);
    let app = routes::router(Arc::new(Mutex::new(store)));

    let listener = tokio::net::TcpListener::bind(&cfg.listen).await?;
    log::info!("Listening on {}", cfg.listen);
    axum::serve(listener, app).await?;
    Ok(())
}
