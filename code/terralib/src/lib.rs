//! Shared logic for the terrarium monitor: the stored documents, the status
//! evaluation, and server configuration. Used by the http server and the
//! command-line client.

pub mod config;
pub mod control;
pub mod decode;
pub mod status;
pub mod store;
pub mod types;
