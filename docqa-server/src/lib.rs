//! `docqa-server` exposes a single-document question answering service over HTTP.
//! It indexes the configured document at startup and answers `POST /call`.

pub mod config;
pub mod error;
pub mod server;
pub mod startup;
pub mod telemetry;

pub use config::{Cli, ServerConfig};
pub use server::{AppState, app_router, run_server};
