//! oncostat HTTP API
//!
//! Exposes normalization, indicators and the narrative report over REST.
//! Run with `oncostat-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
