//! CLI command handlers

pub mod commands;

pub use commands::{indicators, inspect, normalize, report, watch};
