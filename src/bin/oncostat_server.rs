//! oncostat API server binary
//!
//! HTTP REST API for normalization, indicators and the narrative report.

use clap::Parser;
use oncostat::api::{run_api_server, ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "oncostat-server")]
#[command(version)]
#[command(about = "oncostat API Server - HTTP REST API for the chemotherapy statistics sheet")]
#[command(long_about = r#"
oncostat API Server - HTTP REST API

Endpoints (sheets are read from the server's filesystem):
  - POST /api/v1/normalize   - Flat table for a sheet
  - POST /api/v1/indicators  - Monthly indicators (optionally one month)
  - POST /api/v1/report      - Narrative report for one month

Additional endpoints:
  - GET  /health             - Health check
  - GET  /version            - Server version info
  - GET  /                   - API documentation

Features:
  - CORS enabled for cross-origin requests
  - Graceful shutdown on SIGINT/SIGTERM
  - JSON response format with request IDs
  - Failures answer 422 with the error message

Example usage:
  oncostat-server                           # Start on localhost:8080
  oncostat-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/report \
    -H "Content-Type: application/json" \
    -d '{"file_path": "quimio_2025.xlsx", "month": "FEV."}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "ONCOSTAT_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "ONCOSTAT_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config).await
}
