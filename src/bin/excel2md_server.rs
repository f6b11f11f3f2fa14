//! excel2md server binary
//!
//! HTTP API for asynchronous Excel to Markdown / JSON conversion.

use std::path::PathBuf;

use clap::Parser;
use excel2md::server::{run_server, ApiConfig};
use excel2md::ServiceConfigBuilder;

#[derive(Parser, Debug)]
#[command(name = "excel2md-server")]
#[command(version)]
#[command(about = "Convert Excel spreadsheets (.xls, .xlsx) to Markdown tables or JSON")]
#[command(long_about = r#"
excel2md server - asynchronous Excel conversion over HTTP

Endpoints:
  - POST   /api/v1/convert                   - Upload a spreadsheet, returns a task id
  - GET    /api/v1/tasks/{id}/status         - Poll progress
  - GET    /api/v1/tasks/{id}/result         - Full result once finished
  - GET    /api/v1/tasks/{id}/download       - Download a sheet, the ZIP, or the single file
  - DELETE /api/v1/tasks/{id}                - Remove uploaded and generated files
  - GET    /health                           - Health check

Example usage:
  excel2md-server --storage-dir ./storage --workers 4

  curl -F file=@report.xlsx -F output_format=json \
    http://localhost:8000/api/v1/convert
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "EXCEL2MD_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "EXCEL2MD_PORT")]
    port: u16,

    /// Root directory for uploads and results
    #[arg(long, default_value = "storage", env = "EXCEL2MD_STORAGE_DIR")]
    storage_dir: PathBuf,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "10", env = "EXCEL2MD_MAX_FILE_SIZE_MB")]
    max_file_size_mb: u64,

    /// Number of concurrent conversion workers (defaults to available parallelism)
    #[arg(short, long, env = "EXCEL2MD_WORKERS")]
    workers: Option<usize>,

    /// Days to keep generated files
    #[arg(long, default_value = "7", env = "EXCEL2MD_FILE_RETENTION_DAYS")]
    file_retention_days: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut builder = ServiceConfigBuilder::new()
        .with_storage_dir(&args.storage_dir)
        .with_max_file_size_mb(args.max_file_size_mb)
        .with_file_retention_days(args.file_retention_days);
    if let Some(workers) = args.workers {
        builder = builder.with_workers(workers);
    }
    let config = builder.build()?;

    let api = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_server(config, api).await
}
