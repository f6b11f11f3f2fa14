//! excel2md - Asynchronous Excel to Markdown / JSON conversion service
//!
//! This crate reads legacy (`.xls`) and modern (`.xlsx`) spreadsheets, renders
//! every sheet as a Markdown table or a JSON document, and runs conversions as
//! background jobs whose progress can be polled.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use excel2md::{ingest, OutputFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let content = std::fs::read("report.xlsx")?;
//!     let sheets = ingest(content, "report.xlsx", true)?;
//!
//!     for sheet in &sheets {
//!         println!("## {}\n{}", sheet.name, OutputFormat::Markdown.render(sheet)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Background Jobs
//!
//! ```rust,no_run
//! use excel2md::{ConversionService, OutputFormat, ServiceConfigBuilder};
//!
//! # async fn run() -> Result<(), excel2md::Excel2MdError> {
//! let config = ServiceConfigBuilder::new()
//!     .with_storage_dir("/tmp/excel2md")
//!     .with_workers(2)
//!     .build()?;
//! let service = ConversionService::new(config)?;
//!
//! let content = std::fs::read("report.xlsx")?;
//! let task_id = service.submit("report.xlsx", content, true, OutputFormat::Json)?;
//!
//! let status = service.status(&task_id).await;
//! println!("{:?} {}%: {}", status.status, status.progress, status.message);
//! # Ok(())
//! # }
//! ```

mod api;
mod config;
mod error;
mod formatter;
mod output;
mod packager;
mod parser;
mod queue;
mod security;
mod service;
mod status;
mod storage;
mod task;
mod types;

pub mod server;

// 公開API
pub use api::{OutputFormat, SpreadsheetFormat};
pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{Excel2MdError, Result};
pub use output::{escape_markdown_cell, JsonFormatter, MarkdownFormatter};
pub use packager::{package, ARCHIVE_NAME};
pub use parser::{detect_format, ingest, ingest_path};
pub use queue::{TaskQueue, TaskState, TaskStore};
pub use service::{CleanupReport, ConversionService, Download};
pub use status::{StatusKind, TaskStatus, TaskStatusService};
pub use storage::{JobDirectory, Storage};
pub use task::{ConversionTask, ProgressReporter, TaskEvent};
pub use types::{
    CellValue, ConversionJob, ConversionResult, JobId, ProgressInfo, SheetResult, SheetResults,
    TabularSheet,
};
