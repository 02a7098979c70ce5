//! Export a source tree as one JSON snapshot for LLM context.
//!
//! The pipeline walks a directory in a fixed order. It filters entries by
//! directory name, extension and a sensitive-file denylist, tags each file
//! with a bundle, and optionally reduces code to a skeleton. The result is
//! written as a single pretty-printed document.

pub mod bundle;
pub mod config;
pub mod engine;
pub mod error;
pub mod filters;
pub mod models;
pub mod skeleton;

pub use config::SnapConfig;
pub use engine::{assemble_snapshot, default_output_path, export_snapshot, write_snapshot};
pub use error::{Result, SnapError};
pub use models::{ExportReport, FileRecord, SnapshotDocument, SnapshotMode, Stats};
