//! Core domain logic for ReleaseWatch.
//!
//! This crate ties sources and storage together:
//! - [`identity`]: content-derived update ids
//! - [`reconcile`]: New / Updated / Unchanged classification and writes
//! - [`pipeline`]: the sequential run over all active sources
//! - [`report`]: per-tool and per-category run reports

pub mod identity;
pub mod pipeline;
pub mod reconcile;
pub mod report;

pub use identity::{UNIQUE_ID_LEN, unique_id};
pub use pipeline::{ProgressReporter, SilentProgress, run_source, run_sources};
pub use reconcile::{Reconciler, UpdateStore};
pub use report::{CategoryReport, DraftPreview, OutcomeCounts, ReportEntry, RunReport, ToolReport};
