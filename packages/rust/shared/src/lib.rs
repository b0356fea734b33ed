//! Shared types, error model, and configuration for ReleaseWatch.
//!
//! This crate is the foundation depended on by all other ReleaseWatch crates.
//! It provides:
//! - [`ReleaseWatchError`], the unified error type
//! - Domain types ([`DraftUpdate`], [`PersistedUpdate`], [`UpdateId`], [`UpdateOutcome`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, DatabaseConfig, FetchConfig, HttpConfig, SourcesConfig, config_dir,
    config_file_path, expand_home, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{ReleaseWatchError, Result};
pub use types::{DEFAULT_CATEGORY, DraftUpdate, PersistedUpdate, UpdateId, UpdateOutcome};
