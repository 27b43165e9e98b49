//! Shared types, error model, and configuration for tutpage.
//!
//! This crate is the foundation depended on by all other tutpage crates.
//! It provides:
//! - [`TutpageError`], the unified error type
//! - Domain types ([`Section`], [`Chapter`], [`ExampleFile`], [`BuildInfo`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AssetBase, AssetEntry, BuildConfig, CONFIG_FILE_NAME, ContentConfig,
    FetchStrategy, OutputConfig, ResolvedAsset, SourceConfig, config_file_path, init_config,
    join_repo_path, load_config, load_config_from,
};
pub use error::{Result, TutpageError};
pub use types::{BuildInfo, Chapter, ExampleFile, Section};
