//! Shared types, error model, and configuration for vulnfeed.
//!
//! This crate is the foundation depended on by all other vulnfeed crates.
//! It provides:
//! - [`VulnfeedError`], the unified error type
//! - Canonical entity types ([`Provenance`], [`KnownExploitedBlob`], [`Envelope`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ProviderConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_provider,
};
pub use error::{Result, VulnfeedError};
pub use types::{
    ArtifactRef, Entity, Envelope, IngestState, KnownExploitedBlob, KnownExploitedEntry,
    Provenance,
};
