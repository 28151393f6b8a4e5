//! Override Errors
//!
//! Lookup misses (unknown alias, unknown virtual id) are not errors and are
//! reported as `None` by the plugin hooks. Export discovery never fails; it
//! degrades to an empty export set. What remains is configuration that cannot
//! be used and virtual modules that cannot be produced.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type returned by user-supplied override generators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid plugin configuration, detected once at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid glob pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid specifier pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("target `{package}`: export `{name}` is reserved and cannot be overridden")]
    ReservedOverride { package: String, name: String },

    #[error("target `{package}`: overrides `{first}` and `{second}` both bind `{ident}`")]
    OverrideCollision {
        package: String,
        first: String,
        second: String,
        ident: String,
    },
}

/// Failure to produce a virtual module. Always fatal for the build.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file override {path} for `{alias}`: {source}")]
    FileOverride {
        alias: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("override `{export}` of `{package}` failed: {source}")]
    Override {
        package: String,
        export: String,
        #[source]
        source: BoxError,
    },

    #[error("virtual module for `{package}`: exports `{first}` and `{second}` both bind `{ident}`")]
    DuplicateBinding {
        package: String,
        first: String,
        second: String,
        ident: String,
    },
}
