#![deny(clippy::all)]

//! Build-time dependency overrides.
//!
//! Imports of a configured package are redirected to a virtual module that
//! re-exports the original package, except for a chosen set of exports which
//! are bound to replacement expressions instead. No importing source file has
//! to change.

pub mod config;
pub mod error;
pub mod exports;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod rewriter;
pub mod sanitizer;
pub mod synthesizer;

pub use config::{default_include, OverrideBody, PluginOptions, TargetConfig};
pub use error::{BoxError, ConfigError, LoadError};
pub use exports::{ExportDiscovery, ExportEnumerator, StaticExports};
pub use plugin::OverrideDeps;

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
