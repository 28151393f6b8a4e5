//! Export surface discovery
//!
//! A package can publish its surface as a legacy CommonJS object or as ES
//! module bindings, and neither view is always available. Discovery runs an
//! ordered list of strategies; the first one returning a non-empty set wins,
//! and when all of them come back empty the surface is empty. Strategies
//! report failure as `None`, never as an error.

pub mod commonjs;
pub mod esm;
pub mod package;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::debug;

pub use commonjs::CommonJsDiscovery;
pub use esm::EsModuleDiscovery;

/// One way of finding the exports of a package.
pub trait ExportDiscovery: Send + Sync {
    fn name(&self) -> &'static str;

    /// The package's export names, or `None` if this strategy cannot tell.
    fn discover(&self, package: &str) -> Option<BTreeSet<String>>;
}

/// Ordered fallback over discovery strategies.
pub struct ExportEnumerator {
    strategies: Vec<Box<dyn ExportDiscovery>>,
}

impl ExportEnumerator {
    pub fn new(strategies: Vec<Box<dyn ExportDiscovery>>) -> Self {
        Self { strategies }
    }

    /// CommonJS first, then ES modules, looking up packages from `root`.
    pub fn for_root(root: &Path) -> Self {
        Self::new(vec![
            Box::new(CommonJsDiscovery::new(root)),
            Box::new(EsModuleDiscovery::new(root)),
        ])
    }

    /// Best-effort set of non-default export names of `package`.
    pub fn enumerate(&self, package: &str) -> BTreeSet<String> {
        for strategy in &self.strategies {
            match strategy.discover(package) {
                Some(mut names) => {
                    names.remove("default");
                    if !names.is_empty() {
                        debug!(package, strategy = strategy.name(), count = names.len(), "discovered exports");
                        return names;
                    }
                    debug!(package, strategy = strategy.name(), "no exports found");
                }
                None => debug!(package, strategy = strategy.name(), "discovery unavailable"),
            }
        }
        BTreeSet::new()
    }
}

/// Export names known ahead of time, e.g. handed over by a host that has
/// already loaded the package.
#[derive(Debug, Default, Clone)]
pub struct StaticExports {
    table: HashMap<String, BTreeSet<String>>,
}

impl StaticExports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package<I, S>(mut self, package: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table
            .insert(package.into(), names.into_iter().map(Into::into).collect());
        self
    }
}

impl ExportDiscovery for StaticExports {
    fn name(&self) -> &'static str {
        "static"
    }

    fn discover(&self, package: &str) -> Option<BTreeSet<String>> {
        self.table.get(package).cloned()
    }
}
