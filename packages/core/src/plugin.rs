//! Build pipeline hooks
//!
//! [`OverrideDeps`] is what a host bundler talks to. Each hook answers `None`
//! when the request is not for this plugin so the host can try its other
//! handlers.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::PluginOptions;
use crate::error::{ConfigError, LoadError};
use crate::exports::ExportEnumerator;
use crate::registry::TargetRegistry;
use crate::resolver::resolve_specifier;
use crate::rewriter::SpecifierRewriter;
use crate::synthesizer::VirtualModuleSynthesizer;

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "vite-override-deps";

/// The rewrite pass must run before other transforms.
pub const ENFORCE: &str = "pre";

pub struct OverrideDeps {
    registry: TargetRegistry,
    rewriter: SpecifierRewriter,
    enumerator: ExportEnumerator,
    root: PathBuf,
}

impl OverrideDeps {
    /// Build the plugin, discovering exports from `node_modules` under the
    /// configured root.
    pub fn new(options: PluginOptions) -> Result<Self, ConfigError> {
        let enumerator = ExportEnumerator::for_root(&options.root);
        Self::with_enumerator(options, enumerator)
    }

    pub fn with_enumerator(options: PluginOptions, enumerator: ExportEnumerator) -> Result<Self, ConfigError> {
        let registry = TargetRegistry::new(&options.targets)?;
        let rewriter = SpecifierRewriter::new(&registry, options.include_filter())?;
        Ok(Self {
            registry,
            rewriter,
            enumerator,
            root: options.root,
        })
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn enforce(&self) -> &'static str {
        ENFORCE
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// `resolveId`: configured aliases become virtual ids.
    pub fn resolve_id(&self, specifier: &str) -> Option<String> {
        resolve_specifier(&self.registry, specifier)
    }

    /// `load`: content of a virtual id.
    pub fn load(&self, id: &str) -> Result<Option<String>, LoadError> {
        VirtualModuleSynthesizer::new(&self.registry, &self.enumerator, &self.root).load(id)
    }

    /// `transform`: redirect imports of overridden packages in a unit.
    pub fn transform(&self, code: &str, id: &str) -> Option<String> {
        self.rewriter.rewrite(code, id)
    }

    /// Export names the synthesized module would pass through for `package`.
    pub fn exports_of(&self, package: &str) -> BTreeSet<String> {
        self.enumerator.enumerate(package)
    }
}
